//! Handlebars rendering of generation groups.
//!
//! Every directive template is registered behind a shared import header, so
//! templates only describe their own items. The context of one render is the
//! serialized [`GenerationGroup`]:
//!
//! | key           | value                                  |
//! |---------------|----------------------------------------|
//! | `PackageName` | short module name, e.g. `models`       |
//! | `PackagePath` | canonical path, e.g. `crate::models`   |
//! | `Imports`     | unique module paths, first use first   |
//! | `Specs`       | generator payloads in scan order       |

use handlebars::{Handlebars, HelperDef, no_escape};

use crate::aggregate::GenerationGroup;
use crate::error::{Result, SimplegenError};
use crate::registry::DirectiveRegistry;

/// Emitted ahead of every directive template.
pub const IMPORT_HEADER: &str = "{{#each Imports}}\nuse {{this}};\n{{/each}}\n";

/// Caller supplied template helpers, registered on every directive.
#[derive(Default)]
pub struct TemplateHelpers {
    helpers: Vec<(String, Box<dyn HelperDef + Send + Sync>)>,
}

impl TemplateHelpers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<H>(mut self, name: impl Into<String>, helper: H) -> Self
    where
        H: HelperDef + Send + Sync + 'static,
    {
        self.helpers.push((name.into(), Box::new(helper)));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.helpers.iter().map(|(name, _)| name.as_str())
    }
}

impl std::fmt::Debug for TemplateHelpers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Compiled directive templates.
pub struct TemplateRenderer {
    registry: Handlebars<'static>,
}

impl TemplateRenderer {
    /// Compiles the template of every registered directive.
    ///
    /// ## Errors
    /// `SimplegenError::Template` for the first template that does not compile.
    pub fn new(directives: &DirectiveRegistry, helpers: TemplateHelpers, strict: bool) -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(no_escape);
        registry.set_strict_mode(strict);

        for (name, helper) in helpers.helpers {
            registry.register_helper(&name, helper);
        }

        for directive in directives.iter() {
            let template = format!("{IMPORT_HEADER}{}", directive.template);
            registry
                .register_template_string(&directive.name, template)
                .map_err(|source| SimplegenError::Template {
                    directive: directive.name.clone(),
                    source: Box::new(source),
                })?;
        }

        Ok(Self { registry })
    }

    /// Renders one group with its directive's template.
    ///
    /// ## Errors
    /// `SimplegenError::Render` when the template fails on this group's data
    /// (in strict mode, also when it references a missing value).
    pub fn render(&self, group: &GenerationGroup) -> Result<String> {
        self.registry
            .render(&group.directive, group)
            .map_err(|source| SimplegenError::Render {
                directive: group.directive.clone(),
                package: group.package_path.to_string(),
                source: Box::new(source),
            })
    }
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer")
            .field("templates", &self.registry.get_templates().keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use handlebars::handlebars_helper;
    use serde::Serialize;

    use super::*;
    use crate::aggregate::Aggregator;
    use crate::error::BoxError;
    use crate::index::DeclarationIndex;
    use crate::package::{Declaration, Package, PackagePath};
    use crate::registry::{Generated, SpecData};
    use crate::scan::Annotation;

    #[derive(Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct Named {
        name: String,
    }

    fn noop(
        _: &DeclarationIndex,
        _: &Package,
        _: &Declaration,
        _: &Annotation,
    ) -> Result<Generated, BoxError> {
        Ok(Generated::new(SpecData::new(&())?))
    }

    fn group(imports: Vec<String>) -> GenerationGroup {
        let package = Package::parse(
            Path::new("src"),
            PackagePath::local("models"),
            PathBuf::from("src/models.rs"),
            "",
        )
        .expect("empty module parses");
        let mut aggregator = Aggregator::new();
        for name in ["User", "Post"] {
            let spec = SpecData::new(&Named {
                name: name.to_string(),
            })
            .expect("serializable");
            aggregator.record("paginator", &package, spec, imports.clone());
        }
        aggregator.into_groups().remove(0)
    }

    handlebars_helper!(shout: |s: str| s.to_uppercase());

    #[test]
    fn renders_header_and_specs_in_order() {
        let registry = DirectiveRegistry::new().register(
            "paginator",
            "// {{PackageName}}\n{{#each Specs}}pub struct {{Name}}Page;\n{{/each}}",
            noop,
        );
        let renderer = TemplateRenderer::new(&registry, TemplateHelpers::new(), false).unwrap();

        let text = renderer
            .render(&group(vec!["std::num::ParseIntError".to_string()]))
            .unwrap();
        assert!(text.starts_with("use std::num::ParseIntError;\n"), "{text}");
        assert!(text.contains("// models\n"), "{text}");
        let user = text.find("pub struct UserPage;").expect("first spec rendered");
        let post = text.find("pub struct PostPage;").expect("second spec rendered");
        assert!(user < post);
    }

    #[test]
    fn output_is_not_html_escaped() {
        let registry = DirectiveRegistry::new().register(
            "paginator",
            "{{#each Specs}}type {{Name}}Ref<'a> = &'a Vec<{{Name}}>;{{/each}}",
            noop,
        );
        let renderer = TemplateRenderer::new(&registry, TemplateHelpers::new(), false).unwrap();
        let text = renderer.render(&group(Vec::new())).unwrap();
        assert!(text.contains("type UserRef<'a> = &'a Vec<User>;"), "{text}");
    }

    #[test]
    fn helpers_are_available_to_every_template() {
        let registry = DirectiveRegistry::new().register(
            "paginator",
            "{{#each Specs}}const {{shout Name}}: u8 = 0;{{/each}}",
            noop,
        );
        let helpers = TemplateHelpers::new().with("shout", shout);
        let renderer = TemplateRenderer::new(&registry, helpers, false).unwrap();
        let text = renderer.render(&group(Vec::new())).unwrap();
        assert!(text.contains("const USER: u8 = 0;"), "{text}");
    }

    #[test]
    fn invalid_template_fails_construction() {
        let registry = DirectiveRegistry::new().register("paginator", "{{#each Specs}}", noop);
        let err = TemplateRenderer::new(&registry, TemplateHelpers::new(), false).unwrap_err();
        assert!(matches!(err, SimplegenError::Template { ref directive, .. } if directive == "paginator"));
    }

    #[test]
    fn strict_mode_reports_missing_values() {
        let registry = DirectiveRegistry::new().register(
            "paginator",
            "{{#each Specs}}{{Missing}}{{/each}}",
            noop,
        );
        let lenient = TemplateRenderer::new(&registry, TemplateHelpers::new(), false).unwrap();
        assert!(lenient.render(&group(Vec::new())).is_ok());

        let strict = TemplateRenderer::new(&registry, TemplateHelpers::new(), true).unwrap();
        let err = strict.render(&group(Vec::new())).unwrap_err();
        assert!(matches!(err, SimplegenError::Render { .. }));
    }
}
