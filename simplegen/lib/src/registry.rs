//! Directives: a name, a template and the generator that feeds it.

use std::fmt;

use serde::Serialize;

use crate::error::BoxError;
use crate::index::DeclarationIndex;
use crate::package::{Declaration, Package};
use crate::scan::Annotation;

/// Template data produced by one generator call.
///
/// Built from any [`Serialize`] value; the engine never looks inside, it only
/// hands the payload to the directive's template as one entry of `Specs`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SpecData(serde_json::Value);

impl SpecData {
    /// Serializes `value` into a template payload.
    pub fn new<T: Serialize>(value: &T) -> Result<Self, BoxError> {
        Ok(Self(serde_json::to_value(value)?))
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// What a generator returns for one annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub spec: SpecData,
    /// Module paths the rendered code needs, e.g. `crate::models`.
    pub imports: Vec<String>,
}

impl Generated {
    pub fn new(spec: SpecData) -> Self {
        Self {
            spec,
            imports: Vec::new(),
        }
    }

    pub fn with_imports<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imports.extend(imports.into_iter().map(Into::into));
        self
    }
}

/// Produces template data for one annotated declaration.
///
/// Implemented for every matching closure or function, so most directives
/// are plain `fn`s.
pub trait Generator {
    fn generate(
        &self,
        index: &DeclarationIndex,
        package: &Package,
        declaration: &Declaration,
        annotation: &Annotation,
    ) -> Result<Generated, BoxError>;
}

impl<F> Generator for F
where
    F: Fn(&DeclarationIndex, &Package, &Declaration, &Annotation) -> Result<Generated, BoxError>,
{
    fn generate(
        &self,
        index: &DeclarationIndex,
        package: &Package,
        declaration: &Declaration,
        annotation: &Annotation,
    ) -> Result<Generated, BoxError> {
        self(index, package, declaration, annotation)
    }
}

/// A registered directive.
pub struct Directive {
    pub name: String,
    /// Handlebars template rendered once per generation group.
    pub template: String,
    pub generator: Box<dyn Generator>,
}

impl fmt::Debug for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directive")
            .field("name", &self.name)
            .field("template", &self.template.len())
            .finish_non_exhaustive()
    }
}

/// Directives in registration order.
///
/// Order matters: when one annotation line names several directives they
/// fire in the order they were registered.
#[derive(Debug, Default)]
pub struct DirectiveRegistry {
    directives: Vec<Directive>,
}

impl DirectiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a directive. Registering a name twice replaces the earlier
    /// entry in place.
    pub fn register<G>(mut self, name: impl Into<String>, template: impl Into<String>, generator: G) -> Self
    where
        G: Generator + 'static,
    {
        let directive = Directive {
            name: name.into(),
            template: template.into(),
            generator: Box::new(generator),
        };
        match self.directives.iter_mut().find(|d| d.name == directive.name) {
            Some(existing) => *existing = directive,
            None => self.directives.push(directive),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Directive> {
        self.directives.iter().find(|d| d.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Directive> {
        self.directives.iter()
    }

    /// Directives whose name occurs in `line`, in registration order.
    pub fn matching<'a>(&'a self, line: &'a str) -> impl Iterator<Item = &'a Directive> + 'a {
        self.directives
            .iter()
            .filter(move |d| !d.name.is_empty() && line.contains(&d.name))
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(
        _: &DeclarationIndex,
        _: &Package,
        declaration: &Declaration,
        _: &Annotation,
    ) -> Result<Generated, BoxError> {
        Ok(Generated::new(SpecData::new(&declaration.name)?))
    }

    #[test]
    fn matching_follows_registration_order() {
        let registry = DirectiveRegistry::new()
            .register("sort-by-keys", "", noop)
            .register("sort", "", noop)
            .register("paginator", "", noop);

        let names: Vec<_> = registry
            .matching("simplegen:sort-by-keys --type User")
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, vec!["sort-by-keys", "sort"]);
    }

    #[test]
    fn re_registering_replaces_in_place() {
        let registry = DirectiveRegistry::new()
            .register("a", "first", noop)
            .register("b", "", noop)
            .register("a", "second", noop);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.iter().next().map(|d| d.template.as_str()), Some("second"));
    }

    #[test]
    fn spec_data_wraps_any_serializable_value() {
        #[derive(Serialize)]
        #[serde(rename_all = "PascalCase")]
        struct Paginated {
            name: String,
        }

        let spec = SpecData::new(&Paginated {
            name: "User".to_string(),
        })
        .unwrap();
        assert_eq!(spec.as_value()["Name"], "User");

        let generated = Generated::new(spec).with_imports(["std::fmt", "crate::models"]);
        assert_eq!(generated.imports, vec!["std::fmt", "crate::models"]);
    }
}
