//! The engine: load, scan, dispatch, aggregate, render, write.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::aggregate::{Aggregator, GenerationGroup};
use crate::config::GeneratorConfig;
use crate::error::{Result, SimplegenError};
use crate::index::DeclarationIndex;
use crate::output::{format_source, output_path, write_atomic};
use crate::package::PackagePath;
use crate::registry::DirectiveRegistry;
use crate::render::{TemplateHelpers, TemplateRenderer};
use crate::scan::scan;

/// One rendered output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub directive: String,
    pub package: PackagePath,
    pub path: PathBuf,
    /// Final file content, notice included.
    pub content: String,
}

/// Files produced by one run, in group order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub files: Vec<GeneratedFile>,
}

impl GenerationReport {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Runs directives over a set of packages.
///
/// ## Examples
///
/// ```no_run
/// use simplegen::{
///     Annotation, BoxError, Declaration, DeclarationIndex, DirectiveRegistry, Generated,
///     GeneratorConfig, Package, SimpleGenerator, SpecData, TemplateHelpers,
/// };
///
/// fn paginator(
///     _: &DeclarationIndex,
///     _: &Package,
///     declaration: &Declaration,
///     _: &Annotation,
/// ) -> Result<Generated, BoxError> {
///     Ok(Generated::new(SpecData::new(&declaration.name)?))
/// }
///
/// let registry = DirectiveRegistry::new().register(
///     "paginator",
///     "{{#each Specs}}pub struct {{this}}Page;{{/each}}",
///     paginator,
/// );
///
/// let generator = SimpleGenerator::new(
///     GeneratorConfig::default(),
///     ["models"],
///     registry,
///     TemplateHelpers::new(),
/// )?;
/// let report = generator.generate()?;
/// println!("wrote {} files", report.files.len());
/// # Ok::<(), simplegen::SimplegenError>(())
/// ```
#[derive(Debug)]
pub struct SimpleGenerator {
    index: DeclarationIndex,
    registry: DirectiveRegistry,
    renderer: TemplateRenderer,
}

impl SimpleGenerator {
    /// Loads the packages and compiles every directive template.
    ///
    /// ## Errors
    /// `Load`, `Parse` or `Io` when a package cannot be loaded, `Template`
    /// when a template does not compile, `Config` for invalid settings.
    pub fn new<I, S>(
        config: GeneratorConfig,
        packages: I,
        registry: DirectiveRegistry,
        helpers: TemplateHelpers,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let strict = config.strict_templates;
        let index = DeclarationIndex::load(config, packages)?;
        let renderer = TemplateRenderer::new(&registry, helpers, strict)?;
        Ok(Self {
            index,
            registry,
            renderer,
        })
    }

    pub fn index(&self) -> &DeclarationIndex {
        &self.index
    }

    pub fn config(&self) -> &GeneratorConfig {
        self.index.config()
    }

    /// Scans the packages and runs every matching generator.
    ///
    /// ## Errors
    /// Fails with the collected `Generator` errors when any generator failed.
    pub fn collect(&self) -> Result<Vec<GenerationGroup>> {
        let (groups, errors) = self.dispatch();
        SimplegenError::aggregate(errors)?;
        Ok(groups)
    }

    /// Renders, formats and writes every group.
    ///
    /// Each group is attempted even when an earlier one failed; files already
    /// written stay on disk.
    pub fn generate(&self) -> Result<GenerationReport> {
        self.run(true)
    }

    /// Like [`generate`](Self::generate) without touching the filesystem.
    pub fn preview(&self) -> Result<GenerationReport> {
        self.run(false)
    }

    fn dispatch(&self) -> (Vec<GenerationGroup>, Vec<SimplegenError>) {
        let matches = scan(&self.index, &self.registry, &self.config().marker);
        debug!(matches = matches.len(), "scan finished");

        let mut aggregator = Aggregator::new();
        let mut errors = Vec::new();

        for m in matches {
            let Some(directive) = self.registry.get(&m.directive) else {
                continue;
            };
            match directive
                .generator
                .generate(&self.index, &m.package, &m.declaration, &m.annotation)
            {
                Ok(generated) => {
                    aggregator.record(&m.directive, &m.package, generated.spec, generated.imports)
                }
                Err(source) => {
                    let err = SimplegenError::Generator {
                        directive: m.directive.clone(),
                        package: m.package.path.to_string(),
                        declaration: m.declaration.name.clone(),
                        source,
                    };
                    warn!(error = %err, "generator failed");
                    errors.push(err);
                }
            }
        }

        (aggregator.into_groups(), errors)
    }

    fn run(&self, write: bool) -> Result<GenerationReport> {
        let (groups, mut errors) = self.dispatch();
        if !errors.is_empty() && !self.config().render_on_generator_error {
            return Err(SimplegenError::Aggregate(errors));
        }

        let mut report = GenerationReport::default();
        for group in &groups {
            match self.emit(group, write) {
                Ok(file) => report.files.push(file),
                Err(err) => {
                    warn!(error = %err, directive = %group.directive, "group failed");
                    errors.push(err);
                }
            }
        }

        SimplegenError::aggregate(errors)?;
        Ok(report)
    }

    fn emit(&self, group: &GenerationGroup, write: bool) -> Result<GeneratedFile> {
        let rendered = self.renderer.render(group)?;
        let content = format_source(group, &rendered)?;
        let path = output_path(self.config(), group);

        if write {
            write_atomic(&path, &content)?;
            info!(path = %path.display(), specs = group.specs.len(), "wrote generated file");
        }

        Ok(GeneratedFile {
            directive: group.directive.clone(),
            package: group.package_path.clone(),
            path,
            content,
        })
    }
}
