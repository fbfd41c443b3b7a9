//! Annotation-driven Rust source generation.
//!
//! `simplegen` scans the modules of a crate for type declarations whose
//! documentation carries an annotation such as
//!
//! ```text
//! /// simplegen:sort-by-keys --type Vec<User> --suffix ByRole
//! pub struct User { .. }
//! ```
//!
//! hands every annotated declaration to the generator registered for that
//! directive, groups the results per `(directive, module)` and renders each
//! group through the directive's Handlebars template into
//! `<module dir>/<directive>_gen.rs`. That file is a child module of the
//! scanned one (`mod sort_by_keys_gen;`); generated code reaches the scanned
//! module's types through `super::`.
//!
//! ## Modules
//!
//! - [`package`] - module resolution, parsing and the documentation copy-down pass
//! - [`index`] - the per-run package cache and struct lookup
//! - [`fields`] - field flattening, tag parsing and type shapes
//! - [`scan`] - annotation discovery
//! - [`registry`] - directives and the [`Generator`] trait
//! - [`aggregate`] - grouping of generator output
//! - [`render`] / [`output`] - templating, formatting and atomic writes
//! - [`generator`] - the [`SimpleGenerator`] engine tying it together

pub mod aggregate;
pub mod config;
pub mod error;
pub mod fields;
pub mod generator;
pub mod index;
pub mod output;
pub mod package;
pub mod registry;
pub mod render;
pub mod scan;

pub use aggregate::GenerationGroup;
pub use config::GeneratorConfig;
pub use error::{BoxError, Result, SimplegenError};
pub use fields::shape::TypeShape;
pub use fields::{FieldDescriptor, FieldPath, ResolvedFields};
pub use generator::{GeneratedFile, GenerationReport, SimpleGenerator};
pub use index::{DeclarationIndex, StructuralType};
pub use package::{Declaration, DeclarationKind, Package, PackagePath};
pub use registry::{DirectiveRegistry, Generated, Generator, SpecData};
pub use render::TemplateHelpers;
pub use scan::Annotation;
