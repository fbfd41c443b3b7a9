//! Error types for the simplegen engine.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed error returned by generator functions.
///
/// Directive implementations are free to fail with any error type; the engine
/// wraps whatever they return in [`SimplegenError::Generator`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Convenience alias used throughout the crate.
pub type Result<T, E = SimplegenError> = std::result::Result<T, E>;

/// Errors that can occur while loading, scanning, rendering or writing.
#[derive(Debug, Error)]
pub enum SimplegenError {
    /// A package could not be resolved, read or parsed.
    #[error("Cannot load package `{package}`: {reason}")]
    Load { package: String, reason: String },

    /// A package source file could not be parsed.
    #[error("Cannot parse `{path}` for package `{package}`: {source}")]
    Parse {
        package: String,
        path: PathBuf,
        #[source]
        source: syn::Error,
    },

    /// No top-level declaration with the requested name exists.
    #[error("`{type_name}` not found in declared types of `{package}`")]
    NotFound { package: String, type_name: String },

    /// The declaration exists but is not a struct with named fields.
    #[error("Type `{type_name}` in `{package}` is not a struct")]
    NotAStruct { package: String, type_name: String },

    /// A field has no usable serialization key in its tag string.
    #[error(
        "Type `{type_name}`: field `{field}` should have a value for one of [{keys}] in its tag"
    )]
    MissingSerializationKey {
        type_name: String,
        field: String,
        keys: String,
    },

    /// `#[serde(flatten)]` members nest deeper than the extractor follows,
    /// usually because a struct flattens itself.
    #[error("Type `{type_name}` in `{package}` nests flattened members too deeply")]
    FlattenTooDeep { package: String, type_name: String },

    /// A type name could not be resolved from the declaring module's scope.
    #[error("Cannot resolve type `{name}` in `{package}`")]
    UnresolvedType { package: String, name: String },

    /// A generator function failed for one annotation.
    #[error("Generator `{directive}` failed for `{declaration}` in `{package}`: {source}")]
    Generator {
        directive: String,
        package: String,
        declaration: String,
        #[source]
        source: BoxError,
    },

    /// A directive template failed to compile.
    #[error("Template for `{directive}` is invalid: {source}")]
    Template {
        directive: String,
        #[source]
        source: Box<handlebars::TemplateError>,
    },

    /// A directive template failed while rendering a group.
    #[error("Rendering `{directive}` for `{package}` failed: {source}")]
    Render {
        directive: String,
        package: String,
        #[source]
        source: Box<handlebars::RenderError>,
    },

    /// Rendered output is not valid Rust.
    #[error("Generated `{directive}` code for `{package}` is invalid: {source}")]
    Format {
        directive: String,
        package: String,
        #[source]
        source: syn::Error,
    },

    /// Filesystem failure.
    #[error("Failed to access `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Several independent failures collected during one phase.
    #[error("{}", join_errors(.0))]
    Aggregate(Vec<SimplegenError>),
}

impl SimplegenError {
    /// Returns the collected errors of an aggregate, or the error itself.
    pub fn flatten(&self) -> Vec<&SimplegenError> {
        match self {
            SimplegenError::Aggregate(errors) => errors.iter().flat_map(|e| e.flatten()).collect(),
            other => vec![other],
        }
    }

    /// Ends a phase: `Ok` when nothing was collected, an aggregate otherwise.
    pub(crate) fn aggregate(errors: Vec<SimplegenError>) -> Result<()> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(SimplegenError::Aggregate(errors))
        }
    }
}

fn join_errors(errors: &[SimplegenError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_joins_messages_line_by_line() {
        let err = SimplegenError::Aggregate(vec![
            SimplegenError::Config("first".to_string()),
            SimplegenError::Config("second".to_string()),
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid configuration: first\nInvalid configuration: second"
        );
    }

    #[test]
    fn flatten_unwraps_nested_aggregates() {
        let err = SimplegenError::Aggregate(vec![
            SimplegenError::Config("a".to_string()),
            SimplegenError::Aggregate(vec![SimplegenError::Config("b".to_string())]),
        ]);
        assert_eq!(err.flatten().len(), 2);
    }

    #[test]
    fn aggregate_is_ok_only_when_nothing_was_collected() {
        let result = SimplegenError::aggregate(vec![SimplegenError::Config("only".to_string())]);
        assert!(matches!(result, Err(SimplegenError::Aggregate(ref errors)) if errors.len() == 1));
        assert!(SimplegenError::aggregate(Vec::new()).is_ok());
    }
}
