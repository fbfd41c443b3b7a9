//! Engine configuration.
//!
//! Every field has a default, so an empty `simplegen.toml` (or none at all)
//! reproduces the stock behavior:
//!
//! ```toml
//! source-root = "src"
//! marker = "simplegen"
//! tag-attribute = "tag"
//! serialization-keys = ["json", "yaml"]
//! skip-sentinel = "-"
//! output-suffix = "_gen"
//! output-extension = "rs"
//! strict-templates = false
//! render-on-generator-error = false
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimplegenError};

/// Settings shared by every phase of one engine run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GeneratorConfig {
    /// Directory holding the crate root (`lib.rs` / `main.rs`) of the scanned crate.
    pub source_root: PathBuf,

    /// Keyword that marks a documentation line as an annotation.
    pub marker: String,

    /// Field attribute holding the raw tag string, usually gated as
    /// `#[cfg_attr(simplegen, tag = "json:\"id\"")]`.
    pub tag_attribute: String,

    /// Tag keys tried in priority order when looking up a serialization key.
    pub serialization_keys: Vec<String>,

    /// Tag value meaning "skip this field".
    pub skip_sentinel: String,

    /// Appended to the directive name to build the output file stem.
    pub output_suffix: String,

    /// Output file extension, without the dot.
    pub output_extension: String,

    /// Fail rendering when a template references a missing value.
    pub strict_templates: bool,

    /// Still render and write successful groups when some generators failed.
    pub render_on_generator_error: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("src"),
            marker: "simplegen".to_string(),
            tag_attribute: "tag".to_string(),
            serialization_keys: vec!["json".to_string(), "yaml".to_string()],
            skip_sentinel: "-".to_string(),
            output_suffix: "_gen".to_string(),
            output_extension: "rs".to_string(),
            strict_templates: false,
            render_on_generator_error: false,
        }
    }
}

impl GeneratorConfig {
    /// Creates the default configuration rooted at `source_root`.
    pub fn with_source_root<P: Into<PathBuf>>(source_root: P) -> Self {
        Self {
            source_root: source_root.into(),
            ..Self::default()
        }
    }

    /// Parses a configuration from TOML text.
    ///
    /// ## Errors
    /// Returns `SimplegenError::Config` when the text is not valid TOML for
    /// this schema or fails validation.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: GeneratorConfig =
            toml::from_str(text).map_err(|e| SimplegenError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// A relative `source-root` is resolved against the file's directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SimplegenError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&text)?;
        if config.source_root.is_relative()
            && let Some(dir) = path.parent()
        {
            config.source_root = dir.join(&config.source_root);
        }
        Ok(config)
    }

    /// Checks the invariants the engine relies on.
    pub fn validate(&self) -> Result<()> {
        if self.marker.trim().is_empty() {
            return Err(SimplegenError::Config("marker must not be empty".to_string()));
        }
        if self.serialization_keys.is_empty() {
            return Err(SimplegenError::Config(
                "serialization-keys must name at least one tag key".to_string(),
            ));
        }
        if self.output_extension.is_empty() {
            return Err(SimplegenError::Config(
                "output-extension must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
