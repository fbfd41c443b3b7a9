//! Canonicalization and writing of rendered output.
//!
//! Rendered text is parsed with `syn` before anything touches the disk, so a
//! template producing invalid Rust never leaves a broken file behind. Valid
//! output is pretty-printed with `prettyplease` and written atomically.

use std::fs;
use std::path::{Path, PathBuf};

use crate::aggregate::GenerationGroup;
use crate::config::GeneratorConfig;
use crate::error::{Result, SimplegenError};

/// First line of every generated file.
pub const GENERATED_NOTICE: &str = "// Code generated by simplegen. DO NOT EDIT.";

/// Parses rendered text and returns it pretty-printed behind the notice.
///
/// ## Errors
/// `SimplegenError::Format` when the text is not a valid Rust file.
pub fn format_source(group: &GenerationGroup, text: &str) -> Result<String> {
    let file = syn::parse_file(text).map_err(|source| SimplegenError::Format {
        directive: group.directive.clone(),
        package: group.package_path.to_string(),
        source,
    })?;
    Ok(format!("{GENERATED_NOTICE}\n\n{}", prettyplease::unparse(&file)))
}

/// Where a group's file goes: `<package dir>/<directive><suffix>.<ext>`.
///
/// Dashes in directive names become underscores so the file stays usable as
/// a module name.
pub fn output_path(config: &GeneratorConfig, group: &GenerationGroup) -> PathBuf {
    let stem = group.directive.replace('-', "_");
    group.dir.join(format!(
        "{stem}{}.{}",
        config.output_suffix, config.output_extension
    ))
}

/// Writes content to a file atomically using temp file + rename.
///
/// Parent directories are created as needed; an existing file is replaced
/// whole.
///
/// ## Errors
/// `SimplegenError::Io` naming the path that failed.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| SimplegenError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    fs::write(&temp_path, content).map_err(|source| SimplegenError::Io {
        path: temp_path.clone(),
        source,
    })?;

    fs::rename(&temp_path, path).map_err(|source| SimplegenError::Io {
        path: path.to_path_buf(),
        source,
    })
}
