//! Canonical module paths used as package identities.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Keyword naming the root of the scanned crate.
pub const CRATE_ROOT: &str = "crate";

/// A canonical Rust module path such as `crate::models` or `std::time`.
///
/// Local modules always start with `crate`; anything else names a module of
/// another crate, which the engine can reference but never loads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PackagePath(String);

impl PackagePath {
    /// Normalizes a user supplied package identity.
    ///
    /// `models`, `crate::models`, `my_project/models` and `./models` all
    /// denote local modules; an empty identity is the crate root.
    ///
    /// ```
    /// use simplegen::PackagePath;
    ///
    /// assert_eq!(PackagePath::local("my_project/models").as_str(), "crate::my_project::models");
    /// assert_eq!(PackagePath::local("crate::models").as_str(), "crate::models");
    /// assert_eq!(PackagePath::local("").as_str(), "crate");
    /// ```
    pub fn local(identity: &str) -> Self {
        let segments: Vec<&str> = identity
            .split(['/', ':'])
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != "." && *s != CRATE_ROOT)
            .collect();
        Self::from_segments(std::iter::once(CRATE_ROOT).chain(segments))
    }

    /// Builds a path from already absolute segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = segments
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("::");
        Self(joined)
    }

    /// The path as written in Rust source.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments, including the leading `crate` for local modules.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split("::")
    }

    /// Whether the module belongs to the scanned crate.
    pub fn is_local(&self) -> bool {
        self.segments().next() == Some(CRATE_ROOT)
    }

    /// Whether this is the crate root itself.
    pub fn is_crate_root(&self) -> bool {
        self.0 == CRATE_ROOT
    }

    /// The last segment, used to qualify names from this module (`models`).
    pub fn short_name(&self) -> &str {
        self.0.rsplit("::").next().unwrap_or(&self.0)
    }

    /// The enclosing module, if any.
    pub fn parent(&self) -> Option<PackagePath> {
        self.0
            .rsplit_once("::")
            .map(|(parent, _)| PackagePath(parent.to_string()))
    }

    /// Segments leading from `base` down to this path.
    ///
    /// `None` unless `base` is this path or one of its ancestors.
    ///
    /// ```
    /// use simplegen::PackagePath;
    ///
    /// let dto = PackagePath::local("models::dto");
    /// assert_eq!(dto.relative_to(&PackagePath::local("models")), Some(vec!["dto"]));
    /// assert_eq!(dto.relative_to(&PackagePath::local("api")), None);
    /// ```
    pub fn relative_to(&self, base: &PackagePath) -> Option<Vec<&str>> {
        if self == base {
            return Some(Vec::new());
        }
        let rest = self.0.strip_prefix(base.as_str())?.strip_prefix("::")?;
        Some(rest.split("::").collect())
    }

    /// Appends one segment.
    pub fn child(&self, segment: &str) -> PackagePath {
        PackagePath(format!("{}::{}", self.0, segment))
    }

    /// Directory holding this module's child files, relative to the source root.
    ///
    /// `crate` maps to the root itself, `crate::a::b` to `a/b`.
    pub fn relative_dir(&self) -> PathBuf {
        self.segments().skip(1).collect::<PathBuf>()
    }

    /// Candidate source files for a local module below `root`.
    pub fn candidate_files(&self, root: &Path) -> Vec<PathBuf> {
        if self.is_crate_root() {
            return vec![root.join("lib.rs"), root.join("main.rs")];
        }
        let dir = root.join(self.relative_dir());
        let mut file = dir.clone();
        file.set_extension("rs");
        vec![file, dir.join("mod.rs")]
    }
}

impl fmt::Display for PackagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
