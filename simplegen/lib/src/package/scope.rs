//! Name scope of a module: its `use` declarations and child modules.
//!
//! The scope turns a path written in a module (`User`, `models::User`,
//! `super::models::User`, `chrono::Utc`) into an absolute path whose module
//! part can be compared against package identities.

use std::collections::{HashMap, HashSet};

use syn::{Item, UseTree};

use super::path::{CRATE_ROOT, PackagePath};

/// Crates whose paths are never re-rooted through the `use` map.
const STD_ROOTS: [&str; 3] = ["std", "core", "alloc"];

/// Imports and child modules visible at the top level of one module.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    /// Local name -> written path (`User` -> `crate::models::User`).
    uses: HashMap<String, Vec<String>>,
    /// Modules declared with `mod name;` or `mod name { .. }`.
    children: HashSet<String>,
}

impl Scope {
    /// Collects the top-level `use` and `mod` items of a parsed file.
    pub fn from_items(items: &[Item]) -> Self {
        let mut scope = Scope::default();
        for item in items {
            match item {
                Item::Use(item_use) => {
                    let mut prefix = Vec::new();
                    if item_use.leading_colon.is_some() {
                        prefix.push(String::new());
                    }
                    scope.collect_use(&item_use.tree, &mut prefix);
                }
                Item::Mod(module) => {
                    scope.children.insert(module.ident.to_string());
                }
                _ => {}
            }
        }
        scope
    }

    fn collect_use(&mut self, tree: &UseTree, prefix: &mut Vec<String>) {
        match tree {
            UseTree::Path(path) => {
                prefix.push(path.ident.to_string());
                self.collect_use(&path.tree, prefix);
                prefix.pop();
            }
            UseTree::Name(name) => {
                let ident = name.ident.to_string();
                if ident == "self" {
                    if let Some(last) = prefix.last() {
                        self.uses.insert(last.clone(), prefix.clone());
                    }
                } else {
                    let mut full = prefix.clone();
                    full.push(ident.clone());
                    self.uses.insert(ident, full);
                }
            }
            UseTree::Rename(rename) => {
                let mut full = prefix.clone();
                if rename.ident != "self" {
                    full.push(rename.ident.to_string());
                }
                self.uses.insert(rename.rename.to_string(), full);
            }
            UseTree::Group(group) => {
                for item in &group.items {
                    self.collect_use(item, prefix);
                }
            }
            // Glob imports cannot be resolved without loading their target.
            UseTree::Glob(_) => {}
        }
    }

    /// Whether `name` was brought into scope by a `use` declaration.
    pub fn imports(&self, name: &str) -> bool {
        self.uses.contains_key(name)
    }

    /// Resolves a written path to absolute segments.
    ///
    /// `module` is the module the path was written in. Leading `crate`,
    /// `self` and `super` are expanded, `std`/`core`/`alloc` kept as is, the
    /// first segment is looked up in the `use` map and then among child
    /// modules; anything else is taken to be an external crate path.
    pub fn absolutize(&self, module: &PackagePath, segments: &[String]) -> Vec<String> {
        self.absolutize_inner(module, segments, true)
    }

    fn absolutize_inner(
        &self,
        module: &PackagePath,
        segments: &[String],
        consult_uses: bool,
    ) -> Vec<String> {
        let Some(first) = segments.first() else {
            return Vec::new();
        };

        // `::name` paths from `use ::name::..` always denote external crates.
        if first.is_empty() {
            return segments[1..].to_vec();
        }

        match first.as_str() {
            CRATE_ROOT => segments.to_vec(),
            "self" => join(module, &segments[1..]),
            "super" => {
                let mut base = module.clone();
                let mut rest = segments;
                while rest.first().map(String::as_str) == Some("super") {
                    base = base.parent().unwrap_or(base);
                    rest = &rest[1..];
                }
                if rest.first().map(String::as_str) == Some("self") {
                    rest = &rest[1..];
                }
                join(&base, rest)
            }
            root if STD_ROOTS.contains(&root) => segments.to_vec(),
            name if consult_uses && self.uses.contains_key(name) => {
                let mut expanded = self.uses[name].clone();
                expanded.extend_from_slice(&segments[1..]);
                self.absolutize_inner(module, &expanded, false)
            }
            name if self.children.contains(name) => join(module, segments),
            _ => segments.to_vec(),
        }
    }
}

fn join(module: &PackagePath, rest: &[String]) -> Vec<String> {
    module
        .segments()
        .map(str::to_string)
        .chain(rest.iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(source: &str) -> Scope {
        let file = syn::parse_file(source).expect("fixture should parse");
        Scope::from_items(&file.items)
    }

    fn segs(path: &str) -> Vec<String> {
        path.split("::").map(str::to_string).collect()
    }

    #[test]
    fn resolves_plain_and_grouped_uses() {
        let scope = scope(
            r#"
use crate::models::User;
use chrono::{DateTime, Utc as Clock};
use super::shared::{self, Common};
"#,
        );
        let module = PackagePath::local("responses");

        assert_eq!(
            scope.absolutize(&module, &segs("User")),
            segs("crate::models::User")
        );
        assert_eq!(
            scope.absolutize(&module, &segs("DateTime")),
            segs("chrono::DateTime")
        );
        assert_eq!(scope.absolutize(&module, &segs("Clock")), segs("chrono::Utc"));
        assert_eq!(
            scope.absolutize(&module, &segs("Common")),
            segs("crate::shared::Common")
        );
        assert_eq!(
            scope.absolutize(&module, &segs("shared::Other")),
            segs("crate::shared::Other")
        );
    }

    #[test]
    fn resolves_relative_keywords_and_children() {
        let scope = scope("mod models;");
        let module = PackagePath::local("api::v1");

        assert_eq!(
            scope.absolutize(&module, &segs("self::Item")),
            segs("crate::api::v1::Item")
        );
        assert_eq!(
            scope.absolutize(&module, &segs("super::super::Root")),
            segs("crate::Root")
        );
        assert_eq!(
            scope.absolutize(&module, &segs("models::User")),
            segs("crate::api::v1::models::User")
        );
        assert_eq!(
            scope.absolutize(&module, &segs("std::time::Duration")),
            segs("std::time::Duration")
        );
        assert_eq!(
            scope.absolutize(&module, &segs("uuid::Uuid")),
            segs("uuid::Uuid")
        );
    }

    #[test]
    fn glob_imports_are_ignored() {
        let scope = scope("use crate::models::*;");
        assert!(!scope.imports("User"));
    }
}
