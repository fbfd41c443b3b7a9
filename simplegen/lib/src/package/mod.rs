//! Packages: parsed modules of the scanned crate and their declarations.

pub mod docs;
pub mod path;
pub mod scope;

use std::path::{Path, PathBuf};

use syn::Item;
use tracing::debug;

use crate::error::{Result, SimplegenError};

pub use path::PackagePath;
pub use scope::Scope;

/// The syntactic kind of a type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Struct,
    Enum,
    Union,
    Alias,
}

/// A named type definition found in a package.
#[derive(Debug, Clone)]
pub struct Declaration {
    /// Type name as declared.
    pub name: String,
    pub kind: DeclarationKind,
    /// Documentation lines after the copy-down pass.
    pub docs: Vec<String>,
    /// Inline modules enclosing the declaration; empty at the top level.
    pub scope: Vec<String>,
    /// The declaration's syntax node.
    pub item: Item,
}

impl Declaration {
    fn from_item(item: &Item, scope: &[String]) -> Option<Self> {
        let (name, kind, attrs) = match item {
            Item::Struct(s) => (&s.ident, DeclarationKind::Struct, &s.attrs),
            Item::Enum(e) => (&e.ident, DeclarationKind::Enum, &e.attrs),
            Item::Union(u) => (&u.ident, DeclarationKind::Union, &u.attrs),
            Item::Type(t) => (&t.ident, DeclarationKind::Alias, &t.attrs),
            _ => return None,
        };
        Some(Self {
            name: name.to_string(),
            kind,
            docs: docs::doc_lines(attrs),
            scope: scope.to_vec(),
            item: item.clone(),
        })
    }

    /// Name relative to the package: `Order` at the top level, `dto::Order`
    /// inside `mod dto { .. }`.
    pub fn qualified_name(&self) -> String {
        self.scope
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.name.as_str()))
            .collect::<Vec<_>>()
            .join("::")
    }
}

/// One loaded module of the scanned crate.
#[derive(Debug)]
pub struct Package {
    /// Canonical identity, e.g. `crate::models`.
    pub path: PackagePath,
    /// Short name, e.g. `models`.
    pub name: String,
    /// Source file the module was parsed from.
    pub file: PathBuf,
    /// Directory generated files for this module are written to.
    pub dir: PathBuf,
    /// Parsed, documentation-normalized syntax tree.
    pub syntax: syn::File,
    /// Type declarations in source order, nested inline modules included.
    pub declarations: Vec<Declaration>,
    /// Names visible at the module's top level.
    pub scope: Scope,
}

impl Package {
    /// Resolves, reads and parses a local module below `root`.
    ///
    /// ## Errors
    /// Returns `SimplegenError::Load` when the module is not local, when no
    /// candidate file exists or when more than one does, `Io` when the file
    /// cannot be read and `Parse` when it is not valid Rust.
    pub fn load(root: &Path, path: PackagePath) -> Result<Self> {
        if !path.is_local() {
            return Err(SimplegenError::Load {
                package: path.to_string(),
                reason: "only modules of the scanned crate can be loaded".to_string(),
            });
        }

        let file = resolve_module_file(root, &path)?;
        let source = std::fs::read_to_string(&file).map_err(|source| SimplegenError::Io {
            path: file.clone(),
            source,
        })?;

        let package = Self::parse(root, path, file, &source)?;
        debug!(
            package = %package.path,
            file = %package.file.display(),
            declarations = package.declarations.len(),
            "loaded package"
        );
        Ok(package)
    }

    /// Builds a package from source text without touching the filesystem.
    pub fn parse(root: &Path, path: PackagePath, file: PathBuf, source: &str) -> Result<Self> {
        let mut syntax = syn::parse_file(source).map_err(|source| SimplegenError::Parse {
            package: path.to_string(),
            path: file.clone(),
            source,
        })?;

        docs::copy_down(&mut syntax);

        let mut declarations = Vec::new();
        collect_declarations(&syntax.items, &mut Vec::new(), &mut declarations);

        Ok(Self {
            name: path.short_name().to_string(),
            dir: module_dir(root, &path),
            scope: Scope::from_items(&syntax.items),
            path,
            file,
            syntax,
            declarations,
        })
    }

    /// Finds a declaration by package-relative name.
    ///
    /// A plain name only matches at the top level; declarations inside
    /// inline modules are addressed with their module path (`dto::Order`).
    pub fn declaration(&self, qualified_name: &str) -> Option<&Declaration> {
        self.declarations
            .iter()
            .find(|d| d.qualified_name() == qualified_name)
    }

    /// Finds a declaration by name directly inside the inline module `scope`.
    pub fn declaration_in(&self, scope: &[String], name: &str) -> Option<&Declaration> {
        self.declarations
            .iter()
            .find(|d| d.scope == scope && d.name == name)
    }

    /// Module path of the inline module `scope` (the package itself when empty).
    pub fn module_path(&self, scope: &[String]) -> PackagePath {
        scope.iter().fold(self.path.clone(), |path, segment| path.child(segment))
    }

    /// Names visible inside the inline module `scope`.
    ///
    /// Returns `None` when the package has no such inline module.
    pub fn scope_at(&self, scope: &[String]) -> Option<Scope> {
        let mut items = &self.syntax.items;
        for segment in scope {
            items = items.iter().find_map(|item| match item {
                Item::Mod(module) if module.ident == segment.as_str() => {
                    module.content.as_ref().map(|(_, nested)| nested)
                }
                _ => None,
            })?;
        }
        Some(Scope::from_items(items))
    }
}

fn module_dir(root: &Path, path: &PackagePath) -> PathBuf {
    if path.is_crate_root() {
        root.to_path_buf()
    } else {
        root.join(path.relative_dir())
    }
}

fn resolve_module_file(root: &Path, path: &PackagePath) -> Result<PathBuf> {
    let existing: Vec<PathBuf> = path
        .candidate_files(root)
        .into_iter()
        .filter(|candidate| candidate.is_file())
        .collect();

    match existing.as_slice() {
        [] => Err(SimplegenError::Load {
            package: path.to_string(),
            reason: format!("no module file found below `{}`", root.display()),
        }),
        [file] => Ok(file.clone()),
        // lib.rs and main.rs may legitimately coexist; the library wins.
        [lib, _] if path.is_crate_root() => Ok(lib.clone()),
        files => Err(SimplegenError::Load {
            package: path.to_string(),
            reason: format!(
                "module resolves to {} files: {}",
                files.len(),
                files
                    .iter()
                    .map(|f| f.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }),
    }
}

fn collect_declarations(items: &[Item], scope: &mut Vec<String>, out: &mut Vec<Declaration>) {
    for item in items {
        if let Item::Mod(module) = item {
            if let Some((_, nested)) = &module.content {
                scope.push(module.ident.to_string());
                collect_declarations(nested, scope, out);
                scope.pop();
            }
            continue;
        }
        if let Some(declaration) = Declaration::from_item(item, scope) {
            out.push(declaration);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn collects_declarations_in_source_order() {
        let package = Package::parse(
            Path::new("src"),
            PackagePath::local("models"),
            PathBuf::from("src/models.rs"),
            r#"
/// simplegen:paginator
pub struct User { }
pub enum Role { Admin }
pub type Users = Vec<User>;
mod nested {
    pub struct Inner { }
}
pub fn helper() {}
"#,
        )
        .unwrap();

        let names: Vec<_> = package.declarations.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["User", "Role", "Users", "Inner"]);
        assert_eq!(package.declarations[0].docs, vec!["simplegen:paginator"]);
        assert_eq!(package.declarations[2].kind, DeclarationKind::Alias);
        assert_eq!(package.declarations[3].scope, vec!["nested"]);
        assert!(package.declaration("Inner").is_none());
        assert_eq!(package.declarations[3].qualified_name(), "nested::Inner");
        assert!(package.declaration("nested::Inner").is_some());
        assert!(package.declaration_in(&["nested".to_string()], "Inner").is_some());
        assert_eq!(
            package.module_path(&["nested".to_string()]).as_str(),
            "crate::models::nested"
        );
        assert!(package.scope_at(&["nested".to_string()]).is_some());
        assert!(package.scope_at(&["absent".to_string()]).is_none());
        assert_eq!(package.name, "models");
        assert_eq!(package.dir, PathBuf::from("src/models"));
    }

    #[test]
    fn load_reads_either_module_layout() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        fs::create_dir_all(root.join("api"))?;
        fs::write(root.join("models.rs"), "pub struct A { }\n")?;
        fs::write(root.join("api/mod.rs"), "pub struct B { }\n")?;

        let models = Package::load(root, PackagePath::local("models"))?;
        assert_eq!(models.file, root.join("models.rs"));

        let api = Package::load(root, PackagePath::local("api"))?;
        assert_eq!(api.file, root.join("api/mod.rs"));
        assert_eq!(api.dir, root.join("api"));
        Ok(())
    }

    #[test]
    fn load_rejects_ambiguous_and_missing_modules() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        fs::create_dir_all(root.join("models"))?;
        fs::write(root.join("models.rs"), "")?;
        fs::write(root.join("models/mod.rs"), "")?;

        let ambiguous = Package::load(root, PackagePath::local("models")).unwrap_err();
        assert!(matches!(ambiguous, SimplegenError::Load { .. }));

        let missing = Package::load(root, PackagePath::local("nope")).unwrap_err();
        assert!(matches!(missing, SimplegenError::Load { .. }));

        let external = Package::load(root, PackagePath::from_segments(["chrono"])).unwrap_err();
        assert!(matches!(external, SimplegenError::Load { .. }));
        Ok(())
    }

    #[test]
    fn parse_errors_carry_the_file() {
        let err = Package::parse(
            Path::new("src"),
            PackagePath::local("broken"),
            PathBuf::from("src/broken.rs"),
            "pub struct {",
        )
        .unwrap_err();
        assert!(matches!(err, SimplegenError::Parse { .. }));
    }
}
