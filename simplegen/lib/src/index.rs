//! The declaration index: the package cache of one engine run.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use syn::{Fields, Item};
use tracing::{debug, info};

use crate::config::GeneratorConfig;
use crate::error::{Result, SimplegenError};
use crate::fields::shape::{Resolver, TypeShape};
use crate::fields::{self, FieldPath, ResolvedFields};
use crate::package::{DeclarationKind, Package, PackagePath};

/// How many `type A = B;` hops are followed before giving up.
const MAX_ALIAS_DEPTH: usize = 8;

/// A struct with named fields, ready for field extraction.
#[derive(Debug, Clone)]
pub struct StructuralType {
    pub name: String,
    /// Package the struct is declared in; its scope resolves field types.
    pub package: Rc<Package>,
    /// Inline modules enclosing the struct inside `package`.
    pub scope: Vec<String>,
    pub generics: syn::Generics,
    pub fields: syn::FieldsNamed,
}

impl StructuralType {
    /// Resolver for the struct's field types.
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::within(&self.package, &self.scope, &self.generics).with_self_type(&self.name)
    }

    /// Shape naming the struct itself.
    pub fn shape(&self) -> TypeShape {
        TypeShape::Named {
            module: self.package.module_path(&self.scope),
            name: self.name.clone(),
            args: Vec::new(),
        }
    }
}

/// Loads packages once and answers lookups against them.
///
/// The cache only grows: a package is parsed on its first request and the
/// same `Rc<Package>` is handed out for the rest of the run.
#[derive(Debug)]
pub struct DeclarationIndex {
    config: GeneratorConfig,
    cache: RefCell<HashMap<PackagePath, Rc<Package>>>,
    requested: Vec<PackagePath>,
}

impl DeclarationIndex {
    /// Loads every requested package.
    ///
    /// ## Errors
    /// Fails on the first package that cannot be resolved, read or parsed;
    /// nothing is scanned from a partially loaded set.
    pub fn load<I, S>(config: GeneratorConfig, identities: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        config.validate()?;
        let mut index = Self {
            config,
            cache: RefCell::new(HashMap::new()),
            requested: Vec::new(),
        };

        for identity in identities {
            let path = PackagePath::local(identity.as_ref());
            index.package(&path)?;
            if !index.requested.contains(&path) {
                index.requested.push(path);
            }
        }

        info!(packages = index.requested.len(), "loaded requested packages");
        Ok(index)
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// The requested packages, in request order.
    pub fn packages(&self) -> Vec<Rc<Package>> {
        let cache = self.cache.borrow();
        self.requested
            .iter()
            .filter_map(|path| cache.get(path).cloned())
            .collect()
    }

    /// Whether a package is already in the cache.
    pub fn is_loaded(&self, path: &PackagePath) -> bool {
        self.cache.borrow().contains_key(path)
    }

    /// Returns a local package by identity, loading it on a cache miss.
    ///
    /// Accepts the same spellings as [`PackagePath::local`].
    pub fn get_package(&self, identity: &str) -> Result<Rc<Package>> {
        self.package(&PackagePath::local(identity))
    }

    /// Returns a package by canonical path, loading it on a cache miss.
    ///
    /// ## Errors
    /// `SimplegenError::Load` for modules outside the scanned crate or when
    /// the module does not resolve to exactly one file.
    pub fn package(&self, path: &PackagePath) -> Result<Rc<Package>> {
        if let Some(package) = self.cache.borrow().get(path) {
            return Ok(Rc::clone(package));
        }

        let package = Rc::new(Package::load(&self.config.source_root, path.clone())?);
        self.cache
            .borrow_mut()
            .insert(path.clone(), Rc::clone(&package));
        Ok(package)
    }

    /// Finds the package declaring `module::name`.
    ///
    /// Types of inline modules carry the inline module in `module`
    /// (`crate::models::dto`); those are looked up in the enclosing file's
    /// package under their qualified name (`dto::Order`).
    ///
    /// ## Errors
    /// The load error of `module` when neither it nor an enclosing package
    /// declares the type.
    pub fn locate(&self, module: &PackagePath, name: &str) -> Result<(Rc<Package>, String)> {
        let direct = match self.package(module) {
            Ok(package) => return Ok((package, name.to_string())),
            Err(err) => err,
        };

        let mut qualified = name.to_string();
        let mut current = module.clone();
        while let Some(parent) = current.parent().filter(PackagePath::is_local) {
            qualified = format!("{}::{qualified}", current.short_name());
            if let Ok(package) = self.package(&parent)
                && package.declaration(&qualified).is_some()
            {
                return Ok((package, qualified));
            }
            current = parent;
        }
        Err(direct)
    }

    /// Looks up a struct with named fields declared in `package`.
    ///
    /// `type_name` is package relative: `User` for a top-level struct,
    /// `dto::Order` for one inside `mod dto { .. }`. Type aliases are
    /// followed, across packages when they point elsewhere.
    ///
    /// ## Errors
    /// `SimplegenError::NotFound` when no declaration has that name,
    /// `SimplegenError::NotAStruct` when it does not lead to a struct with
    /// named fields.
    pub fn get_structural_type(&self, package: &Package, type_name: &str) -> Result<StructuralType> {
        let package = self.package(&package.path)?;
        self.structural_type(package, type_name, 0)
    }

    /// Looks up the struct a named shape refers to.
    ///
    /// ## Errors
    /// `SimplegenError::NotAStruct` for shapes that do not name a type, plus
    /// the errors of [`Self::locate`] and [`Self::get_structural_type`].
    pub fn structural_type_of(&self, shape: &TypeShape, context: &PackagePath) -> Result<StructuralType> {
        match shape {
            TypeShape::Named { module, name, .. } => {
                let (package, qualified) = self.locate(module, name)?;
                self.structural_type(package, &qualified, 0)
            }
            other => Err(SimplegenError::NotAStruct {
                package: context.to_string(),
                type_name: other.describe(context, &mut Vec::new()),
            }),
        }
    }

    fn structural_type(
        &self,
        package: Rc<Package>,
        type_name: &str,
        depth: usize,
    ) -> Result<StructuralType> {
        let not_a_struct = || SimplegenError::NotAStruct {
            package: package.path.to_string(),
            type_name: type_name.to_string(),
        };

        let declaration = package
            .declaration(type_name)
            .ok_or_else(|| SimplegenError::NotFound {
                package: package.path.to_string(),
                type_name: type_name.to_string(),
            })?;

        match (&declaration.kind, &declaration.item) {
            (DeclarationKind::Struct, Item::Struct(item)) => match &item.fields {
                Fields::Named(named) => Ok(StructuralType {
                    name: declaration.name.clone(),
                    scope: declaration.scope.clone(),
                    generics: item.generics.clone(),
                    fields: named.clone(),
                    package: Rc::clone(&package),
                }),
                _ => Err(not_a_struct()),
            },
            (DeclarationKind::Alias, Item::Type(alias)) if depth < MAX_ALIAS_DEPTH => {
                let shape = Resolver::within(&package, &declaration.scope, &alias.generics)
                    .resolve(&alias.ty)?;
                let TypeShape::Named { module, name, .. } = shape else {
                    return Err(not_a_struct());
                };
                debug!(alias = type_name, target = %format!("{module}::{name}"), "following alias");
                let (target, qualified) = self.locate(&module, &name)?;
                self.structural_type(target, &qualified, depth + 1)
                    .map_err(|err| match err {
                        SimplegenError::NotFound { .. } => not_a_struct(),
                        other => other,
                    })
            }
            _ => Err(not_a_struct()),
        }
    }

    /// Flattens a struct's fields; see [`fields::resolve_fields`].
    pub fn resolve_fields(&self, structural: &StructuralType, target: &Package) -> Result<ResolvedFields> {
        fields::resolve_fields(self, structural, target)
    }

    /// Finds a field by name through flattened members; see [`fields::find_field`].
    pub fn find_field(&self, structural: &StructuralType, name: &str) -> Result<Option<FieldPath>> {
        fields::find_field(self, structural, name)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn fixture() -> Result<(TempDir, GeneratorConfig), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("src");
        fs::create_dir_all(&root)?;
        fs::write(root.join("lib.rs"), "pub mod models;\npub mod responses;\n")?;
        fs::write(
            root.join("models.rs"),
            r#"
pub struct User { pub id: i64 }
pub struct Unit;
pub enum Role { Admin }
pub type Account = User;
pub type Remote = crate::responses::Page;
pub type Numbers = Vec<i64>;

pub mod dto {
    pub struct Order { pub id: i64 }
    pub type Purchase = Order;
}
"#,
        )?;
        fs::write(root.join("responses.rs"), "pub struct Page { pub cursor: String }\n")?;
        let config = GeneratorConfig::with_source_root(root);
        Ok((temp_dir, config))
    }

    #[test]
    fn packages_are_loaded_once_in_request_order() -> Result<(), Box<dyn std::error::Error>> {
        let (_dir, config) = fixture()?;
        let index = DeclarationIndex::load(config, ["responses", "models", "crate::responses"])?;

        let order: Vec<String> = index.packages().iter().map(|p| p.path.to_string()).collect();
        assert_eq!(order, vec!["crate::responses", "crate::models"]);

        let first = index.get_package("models")?;
        let second = index.get_package("crate::models")?;
        assert!(Rc::ptr_eq(&first, &second));
        Ok(())
    }

    #[test]
    fn load_fails_for_unknown_package() -> Result<(), Box<dyn std::error::Error>> {
        let (_dir, config) = fixture()?;
        let err = DeclarationIndex::load(config, ["models", "missing"]).unwrap_err();
        assert!(matches!(err, SimplegenError::Load { .. }));
        Ok(())
    }

    #[test]
    fn get_package_loads_on_demand_without_scanning() -> Result<(), Box<dyn std::error::Error>> {
        let (_dir, config) = fixture()?;
        let index = DeclarationIndex::load(config, ["models"])?;
        assert!(!index.is_loaded(&PackagePath::local("responses")));

        index.get_package("responses")?;
        assert!(index.is_loaded(&PackagePath::local("responses")));
        assert_eq!(index.packages().len(), 1);
        Ok(())
    }

    #[test]
    fn structural_type_lookup() -> Result<(), Box<dyn std::error::Error>> {
        let (_dir, config) = fixture()?;
        let index = DeclarationIndex::load(config, ["models"])?;
        let models = index.get_package("models")?;

        let user = index.get_structural_type(&models, "User")?;
        assert_eq!(user.fields.named.len(), 1);

        let account = index.get_structural_type(&models, "Account")?;
        assert_eq!(account.name, "User");

        let remote = index.get_structural_type(&models, "Remote")?;
        assert_eq!(remote.package.path.to_string(), "crate::responses");

        for name in ["Unit", "Role", "Numbers"] {
            let err = index.get_structural_type(&models, name).unwrap_err();
            assert!(matches!(err, SimplegenError::NotAStruct { .. }), "{name}: {err}");
        }

        let err = index.get_structural_type(&models, "Missing").unwrap_err();
        assert!(matches!(err, SimplegenError::NotFound { .. }));
        Ok(())
    }

    #[test]
    fn inline_module_structs_are_addressed_by_qualified_name() -> Result<(), Box<dyn std::error::Error>> {
        let (_dir, config) = fixture()?;
        let index = DeclarationIndex::load(config, ["models"])?;
        let models = index.get_package("models")?;

        let order = index.get_structural_type(&models, "dto::Order")?;
        assert_eq!(order.name, "Order");
        assert_eq!(order.scope, vec!["dto"]);
        assert_eq!(
            order.shape().describe(&models.path, &mut Vec::new()),
            "super::dto::Order"
        );

        let purchase = index.get_structural_type(&models, "dto::Purchase")?;
        assert_eq!(purchase.name, "Order");

        let err = index.get_structural_type(&models, "Order").unwrap_err();
        assert!(matches!(err, SimplegenError::NotFound { .. }));
        Ok(())
    }

    #[test]
    fn locate_falls_back_to_the_enclosing_file() -> Result<(), Box<dyn std::error::Error>> {
        let (_dir, config) = fixture()?;
        let index = DeclarationIndex::load(config, ["responses"])?;

        let (package, qualified) = index.locate(&PackagePath::local("models::dto"), "Order")?;
        assert_eq!(package.path.as_str(), "crate::models");
        assert_eq!(qualified, "dto::Order");

        let err = index
            .locate(&PackagePath::local("models::absent"), "Order")
            .unwrap_err();
        assert!(matches!(err, SimplegenError::Load { .. }));
        Ok(())
    }
}
