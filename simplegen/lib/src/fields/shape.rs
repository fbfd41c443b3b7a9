//! Type shapes: a closed model of the field types the extractor understands.
//!
//! [`Resolver::resolve`] turns a `syn::Type` written in some module into a
//! [`TypeShape`] whose named types carry absolute module paths.
//! [`TypeShape::describe`] renders a shape for a generated file, which is a
//! child module of its package, and reports the imports that rendering needs.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt::Write as _;

use quote::ToTokens;
use syn::{GenericArgument, PathArguments, Type};

use crate::error::{Result, SimplegenError};
use crate::package::{Declaration, Package, PackagePath, Scope};

/// Wrappers rendered as a pointer marker around their target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerKind {
    Option,
    Box,
    Rc,
    Arc,
    Ref { mutable: bool },
    Raw { mutable: bool },
}

/// Homogeneous collections rendered as a sequence marker around their element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceKind {
    /// A std collection with one type parameter, e.g. `Vec` or `BTreeSet`.
    Collection(String),
    Slice,
    /// Fixed size array; keeps the length expression as written.
    Array(String),
}

/// The shape of a field type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    /// Primitives, `String` and the declaring type's own generic parameters.
    Basic(String),
    Pointer {
        kind: PointerKind,
        target: Box<TypeShape>,
    },
    Sequence {
        kind: SequenceKind,
        element: Box<TypeShape>,
    },
    /// `HashMap` / `BTreeMap`.
    Map {
        kind: String,
        key: Box<TypeShape>,
        value: Box<TypeShape>,
    },
    Tuple(Vec<TypeShape>),
    /// A named type defined in `module`.
    Named {
        module: PackagePath,
        name: String,
        args: Vec<TypeShape>,
    },
    /// Trait objects, `impl Trait`, function pointers and anything else
    /// without a nameable definition; kept as literal text.
    Dynamic(String),
}

const PRIMITIVES: [&str; 18] = [
    "bool", "char", "str", "String", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16",
    "u32", "u64", "u128", "usize", "f32", "f64",
];

const POINTERS: [(&str, PointerKind); 4] = [
    ("Option", PointerKind::Option),
    ("Box", PointerKind::Box),
    ("Rc", PointerKind::Rc),
    ("Arc", PointerKind::Arc),
];

const COLLECTIONS: [&str; 6] = ["Vec", "VecDeque", "LinkedList", "HashSet", "BTreeSet", "BinaryHeap"];

const MAPS: [&str; 2] = ["HashMap", "BTreeMap"];

/// Names usable without a `use` declaration.
const PRELUDE: [&str; 4] = ["Option", "Box", "Vec", "String"];

/// Module of every std collection except the prelude's `Vec`.
const STD_COLLECTIONS: &str = "std::collections";

fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

/// Resolution context: the module a type was written in and the generic
/// parameters in scope there.
pub struct Resolver<'a> {
    package: &'a Package,
    /// Inline modules enclosing the written type; empty at the top level.
    inner: Vec<String>,
    module: PackagePath,
    scope: Cow<'a, Scope>,
    generics: HashSet<String>,
    /// Declaration `Self` stands for, if any.
    self_type: Option<String>,
}

impl<'a> Resolver<'a> {
    /// Resolves types written at the top level of `package`.
    pub fn new(package: &'a Package, generics: &syn::Generics) -> Self {
        Self::within(package, &[], generics)
    }

    /// Resolves types written inside the inline module `inner` of `package`.
    pub fn within(package: &'a Package, inner: &[String], generics: &syn::Generics) -> Self {
        let scope = if inner.is_empty() {
            Cow::Borrowed(&package.scope)
        } else {
            Cow::Owned(package.scope_at(inner).unwrap_or_default())
        };
        Self {
            package,
            inner: inner.to_vec(),
            module: package.module_path(inner),
            scope,
            generics: generics.type_params().map(|p| p.ident.to_string()).collect(),
            self_type: None,
        }
    }

    /// Resolves `Self` to the declaration `name` of the resolver's module.
    pub fn with_self_type(mut self, name: &str) -> Self {
        self.self_type = Some(name.to_string());
        self
    }

    /// Resolves a written type into a shape.
    ///
    /// ## Errors
    /// Returns `SimplegenError::UnresolvedType` for a single-segment name that
    /// is neither a generic parameter, a declaration of the module, an
    /// imported name nor part of the prelude.
    pub fn resolve(&self, ty: &Type) -> Result<TypeShape> {
        match ty {
            Type::Path(type_path) if type_path.qself.is_none() => self.resolve_path(&type_path.path),
            Type::Reference(reference) => Ok(TypeShape::Pointer {
                kind: PointerKind::Ref {
                    mutable: reference.mutability.is_some(),
                },
                target: Box::new(self.resolve(&reference.elem)?),
            }),
            Type::Ptr(pointer) => Ok(TypeShape::Pointer {
                kind: PointerKind::Raw {
                    mutable: pointer.mutability.is_some(),
                },
                target: Box::new(self.resolve(&pointer.elem)?),
            }),
            Type::Slice(slice) => Ok(TypeShape::Sequence {
                kind: SequenceKind::Slice,
                element: Box::new(self.resolve(&slice.elem)?),
            }),
            Type::Array(array) => Ok(TypeShape::Sequence {
                kind: SequenceKind::Array(tidy_tokens(&array.len.to_token_stream().to_string())),
                element: Box::new(self.resolve(&array.elem)?),
            }),
            Type::Tuple(tuple) => Ok(TypeShape::Tuple(
                tuple
                    .elems
                    .iter()
                    .map(|elem| self.resolve(elem))
                    .collect::<Result<_>>()?,
            )),
            Type::Paren(paren) => self.resolve(&paren.elem),
            Type::Group(group) => self.resolve(&group.elem),
            other => Ok(TypeShape::Dynamic(tidy_tokens(
                &other.to_token_stream().to_string(),
            ))),
        }
    }

    fn resolve_path(&self, path: &syn::Path) -> Result<TypeShape> {
        let Some(last) = path.segments.last() else {
            return Ok(TypeShape::Dynamic(String::new()));
        };
        let segments: Vec<String> = path.segments.iter().map(|s| s.ident.to_string()).collect();
        let name = last.ident.to_string();
        let args = self.type_arguments(&last.arguments)?;

        if segments.len() == 1 && path.leading_colon.is_none() {
            if self.generics.contains(&name) {
                return Ok(TypeShape::Basic(name));
            }
            if name == "Self"
                && let Some(self_type) = &self.self_type
            {
                return Ok(TypeShape::Named {
                    module: self.module.clone(),
                    name: self_type.clone(),
                    args,
                });
            }
            if self.package.declaration_in(&self.inner, &name).is_some() {
                return Ok(TypeShape::Named {
                    module: self.module.clone(),
                    name,
                    args,
                });
            }
            if !self.scope.imports(&name) {
                if is_primitive(&name) {
                    return Ok(TypeShape::Basic(name));
                }
                if PRELUDE.contains(&name.as_str()) {
                    return Ok(std_shape(&name, args.clone())
                        .unwrap_or(TypeShape::Named {
                            module: PackagePath::from_segments(["std"]),
                            name,
                            args,
                        }));
                }
                return Err(SimplegenError::UnresolvedType {
                    package: self.module.to_string(),
                    name,
                });
            }
        }

        let mut absolute = if path.leading_colon.is_some() {
            let mut with_root = vec![String::new()];
            with_root.extend(segments);
            self.scope.absolutize(&self.module, &with_root)
        } else {
            self.scope.absolutize(&self.module, &segments)
        };

        let name = absolute.pop().unwrap_or(name);
        if absolute.is_empty() {
            return Err(SimplegenError::UnresolvedType {
                package: self.module.to_string(),
                name,
            });
        }

        let module = PackagePath::from_segments(&absolute);
        let from_std = matches!(absolute[0].as_str(), "std" | "core" | "alloc");
        if from_std && let Some(shape) = std_shape(&name, args.clone()) {
            return Ok(shape);
        }

        Ok(TypeShape::Named { module, name, args })
    }

    fn type_arguments(&self, arguments: &PathArguments) -> Result<Vec<TypeShape>> {
        match arguments {
            PathArguments::AngleBracketed(angle) => angle
                .args
                .iter()
                .filter_map(|arg| match arg {
                    GenericArgument::Type(ty) => Some(self.resolve(ty)),
                    _ => None,
                })
                .collect(),
            _ => Ok(Vec::new()),
        }
    }
}

/// Maps well-known std names to their structural shape.
fn std_shape(name: &str, mut args: Vec<TypeShape>) -> Option<TypeShape> {
    if name == "String" && args.is_empty() {
        return Some(TypeShape::Basic(name.to_string()));
    }
    if let Some((_, kind)) = POINTERS.iter().find(|(n, _)| *n == name)
        && args.len() == 1
    {
        return Some(TypeShape::Pointer {
            kind: kind.clone(),
            target: Box::new(args.remove(0)),
        });
    }
    if COLLECTIONS.contains(&name) && args.len() == 1 {
        return Some(TypeShape::Sequence {
            kind: SequenceKind::Collection(name.to_string()),
            element: Box::new(args.remove(0)),
        });
    }
    if MAPS.contains(&name) && args.len() == 2 {
        let value = args.remove(1);
        let key = args.remove(0);
        return Some(TypeShape::Map {
            kind: name.to_string(),
            key: Box::new(key),
            value: Box::new(value),
        });
    }
    None
}

impl TypeShape {
    /// Shape naming `declaration` of `package`.
    pub fn declared(package: &Package, declaration: &Declaration) -> Self {
        TypeShape::Named {
            module: package.module_path(&declaration.scope),
            name: declaration.name.clone(),
            args: Vec::new(),
        }
    }

    /// Renders the shape as Rust source valid inside a generated child module
    /// of `target`, appending the module paths it needs to `imports`.
    ///
    /// - types of `target` and its inline modules render through `super`
    /// - crate root types render as `crate::Name`
    /// - types of other modules render as `<short>::<Name>` and contribute
    ///   their module path once per occurrence
    /// - external crate roots and std wrappers outside the prelude render
    ///   fully qualified and import nothing
    pub fn describe(&self, target: &PackagePath, imports: &mut Vec<String>) -> String {
        match self {
            TypeShape::Basic(name) | TypeShape::Dynamic(name) => name.clone(),
            TypeShape::Pointer { kind, target: inner } => {
                let inner = inner.describe(target, imports);
                match kind {
                    PointerKind::Option => format!("Option<{inner}>"),
                    PointerKind::Box => format!("Box<{inner}>"),
                    PointerKind::Rc => format!("std::rc::Rc<{inner}>"),
                    PointerKind::Arc => format!("std::sync::Arc<{inner}>"),
                    PointerKind::Ref { mutable: false } => format!("&{inner}"),
                    PointerKind::Ref { mutable: true } => format!("&mut {inner}"),
                    PointerKind::Raw { mutable: false } => format!("*const {inner}"),
                    PointerKind::Raw { mutable: true } => format!("*mut {inner}"),
                }
            }
            TypeShape::Sequence { kind, element } => {
                let element = element.describe(target, imports);
                match kind {
                    SequenceKind::Collection(name) if name == "Vec" => format!("Vec<{element}>"),
                    SequenceKind::Collection(name) => {
                        format!("{STD_COLLECTIONS}::{name}<{element}>")
                    }
                    SequenceKind::Slice => format!("[{element}]"),
                    SequenceKind::Array(len) => format!("[{element}; {len}]"),
                }
            }
            TypeShape::Map { kind, key, value } => {
                let key = key.describe(target, imports);
                let value = value.describe(target, imports);
                format!("{STD_COLLECTIONS}::{kind}<{key}, {value}>")
            }
            TypeShape::Tuple(elements) => {
                let parts: Vec<String> = elements.iter().map(|e| e.describe(target, imports)).collect();
                if parts.len() == 1 {
                    format!("({},)", parts[0])
                } else {
                    format!("({})", parts.join(", "))
                }
            }
            TypeShape::Named { module, name, args } => {
                let mut rendered = qualify(module, name, target, imports);
                if !args.is_empty() {
                    let args: Vec<String> = args.iter().map(|a| a.describe(target, imports)).collect();
                    let _ = write!(rendered, "<{}>", args.join(", "));
                }
                rendered
            }
        }
    }

    /// Whether the outermost layer is a pointer marker.
    pub fn is_pointer(&self) -> bool {
        matches!(self, TypeShape::Pointer { .. })
    }

    /// Whether the outermost layer is a sequence marker.
    pub fn is_sequence(&self) -> bool {
        matches!(self, TypeShape::Sequence { .. })
    }
}

/// Path to `module::name` as seen from a child module of `target`.
fn qualify(module: &PackagePath, name: &str, target: &PackagePath, imports: &mut Vec<String>) -> String {
    if let Some(rest) = module.relative_to(target) {
        return std::iter::once("super")
            .chain(rest)
            .chain(std::iter::once(name))
            .collect::<Vec<_>>()
            .join("::");
    }
    if module.is_crate_root() || (!module.is_local() && module.segments().count() == 1) {
        return format!("{module}::{name}");
    }
    imports.push(module.to_string());
    format!("{}::{}", module.short_name(), name)
}

/// Collapses the spacing `proc_macro2` puts between tokens.
pub(crate) fn tidy_tokens(text: &str) -> String {
    let mut out = text.replace(" :: ", "::").replace(":: ", "::");
    for (from, to) in [
        (" < ", "<"),
        ("< ", "<"),
        (" <", "<"),
        (" >", ">"),
        (" ,", ","),
        (" (", "("),
        ("( ", "("),
        (" )", ")"),
        ("& ", "&"),
        (" ;", ";"),
    ] {
        out = out.replace(from, to);
    }
    out = out.replace("->", " -> ");
    while out.contains("  ") {
        out = out.replace("  ", " ");
    }
    out.trim().to_string()
}
