//! Field metadata extraction.
//!
//! [`resolve_fields`] flattens a struct into an ordered list of
//! [`FieldDescriptor`]s. Members marked `#[serde(flatten)]` are replaced by
//! the fields of the flattened struct, resolved recursively; every other
//! member must carry a serialization key, from its tag string or from
//! `#[serde(rename = "..")]`.

pub mod shape;
pub mod tags;

use proc_macro2::TokenTree;
use serde::Serialize;
use syn::Field;

use crate::error::{Result, SimplegenError};
use crate::index::{DeclarationIndex, StructuralType};
use crate::package::Package;
use shape::{Resolver, TypeShape};

/// How many nested `#[serde(flatten)]` members are followed.
const MAX_FLATTEN_DEPTH: usize = 16;

/// One resolved field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    /// Field identifier as declared.
    pub name: String,
    /// Access path from the resolved struct, `common.id` for a field reached
    /// through a flattened member.
    pub access: String,
    /// Type rendered relative to the target package (`Option<models::User>`).
    pub type_name: String,
    /// Raw tag string, possibly empty.
    pub tag: String,
    /// Serialization key taken from the tag.
    pub key: String,
    /// Structured form of the type.
    #[serde(skip)]
    pub shape: TypeShape,
}

/// Fields of a struct plus the imports their descriptions need.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedFields {
    pub fields: Vec<FieldDescriptor>,
    /// Module paths in order of first use; duplicates are possible and are
    /// removed when the output is aggregated.
    pub imports: Vec<String>,
}

/// A field found by name, possibly behind flattened members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    /// Access path from the searched struct (`common.id`).
    pub access: String,
    /// Type of the field, resolved in its declaring struct's scope.
    pub shape: TypeShape,
}

/// Resolves the fields of `structural` for code that will live in `target`.
///
/// Field types are resolved in the scope of the package declaring the
/// struct; descriptions and imports are computed relative to `target`.
///
/// ## Errors
/// - `SimplegenError::MissingSerializationKey` for a non-flattened field
///   without a key
/// - `SimplegenError::UnresolvedType` for a field type that cannot be resolved
/// - `SimplegenError::FlattenTooDeep` when flattened members nest too deeply
/// - lookup errors of the flattened struct (`NotFound`, `NotAStruct`, `Load`)
pub fn resolve_fields(
    index: &DeclarationIndex,
    structural: &StructuralType,
    target: &Package,
) -> Result<ResolvedFields> {
    resolve_nested(index, structural, target, 0)
}

fn resolve_nested(
    index: &DeclarationIndex,
    structural: &StructuralType,
    target: &Package,
    depth: usize,
) -> Result<ResolvedFields> {
    let config = index.config();
    let resolver = structural.resolver();
    let mut resolved = ResolvedFields::default();

    for field in &structural.fields.named {
        let name = field_name(field);

        if is_flattened(field) {
            let inner = flattened_struct(index, &resolver, structural, field, depth)?;
            let spliced = resolve_nested(index, &inner, target, depth + 1)?;
            resolved
                .fields
                .extend(spliced.fields.into_iter().map(|mut field| {
                    field.access = format!("{name}.{}", field.access);
                    field
                }));
            resolved.imports.extend(spliced.imports);
            continue;
        }

        let tag = tags::raw_tag(&field.attrs, &config.tag_attribute);
        let key = tags::serialization_key(&tag, &config.serialization_keys, &config.skip_sentinel)
            .or_else(|| tags::serde_rename(&field.attrs))
            .ok_or_else(|| SimplegenError::MissingSerializationKey {
                type_name: structural.name.clone(),
                field: name.clone(),
                keys: config.serialization_keys.join(", "),
            })?;

        let shape = resolver.resolve(&field.ty)?;
        let type_name = shape.describe(&target.path, &mut resolved.imports);

        resolved.fields.push(FieldDescriptor {
            access: name.clone(),
            name,
            type_name,
            tag,
            key,
            shape,
        });
    }

    Ok(resolved)
}

/// Finds the field `name` of `structural`, descending into flattened members
/// in declaration order. Serialization keys are not required.
///
/// ## Errors
/// Resolution errors of the visited field types and flattened structs, and
/// `SimplegenError::FlattenTooDeep` for runaway nesting.
pub fn find_field(
    index: &DeclarationIndex,
    structural: &StructuralType,
    name: &str,
) -> Result<Option<FieldPath>> {
    find_nested(index, structural, name, 0)
}

fn find_nested(
    index: &DeclarationIndex,
    structural: &StructuralType,
    name: &str,
    depth: usize,
) -> Result<Option<FieldPath>> {
    let resolver = structural.resolver();

    for field in &structural.fields.named {
        let member = field_name(field);
        if is_flattened(field) {
            let inner = flattened_struct(index, &resolver, structural, field, depth)?;
            if let Some(mut found) = find_nested(index, &inner, name, depth + 1)? {
                found.access = format!("{member}.{}", found.access);
                return Ok(Some(found));
            }
        } else if member == name {
            return Ok(Some(FieldPath {
                access: member,
                shape: resolver.resolve(&field.ty)?,
            }));
        }
    }

    Ok(None)
}

fn field_name(field: &Field) -> String {
    field
        .ident
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default()
}

/// Whether a field is marked `#[serde(flatten)]`.
fn is_flattened(field: &Field) -> bool {
    field
        .attrs
        .iter()
        .filter(|attr| attr.path().is_ident("serde"))
        .filter_map(|attr| attr.meta.require_list().ok())
        .any(|list| {
            list.tokens
                .clone()
                .into_iter()
                .any(|tt| matches!(tt, TokenTree::Ident(ident) if ident == "flatten"))
        })
}

/// Looks up the struct a flattened member refers to.
fn flattened_struct(
    index: &DeclarationIndex,
    resolver: &Resolver<'_>,
    outer: &StructuralType,
    field: &Field,
    depth: usize,
) -> Result<StructuralType> {
    if depth >= MAX_FLATTEN_DEPTH {
        return Err(SimplegenError::FlattenTooDeep {
            package: outer.package.path.to_string(),
            type_name: outer.name.clone(),
        });
    }

    let shape = resolver.resolve(&field.ty)?;
    // `Box<Common>` flattens like `Common`.
    let shape = match shape {
        TypeShape::Pointer { target, .. } => *target,
        other => other,
    };
    index.structural_type_of(&shape, &outer.package.path)
}
