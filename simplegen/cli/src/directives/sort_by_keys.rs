//! `simplegen:sort-by-keys`: reorder a list of structs to follow a key list.
//!
//! ```text
//! /// simplegen:sort-by-keys --type models::User
//! /// simplegen:sort-by-keys --type Vec<models::User> --suffix ByRole --field-name role_id
//! ```
//!
//! A plain `--type` yields one `Option<T>` per key (the first match); a
//! `Vec<T>` wrapper yields every match per key instead. The key field may
//! sit behind `#[serde(flatten)]` members.

use clap::Parser;
use handlebars::handlebars_helper;
use heck::ToSnakeCase;
use serde::Serialize;
use simplegen::fields::shape::{PointerKind, Resolver, SequenceKind};
use simplegen::fields::FieldPath;
use simplegen::{
    Annotation, BoxError, Declaration, DeclarationIndex, Generated, Package, SpecData, TypeShape,
};

pub const NAME: &str = "sort-by-keys";

pub const TEMPLATE: &str = r#"
{{#each Specs}}
{{#if Grouped}}
/// Groups `values` by `{{FieldName}}`, one group per key, in key order.
pub fn {{snake_case Name}}_list{{#if Suffix}}_{{snake_case Suffix}}{{/if}}_sort_by_keys(values: &[{{Element}}], keys: &[{{FieldType}}]) -> Vec<Vec<{{Element}}>> {
    keys.iter()
        .map(|key| {
            values
                .iter()
                .filter(|v| {{#if FieldIsOptional}}v.{{FieldAccess}}.as_ref() == Some(key){{else}}&v.{{FieldAccess}} == key{{/if}})
                .cloned()
                .collect()
        })
        .collect()
}
{{else}}
/// Picks the first of `values` matching each key on `{{FieldName}}`, in key order.
pub fn {{snake_case Name}}_list{{#if Suffix}}_{{snake_case Suffix}}{{/if}}_sort_by_keys(values: &[{{Element}}], keys: &[{{FieldType}}]) -> Vec<Option<{{Element}}>> {
    keys.iter()
        .map(|key| {
            values
                .iter()
                .find(|v| {{#if FieldIsOptional}}v.{{FieldAccess}}.as_ref() == Some(key){{else}}&v.{{FieldAccess}} == key{{/if}})
                .cloned()
        })
        .collect()
}
{{/if}}
{{/each}}
"#;

handlebars_helper!(snake_case: |s: str| s.to_snake_case());

/// Arguments of one `sort-by-keys` annotation.
#[derive(Debug, Parser)]
#[command(name = "sort-by-keys", no_binary_name = true)]
struct SortByKeysArgs {
    /// Element type, optionally wrapped in `Vec<..>` to group matches
    #[arg(long = "type", value_name = "TYPE")]
    type_name: String,

    /// Appended to the generated function name
    #[arg(long, default_value = "")]
    suffix: String,

    /// Field compared against the keys
    #[arg(long, default_value = "id")]
    field_name: String,

    /// Key type
    #[arg(long, default_value = "i64")]
    field_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SortByKeysSpec {
    name: String,
    suffix: String,
    element: String,
    grouped: bool,
    field_name: String,
    /// Access path of the key field, through flattened members.
    field_access: String,
    field_type: String,
    field_is_optional: bool,
}

pub fn generate(
    index: &DeclarationIndex,
    package: &Package,
    declaration: &Declaration,
    annotation: &Annotation,
) -> Result<Generated, BoxError> {
    let args = SortByKeysArgs::try_parse_from(annotation.args())?;

    let ty: syn::Type = syn::parse_str(&args.type_name)
        .map_err(|e| format!("--type `{}` is not a Rust type: {e}", args.type_name))?;
    let shape = Resolver::within(package, &declaration.scope, &syn::Generics::default()).resolve(&ty)?;

    let (element, grouped) = match shape {
        TypeShape::Sequence {
            kind: SequenceKind::Collection(ref collection),
            element,
        } if collection == "Vec" => (*element, true),
        other => (other, false),
    };

    let TypeShape::Named { name, .. } = &element else {
        return Err(format!("--type must name a struct, got `{}`", args.type_name).into());
    };
    let name = name.clone();

    let structural = index.structural_type_of(&element, &package.path)?;
    let FieldPath { access, shape } = index
        .find_field(&structural, &args.field_name)?
        .ok_or_else(|| format!("`{name}` has no field `{}`", args.field_name))?;
    let field_is_optional = matches!(
        shape,
        TypeShape::Pointer {
            kind: PointerKind::Option,
            ..
        }
    );

    let mut imports = Vec::new();
    let element_text = element.describe(&package.path, &mut imports);

    let spec = SpecData::new(&SortByKeysSpec {
        name,
        suffix: args.suffix,
        element: element_text,
        grouped,
        field_name: args.field_name,
        field_access: access,
        field_type: args.field_type,
        field_is_optional,
    })?;
    Ok(Generated::new(spec).with_imports(imports))
}
