//! Parsing of raw field tag strings.
//!
//! A tag string is a sequence of space separated `key:"value"` segments, for
//! example `json:"createdAt,omitempty" yaml:"created_at"`. Values are quoted
//! and may contain escaped quotes.
//!
//! rustc rejects unknown attributes on plain struct fields, so tags are
//! written behind a `cfg_attr` whose predicate never holds:
//!
//! ```ignore
//! pub struct User {
//!     #[cfg_attr(simplegen, tag = "json:\"id\" yaml:\"id\"")]
//!     pub id: i64,
//! }
//! ```
//!
//! Declare the cfg in the scanned crate's manifest to silence
//! `unexpected_cfgs`:
//!
//! ```toml
//! [lints.rust]
//! unexpected_cfgs = { level = "warn", check-cfg = ["cfg(simplegen)"] }
//! ```

use syn::punctuated::Punctuated;
use syn::{Attribute, Expr, ExprLit, Lit, Meta, Token};

/// Collects the raw tag string of a field.
///
/// Both `#[cfg_attr(<predicate>, <attribute> = "...")]` and the bare
/// `#[<attribute> = "..."]` are read. Several tags are joined with a single
/// space; a field without any yields an empty string.
pub fn raw_tag(attrs: &[Attribute], attribute: &str) -> String {
    attrs
        .iter()
        .flat_map(|attr| tag_values(attr, attribute))
        .collect::<Vec<_>>()
        .join(" ")
}

fn tag_values(attr: &Attribute, attribute: &str) -> Vec<String> {
    if attr.path().is_ident(attribute) {
        return match &attr.meta {
            Meta::NameValue(nv) => string_value(&nv.value).into_iter().collect(),
            _ => Vec::new(),
        };
    }
    if !attr.path().is_ident("cfg_attr") {
        return Vec::new();
    }

    // The first entry is the predicate, the rest are the gated attributes.
    attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)
        .map(|metas| {
            metas
                .into_iter()
                .skip(1)
                .filter_map(|meta| match meta {
                    Meta::NameValue(nv) if nv.path.is_ident(attribute) => string_value(&nv.value),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// The serialized name given by `#[serde(rename = "..")]` or
/// `#[serde(rename(serialize = ".."))]`.
pub fn serde_rename(attrs: &[Attribute]) -> Option<String> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("serde"))
        .filter_map(|attr| {
            attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)
                .ok()
        })
        .flatten()
        .find_map(|meta| match meta {
            Meta::NameValue(nv) if nv.path.is_ident("rename") => string_value(&nv.value),
            Meta::List(list) if list.path.is_ident("rename") => list
                .parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)
                .ok()?
                .into_iter()
                .find_map(|inner| match inner {
                    Meta::NameValue(nv) if nv.path.is_ident("serialize") => string_value(&nv.value),
                    _ => None,
                }),
            _ => None,
        })
}

fn string_value(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Some(s.value()),
        _ => None,
    }
}

/// Parses every well-formed `key:"value"` pair of a tag string, in order.
///
/// Parsing stops at the first malformed segment; pairs before it are kept.
pub fn parse_pairs(tag: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut rest = tag;

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }

        let Some(colon) = rest.find(':') else {
            break;
        };
        let key = &rest[..colon];
        if key.is_empty() || key.contains(|c: char| c.is_whitespace() || c == '"') {
            break;
        }

        let after = &rest[colon + 1..];
        let Some(quoted) = after.strip_prefix('"') else {
            break;
        };
        let Some((value, remaining)) = take_quoted(quoted) else {
            break;
        };

        pairs.push((key.to_string(), value));
        rest = remaining;
    }

    pairs
}

/// Reads a quoted value up to the closing quote, unescaping `\"` and `\\`.
fn take_quoted(input: &str) -> Option<(String, &str)> {
    let mut value = String::new();
    let mut chars = input.char_indices();

    while let Some((idx, c)) = chars.next() {
        match c {
            '"' => return Some((value, &input[idx + 1..])),
            '\\' => {
                let (_, escaped) = chars.next()?;
                value.push(escaped);
            }
            other => value.push(other),
        }
    }

    None
}

/// Returns the full value stored under `key`, options included.
pub fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Extracts the serialization key of a tag string.
///
/// `keys` are tried in priority order. For each, only the part before the
/// first comma counts; an empty name or the `skip` sentinel is treated as
/// absent and the next key is tried.
///
/// ```
/// use simplegen::fields::tags::serialization_key;
///
/// let keys = ["json".to_string(), "yaml".to_string()];
/// assert_eq!(serialization_key(r#"yaml:"phoneYaml" json:"phone""#, &keys, "-").as_deref(), Some("phone"));
/// assert_eq!(serialization_key(r#"yaml:"phoneYaml""#, &keys, "-").as_deref(), Some("phoneYaml"));
/// assert_eq!(serialization_key(r#"db:"phone""#, &keys, "-"), None);
/// ```
pub fn serialization_key(tag: &str, keys: &[String], skip: &str) -> Option<String> {
    let pairs = parse_pairs(tag);
    keys.iter().find_map(|key| {
        let value = lookup(&pairs, key)?;
        let name = value.split(',').next().unwrap_or_default();
        (!name.is_empty() && name != skip).then(|| name.to_string())
    })
}
