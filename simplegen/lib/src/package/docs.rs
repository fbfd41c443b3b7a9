//! Documentation extraction and the block-level copy-down pass.
//!
//! Documentation written on an inline `mod name { .. }` block describes the
//! type declarations grouped inside it. The parser attaches it to the module
//! item only, so before any declaration is matched against directives the
//! loader runs [`copy_down`] over every freshly parsed tree: each direct child
//! `struct`, `enum`, `union` or `type` item without documentation of its own
//! receives a copy of the block's doc attributes.

use syn::visit_mut::{self, VisitMut};
use syn::{Attribute, Expr, ExprLit, Item, Lit, Meta};

/// Returns the documentation lines of an attribute list, trimmed.
///
/// Block doc comments spanning several lines are split, empty lines dropped.
pub fn doc_lines(attrs: &[Attribute]) -> Vec<String> {
    attrs
        .iter()
        .filter_map(doc_text)
        .flat_map(|text| {
            text.lines()
                .map(|line| line.trim().trim_start_matches('*').trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|line| !line.is_empty())
        .collect()
}

fn doc_text(attr: &Attribute) -> Option<String> {
    if !attr.path().is_ident("doc") {
        return None;
    }
    match &attr.meta {
        Meta::NameValue(nv) => match &nv.value {
            Expr::Lit(ExprLit {
                lit: Lit::Str(s), ..
            }) => Some(s.value()),
            _ => None,
        },
        _ => None,
    }
}

fn is_doc(attr: &Attribute) -> bool {
    attr.path().is_ident("doc")
}

/// Copies block-level documentation down to undocumented member declarations.
///
/// Runs over nested inline modules as well; each block only feeds its direct
/// children, matching how the documentation was written.
pub fn copy_down(file: &mut syn::File) {
    CopyDown.visit_file_mut(file);
}

struct CopyDown;

impl VisitMut for CopyDown {
    fn visit_item_mod_mut(&mut self, module: &mut syn::ItemMod) {
        let block_docs: Vec<Attribute> = module.attrs.iter().filter(|a| is_doc(a)).cloned().collect();

        if !block_docs.is_empty()
            && let Some((_, items)) = module.content.as_mut()
        {
            for item in items.iter_mut() {
                if let Some(attrs) = type_item_attrs(item)
                    && !attrs.iter().any(is_doc)
                {
                    attrs.extend(block_docs.iter().cloned());
                }
            }
        }

        visit_mut::visit_item_mod_mut(self, module);
    }
}

fn type_item_attrs(item: &mut Item) -> Option<&mut Vec<Attribute>> {
    match item {
        Item::Struct(s) => Some(&mut s.attrs),
        Item::Enum(e) => Some(&mut e.attrs),
        Item::Union(u) => Some(&mut u.attrs),
        Item::Type(t) => Some(&mut t.attrs),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> syn::File {
        syn::parse_file(source).expect("fixture should parse")
    }

    fn struct_docs(items: &[Item], name: &str) -> Vec<String> {
        items
            .iter()
            .find_map(|item| match item {
                Item::Struct(s) if s.ident == name => Some(doc_lines(&s.attrs)),
                _ => None,
            })
            .unwrap_or_default()
    }

    fn module_items<'a>(file: &'a syn::File, name: &str) -> &'a [Item] {
        file.items
            .iter()
            .find_map(|item| match item {
                Item::Mod(m) if m.ident == name => m.content.as_ref().map(|(_, items)| items.as_slice()),
                _ => None,
            })
            .expect("module should exist")
    }

    #[test]
    fn doc_lines_trims_and_splits_blocks() {
        let file = parse(
            r#"
/// simplegen:paginator
///
/** first
 * second */
struct A;
"#,
        );
        let Item::Struct(s) = &file.items[0] else {
            panic!("expected struct");
        };
        assert_eq!(doc_lines(&s.attrs), vec!["simplegen:paginator", "first", "second"]);
    }

    #[test]
    fn copies_block_docs_to_undocumented_children() {
        let mut file = parse(
            r#"
/// simplegen:paginator
mod dto {
    pub struct Plain { }

    /// Own docs win
    pub struct Documented { }

    pub fn not_a_type() {}
}
"#,
        );
        copy_down(&mut file);

        let items = module_items(&file, "dto");
        assert_eq!(struct_docs(items, "Plain"), vec!["simplegen:paginator"]);
        assert_eq!(struct_docs(items, "Documented"), vec!["Own docs win"]);
    }

    #[test]
    fn nested_blocks_feed_only_direct_children() {
        let mut file = parse(
            r#"
/// outer
mod outer {
    mod inner {
        pub struct Deep { }
    }
    pub struct Shallow { }
}
"#,
        );
        copy_down(&mut file);

        let outer = module_items(&file, "outer");
        assert_eq!(struct_docs(outer, "Shallow"), vec!["outer"]);

        let inner = outer
            .iter()
            .find_map(|item| match item {
                Item::Mod(m) => m.content.as_ref().map(|(_, items)| items.as_slice()),
                _ => None,
            })
            .unwrap();
        assert!(struct_docs(inner, "Deep").is_empty());
    }
}
