//! Annotation scanning.
//!
//! Walks the documentation of every declaration in the requested packages
//! and pairs each annotation line with the directives it names. Relies on
//! the copy-down pass having run at load time (see
//! [`copy_down`](crate::package::docs::copy_down)), which every tree handed
//! out by the index has.

use std::rc::Rc;

use tracing::debug;

use crate::index::DeclarationIndex;
use crate::package::{Declaration, Package};
use crate::registry::DirectiveRegistry;

/// One annotation line, as seen by one directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub directive: String,
    /// The whole documentation line, trimmed.
    pub text: String,
    /// Everything after `<marker>:<directive>`, trimmed.
    pub arguments: String,
}

impl Annotation {
    pub fn new(marker: &str, directive: &str, text: &str) -> Self {
        let text = text.trim();
        let qualified = format!("{marker}:{directive}");
        let arguments = text
            .find(&qualified)
            .map(|at| &text[at + qualified.len()..])
            .or_else(|| text.find(directive).map(|at| &text[at + directive.len()..]))
            .unwrap_or_default()
            .trim();

        Self {
            directive: directive.to_string(),
            text: text.to_string(),
            arguments: arguments.to_string(),
        }
    }

    /// Arguments split on whitespace.
    pub fn args(&self) -> Vec<&str> {
        self.arguments.split_whitespace().collect()
    }
}

/// An annotated declaration paired with a directive.
#[derive(Debug, Clone)]
pub struct Match {
    pub directive: String,
    pub package: Rc<Package>,
    pub declaration: Declaration,
    pub annotation: Annotation,
}

/// Finds every `(directive, declaration)` pair in the requested packages.
///
/// Packages are visited in request order and declarations in source order;
/// within a line, directives fire in registration order. Every registered
/// directive whose name occurs in a line containing `marker` matches.
pub fn scan(index: &DeclarationIndex, registry: &DirectiveRegistry, marker: &str) -> Vec<Match> {
    let mut matches = Vec::new();

    for package in index.packages() {
        for declaration in &package.declarations {
            for line in declaration.docs.iter().filter(|line| line.contains(marker)) {
                for directive in registry.matching(line) {
                    debug!(
                        directive = %directive.name,
                        package = %package.path,
                        declaration = %declaration.name,
                        "annotation matched"
                    );
                    matches.push(Match {
                        directive: directive.name.clone(),
                        package: Rc::clone(&package),
                        declaration: declaration.clone(),
                        annotation: Annotation::new(marker, &directive.name, line),
                    });
                }
            }
        }
    }

    matches
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::config::GeneratorConfig;
    use crate::error::BoxError;
    use crate::registry::{Generated, SpecData};

    fn noop(
        _: &DeclarationIndex,
        _: &Package,
        _: &Declaration,
        _: &Annotation,
    ) -> Result<Generated, BoxError> {
        Ok(Generated::new(SpecData::new(&())?))
    }

    fn registry() -> DirectiveRegistry {
        DirectiveRegistry::new()
            .register("paginator", "", noop)
            .register("settable-input", "", noop)
    }

    #[test]
    fn annotation_arguments_follow_the_directive() {
        let annotation = Annotation::new(
            "simplegen",
            "sort-by-keys",
            "  simplegen:sort-by-keys --type Vec<User> --suffix ByID ",
        );
        assert_eq!(annotation.text, "simplegen:sort-by-keys --type Vec<User> --suffix ByID");
        assert_eq!(annotation.arguments, "--type Vec<User> --suffix ByID");
        assert_eq!(annotation.args(), vec!["--type", "Vec<User>", "--suffix", "ByID"]);

        let bare = Annotation::new("simplegen", "paginator", "simplegen:paginator");
        assert!(bare.args().is_empty());
    }

    #[test]
    fn scan_orders_matches_and_copies_block_docs() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        fs::write(
            root.join("models.rs"),
            r#"
/// simplegen:paginator
/// simplegen:settable-input
pub struct User { }

/// Not annotated.
pub struct Plain { }

/// simplegen:paginator
mod grouped {
    pub struct Order { }
    /// Own docs win.
    pub struct Skipped { }
}

/// paginator without the marker
pub struct Mentioned { }
"#,
        )?;
        fs::write(root.join("other.rs"), "/// simplegen:paginator\npub struct Post { }\n")?;

        let index = DeclarationIndex::load(GeneratorConfig::with_source_root(root), ["other", "models"])?;
        let matches = scan(&index, &registry(), "simplegen");

        let seen: Vec<(&str, &str)> = matches
            .iter()
            .map(|m| (m.directive.as_str(), m.declaration.name.as_str()))
            .collect();
        assert_eq!(
            seen,
            vec![
                ("paginator", "Post"),
                ("paginator", "User"),
                ("settable-input", "User"),
                ("paginator", "Order"),
            ]
        );
        assert_eq!(matches[0].package.path.to_string(), "crate::other");
        Ok(())
    }

    #[test]
    fn one_line_may_fire_several_directives() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        fs::write(
            root.join("models.rs"),
            "/// simplegen:paginator simplegen:settable-input\npub struct User { }\n",
        )?;

        let index = DeclarationIndex::load(GeneratorConfig::with_source_root(root), ["models"])?;
        let matches = scan(&index, &registry(), "simplegen");
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[1].annotation.directive, "settable-input");
        Ok(())
    }
}
