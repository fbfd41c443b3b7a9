//! Grouping of generator output by `(directive, package)`.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::package::{Package, PackagePath};
use crate::registry::SpecData;

/// Everything one output file is rendered from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GenerationGroup {
    #[serde(skip)]
    pub directive: String,
    pub package_path: PackagePath,
    pub package_name: String,
    /// Directory the output file is written to.
    #[serde(skip)]
    pub dir: PathBuf,
    /// Unique, in order of first appearance.
    pub imports: Vec<String>,
    /// In scan order.
    pub specs: Vec<SpecData>,
}

impl GenerationGroup {
    fn new(directive: &str, package: &Package) -> Self {
        Self {
            directive: directive.to_string(),
            package_path: package.path.clone(),
            package_name: package.name.clone(),
            dir: package.dir.clone(),
            imports: Vec::new(),
            specs: Vec::new(),
        }
    }

    fn merge_imports(&mut self, imports: Vec<String>) {
        for import in imports {
            if !import.is_empty() && !self.imports.contains(&import) {
                self.imports.push(import);
            }
        }
    }
}

/// Collects generator output into groups, preserving first-match order.
#[derive(Debug, Default)]
pub struct Aggregator {
    groups: Vec<GenerationGroup>,
    positions: HashMap<(String, PackagePath), usize>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one spec to the group of `(directive, package)`, creating the
    /// group on first use, and merges `imports` into it.
    pub fn record(&mut self, directive: &str, package: &Package, spec: SpecData, imports: Vec<String>) {
        let key = (directive.to_string(), package.path.clone());
        let position = match self.positions.get(&key) {
            Some(&position) => position,
            None => {
                self.groups.push(GenerationGroup::new(directive, package));
                self.positions.insert(key, self.groups.len() - 1);
                self.groups.len() - 1
            }
        };

        let group = &mut self.groups[position];
        group.specs.push(spec);
        group.merge_imports(imports);
    }

    pub fn groups(&self) -> &[GenerationGroup] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<GenerationGroup> {
        self.groups
    }
}
