//! `simplegen:paginator`: a cursor-paginated list container per struct.
//!
//! The container only derives `Default`, so the annotated type needs no
//! trait implementations of its own.

use serde::Serialize;
use simplegen::{
    Annotation, BoxError, Declaration, DeclarationIndex, Generated, Package, SpecData, TypeShape,
};

pub const NAME: &str = "paginator";

pub const TEMPLATE: &str = r#"
{{#each Specs}}
/// {{Name}}ListPaginated represents {{Name}} list in a pagination container.
#[derive(Default)]
pub struct {{Name}}ListPaginated {
    pub current_cursor: Option<String>,
    pub next_cursor: Option<String>,
    pub results: Vec<{{Type}}>,
    is_paginated: bool,
    limit: usize,
    offset: usize,
}

impl {{Name}}ListPaginated {
    /// Returns an empty {{Name}} page positioned at `cursor`.
    pub fn new(cursor: Option<String>, limit: usize) -> Result<Self, ParseIntError> {
        let offset = match cursor.as_deref() {
            Some(cursor) => cursor.parse()?,
            None => 0,
        };
        Ok(Self {
            current_cursor: cursor,
            next_cursor: None,
            results: Vec::new(),
            is_paginated: limit > 0,
            limit,
            offset,
        })
    }

    pub fn is_paginated(&self) -> bool {
        self.is_paginated
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}
{{/each}}
"#;

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PaginatorSpec {
    name: String,
    /// Path to the annotated type from the generated module.
    #[serde(rename = "Type")]
    type_path: String,
}

pub fn generate(
    _index: &DeclarationIndex,
    package: &Package,
    declaration: &Declaration,
    _annotation: &Annotation,
) -> Result<Generated, BoxError> {
    let mut imports = Vec::new();
    let type_path = TypeShape::declared(package, declaration).describe(&package.path, &mut imports);
    let spec = SpecData::new(&PaginatorSpec {
        name: declaration.name.clone(),
        type_path,
    })?;
    Ok(Generated::new(spec)
        .with_imports(imports)
        .with_imports(["std::num::ParseIntError"]))
}
