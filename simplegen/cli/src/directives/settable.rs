//! `simplegen:settable-input`: tracks which input fields were explicitly set.
//!
//! For every annotated struct a `<Name>Settable` mirror is generated with one
//! `Settable<T>` per serialized field (flattened members included), plus a
//! `to_settable` method that copies the values named in a decoded input map.

use handlebars::handlebars_helper;
use serde::Serialize;
use simplegen::{
    Annotation, BoxError, Declaration, DeclarationIndex, FieldDescriptor, Generated, Package,
    SpecData,
};

pub const NAME: &str = "settable-input";

pub const TEMPLATE: &str = r#"
/// A value that remembers whether it was provided.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct Settable<T> {
    pub value: Option<T>,
}

impl<T> Default for Settable<T> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<T> Settable<T> {
    pub fn new(value: T) -> Self {
        Self { value: Some(value) }
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }
}

{{#each Specs}}
/// {{Name}}Settable mirrors {{Name}} with every field wrapped in `Settable`.
#[derive(Clone, Default, serde::Serialize)]
pub struct {{Name}}Settable {
{{#each Fields}}
    {{serde_rename key}}
    pub {{name}}: Settable<{{type_name}}>,
{{/each}}
}

impl {{Type}} {
    /// Copies the fields whose serialized key is present in `input_fields`.
    pub fn to_settable<V>(&self, input_fields: &HashMap<String, V>) -> {{Name}}Settable {
        let mut settable = {{Name}}Settable::default();
{{#each Fields}}
        if input_fields.contains_key("{{key}}") {
            settable.{{name}} = Settable::new(self.{{access}}.clone());
        }
{{/each}}
        settable
    }
}
{{/each}}
"#;

handlebars_helper!(serde_rename: |key: str| format!("#[serde(rename = {key:?})]"));

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SettableSpec {
    name: String,
    #[serde(rename = "Type")]
    type_path: String,
    fields: Vec<FieldDescriptor>,
}

pub fn generate(
    index: &DeclarationIndex,
    package: &Package,
    declaration: &Declaration,
    _annotation: &Annotation,
) -> Result<Generated, BoxError> {
    let structural = index.get_structural_type(package, &declaration.qualified_name())?;
    let mut resolved = index.resolve_fields(&structural, package)?;
    let type_path = structural.shape().describe(&package.path, &mut resolved.imports);

    let spec = SpecData::new(&SettableSpec {
        name: declaration.name.clone(),
        type_path,
        fields: resolved.fields,
    })?;
    Ok(Generated::new(spec)
        .with_imports(resolved.imports)
        .with_imports(["std::collections::HashMap"]))
}
