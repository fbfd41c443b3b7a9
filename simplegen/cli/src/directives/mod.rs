//! The directives shipped with the `simplegen` binary.

pub mod paginator;
pub mod settable;
pub mod sort_by_keys;

use simplegen::{DirectiveRegistry, TemplateHelpers};

/// Every bundled directive, in a fixed order.
pub fn registry() -> DirectiveRegistry {
    DirectiveRegistry::new()
        .register(paginator::NAME, paginator::TEMPLATE, paginator::generate)
        .register(settable::NAME, settable::TEMPLATE, settable::generate)
        .register(sort_by_keys::NAME, sort_by_keys::TEMPLATE, sort_by_keys::generate)
}

/// Template helpers the bundled templates rely on.
pub fn helpers() -> TemplateHelpers {
    TemplateHelpers::new()
        .with("serde_rename", settable::serde_rename)
        .with("snake_case", sort_by_keys::snake_case)
}
