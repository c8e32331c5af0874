//! Installer identifiers
//!
//! The upgrade code is name-based so every build of one product shares it and
//! upgrades in place. Everything else is random per build.

use uuid::Uuid;

/// Stable upgrade code derived from the product's reverse-DNS identifier
pub fn upgrade_code(identifier: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, identifier.as_bytes())
}

/// Fresh product code for one build
pub fn product_code() -> Uuid {
    Uuid::new_v4()
}

/// Fresh component identity token
pub fn component_guid() -> Uuid {
    Uuid::new_v4()
}

/// Fresh component element id, e.g. `Component_3f2a...`
pub fn component_id() -> String {
    prefixed_id("Component")
}

/// Fresh element id of the form `<prefix>_<32 hex digits>`
pub fn prefixed_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}
