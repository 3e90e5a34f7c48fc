//! Composite cart keys.
//!
//! A cart line's identity is the product plus the exact configuration the
//! customer picked: the same laptop with 32GB and with 64GB of RAM are two
//! separate lines with independent quantities. The key encoding is
//! canonical - option groups live in a `BTreeMap` and the named fields
//! serialize in a fixed order - so two selections that differ only in
//! property insertion order produce the same key.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use voltbook_core::ProductId;

/// The customer's chosen configuration for a product.
///
/// Mirrors whatever subset of the product's variation schema was picked: a
/// discrete size, the premium wrap add-on, and/or free-form option groups
/// (`ram`/`storage`/`cpu`/`gpu` for laptop builds, `base`/`side` for
/// simpler catalogs). Serializes to the wire as one flat JSON object, e.g.
/// `{"size":"15-inch","wrap":true,"ram":"32GB"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationSelection {
    /// Discrete size label, when the product defines sizes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Whether the premium wrap add-on was chosen.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub wrap: bool,
    /// Free-form option group choices, keyed by group name.
    #[serde(flatten)]
    pub options: BTreeMap<String, String>,
}

impl VariationSelection {
    /// A selection with nothing picked.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// A selection of a discrete size.
    #[must_use]
    pub fn for_size(label: impl Into<String>) -> Self {
        Self {
            size: Some(label.into()),
            ..Self::default()
        }
    }

    /// A selection with the wrap add-on chosen.
    #[must_use]
    pub fn with_wrap(mut self) -> Self {
        self.wrap = true;
        self
    }

    /// Add an option group choice.
    #[must_use]
    pub fn with_option(mut self, group: impl Into<String>, choice: impl Into<String>) -> Self {
        self.options.insert(group.into(), choice.into());
        self
    }

    /// Whether nothing was picked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size.is_none() && !self.wrap && self.options.is_empty()
    }

    /// Canonical JSON encoding used in cart keys and on the wire.
    fn canonical(&self) -> String {
        // Field order is fixed and `options` is ordered, so this is stable.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Deterministic identity of a `(product, variation selection)` pair.
///
/// The bare product ID when nothing was picked, otherwise
/// `<productId>::<canonical selection JSON>`. The remote cart uses the same
/// keys, so local and server state line up without translation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartKey(String);

impl CartKey {
    /// Build the key for a product and selection.
    #[must_use]
    pub fn new(product_id: &ProductId, selection: &VariationSelection) -> Self {
        if selection.is_empty() {
            Self(product_id.as_str().to_string())
        } else {
            Self(format!("{product_id}::{}", selection.canonical()))
        }
    }

    /// Get the underlying key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CartKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_selection_key_is_product_id() {
        let id = ProductId::new("p1");
        let key = CartKey::new(&id, &VariationSelection::none());
        assert_eq!(key.as_str(), "p1");
    }

    #[test]
    fn test_key_is_stable_under_option_insertion_order() {
        let id = ProductId::new("laptop-1");
        let a = VariationSelection::none()
            .with_option("ram", "32GB")
            .with_option("storage", "1TB")
            .with_option("cpu", "u9");
        let b = VariationSelection::none()
            .with_option("cpu", "u9")
            .with_option("storage", "1TB")
            .with_option("ram", "32GB");

        assert_eq!(CartKey::new(&id, &a), CartKey::new(&id, &b));
    }

    #[test]
    fn test_different_selections_produce_different_keys() {
        let id = ProductId::new("laptop-1");
        let a = VariationSelection::none().with_option("ram", "32GB");
        let b = VariationSelection::none().with_option("ram", "64GB");

        assert_ne!(CartKey::new(&id, &a), CartKey::new(&id, &b));
        assert_ne!(CartKey::new(&id, &a), CartKey::new(&id, &VariationSelection::none()));
    }

    #[test]
    fn test_wire_serialization_is_flat() {
        let selection = VariationSelection::for_size("15-inch")
            .with_wrap()
            .with_option("ram", "32GB");
        let json = serde_json::to_string(&selection).unwrap();
        assert_eq!(json, r#"{"size":"15-inch","wrap":true,"ram":"32GB"}"#);
    }

    #[test]
    fn test_wire_deserialization_round_trips() {
        let json = r#"{"ram":"32GB","size":"15-inch","wrap":true}"#;
        let selection: VariationSelection = serde_json::from_str(json).unwrap();
        assert_eq!(selection.size.as_deref(), Some("15-inch"));
        assert!(selection.wrap);
        assert_eq!(selection.options.get("ram").map(String::as_str), Some("32GB"));

        let unset: VariationSelection = serde_json::from_str("{}").unwrap();
        assert!(unset.is_empty());
    }
}
