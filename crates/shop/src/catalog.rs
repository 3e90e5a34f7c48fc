//! Product catalog cache.
//!
//! Holds the last-fetched product list for price and stock lookups. The
//! cart engine only reads it; catalog refreshes replace the whole snapshot
//! atomically, so lookups never see a half-applied refresh.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use voltbook_core::{Price, ProductId};

// =============================================================================
// Domain Types
// =============================================================================

/// A discrete size choice with its own price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeOption {
    /// Size label (e.g., "13-inch").
    pub size: String,
    /// Unit price when this size is selected.
    pub price: Price,
}

/// The premium wrap add-on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrapOption {
    /// Whether the add-on can currently be chosen.
    pub available: bool,
    /// Unit price when the add-on is chosen.
    pub price: Price,
}

/// Variation schema for a product.
///
/// A product may define any combination of these; pricing precedence across
/// them is fixed in [`crate::pricing`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variations {
    /// Discrete sizes, each with its own price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Vec<SizeOption>>,
    /// Premium wrap add-on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrap: Option<WrapOption>,
    /// Free-form option groups keyed by group name (`ram`, `storage`,
    /// `cpu`, `gpu`, ...). Choices here do not affect pricing.
    #[serde(flatten)]
    pub groups: BTreeMap<String, Vec<String>>,
}

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product ID.
    #[serde(rename = "_id")]
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Plain-text description.
    #[serde(default)]
    pub description: String,
    /// Price before any variation pricing applies.
    pub base_price: Price,
    /// Whether the product is purchasable at all.
    pub in_stock: bool,
    /// Per-line quantity cap, when the product tracks one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    /// Variation schema, when the product has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variations: Option<Variations>,
}

// =============================================================================
// CatalogCache
// =============================================================================

/// One immutable catalog snapshot with an index by product ID.
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    products: Vec<Product>,
    by_id: HashMap<ProductId, usize>,
}

impl CatalogSnapshot {
    fn new(products: Vec<Product>) -> Self {
        let by_id = products
            .iter()
            .enumerate()
            .map(|(index, product)| (product.id.clone(), index))
            .collect();
        Self { products, by_id }
    }

    /// Look up a product by ID.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.by_id.get(id).and_then(|&index| self.products.get(index))
    }

    /// Products in fetch order, for display.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Whether the snapshot holds no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Number of products in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }
}

/// Holds the last-fetched catalog; replaced wholesale on refresh.
pub struct CatalogCache {
    inner: ArcSwap<CatalogSnapshot>,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: ArcSwap::from_pointee(CatalogSnapshot::default()),
        }
    }

    /// Replace the snapshot wholesale with a freshly fetched list.
    pub fn replace(&self, products: Vec<Product>) {
        self.inner.store(Arc::new(CatalogSnapshot::new(products)));
    }

    /// Drop all products (used when a refresh fails, so stale prices and
    /// stock are never consulted).
    pub fn clear(&self) {
        self.replace(Vec::new());
    }

    /// Clone of the product with this ID, if present.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<Product> {
        self.inner.load().get(id).cloned()
    }

    /// Current snapshot, for display iteration.
    #[must_use]
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.inner.load_full()
    }

    /// Whether the cache holds no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.load().is_empty()
    }
}
