//! Client-side cart store.
//!
//! The cart is an insertion-ordered map from [`CartKey`] to [`CartLine`].
//! Mutations validate stock and availability before touching the map, and
//! every successful mutation swaps in a whole new map (copy-on-write via
//! `arc-swap`), so readers computing totals never observe a
//! partially-updated cart. Entry points run on a single UI event loop; the
//! store does not serialize concurrent writers.

pub mod key;

use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use voltbook_core::ProductId;

use crate::catalog::{CatalogCache, Product};

pub use key::{CartKey, VariationSelection};

/// Errors from local cart mutations.
///
/// A failed mutation leaves the cart map untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Product is not purchasable at all.
    #[error("product is out of stock")]
    OutOfStock,

    /// Requested quantity exceeds the product's stock cap.
    #[error("insufficient stock: only {available} available")]
    InsufficientStock {
        /// The product's stock cap.
        available: u32,
    },

    /// Referenced product is missing from the catalog cache.
    #[error("product not found: {0}")]
    NotFound(ProductId),

    /// Referenced cart line does not exist.
    #[error("no cart line with key {0}")]
    LineNotFound(CartKey),
}

/// A line in the cart: one product in one specific configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// The product this line references.
    pub product_id: ProductId,
    /// How many of it, always positive.
    pub quantity: u32,
    /// The configuration the customer picked.
    pub selection: VariationSelection,
}

/// Insertion-ordered cart map.
pub type CartLines = IndexMap<CartKey, CartLine>;

/// The cart store.
pub struct CartStore {
    lines: ArcSwap<CartLines>,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStore {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: ArcSwap::from_pointee(IndexMap::new()),
        }
    }

    /// Current snapshot of the cart map, in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Arc<CartLines> {
        self.lines.load_full()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn line_count(&self) -> u32 {
        self.lines.load().values().map(|line| line.quantity).sum()
    }

    /// Add `quantity` of a product in the given configuration.
    ///
    /// Merges into an existing line when the same configuration is already
    /// in the cart.
    ///
    /// # Errors
    ///
    /// `OutOfStock` when the product is not purchasable;
    /// `InsufficientStock` when the resulting line quantity would exceed the
    /// product's stock cap.
    pub fn add_line(
        &self,
        product: &Product,
        quantity: u32,
        selection: VariationSelection,
    ) -> Result<CartKey, CartError> {
        if !product.in_stock {
            return Err(CartError::OutOfStock);
        }

        let key = CartKey::new(&product.id, &selection);
        let current = self.lines.load();
        let existing = current.get(&key).map_or(0, |line| line.quantity);
        let total = existing.saturating_add(quantity);

        if let Some(cap) = product.stock
            && total > cap
        {
            return Err(CartError::InsufficientStock { available: cap });
        }

        let mut next: CartLines = (**current).clone();
        next.entry(key.clone())
            .and_modify(|line| line.quantity = total)
            .or_insert_with(|| CartLine {
                product_id: product.id.clone(),
                quantity,
                selection,
            });
        self.lines.store(Arc::new(next));

        Ok(key)
    }

    /// Set a line's quantity. Zero removes the line entirely.
    ///
    /// `product` is the line's product as currently cached; it is only
    /// consulted for positive quantities, where the stock cap is
    /// re-validated exactly as in [`Self::add_line`].
    ///
    /// # Errors
    ///
    /// `LineNotFound` when the key is not in the cart; `NotFound` when the
    /// quantity is positive but the product is gone from the catalog;
    /// `InsufficientStock` when the new quantity exceeds the cap.
    pub fn set_quantity(
        &self,
        key: &CartKey,
        quantity: u32,
        product: Option<&Product>,
    ) -> Result<(), CartError> {
        let current = self.lines.load();
        let Some(line) = current.get(key) else {
            return Err(CartError::LineNotFound(key.clone()));
        };

        if quantity == 0 {
            let mut next: CartLines = (**current).clone();
            next.shift_remove(key);
            self.lines.store(Arc::new(next));
            return Ok(());
        }

        let product = product.ok_or_else(|| CartError::NotFound(line.product_id.clone()))?;
        if let Some(cap) = product.stock
            && quantity > cap
        {
            return Err(CartError::InsufficientStock { available: cap });
        }

        let mut next: CartLines = (**current).clone();
        if let Some(line) = next.get_mut(key) {
            line.quantity = quantity;
        }
        self.lines.store(Arc::new(next));

        Ok(())
    }

    /// Replace the whole cart (remote pull on login).
    pub fn replace(&self, lines: CartLines) {
        self.lines.store(Arc::new(lines));
    }

    /// Empty the cart.
    pub fn clear(&self) {
        self.lines.store(Arc::new(IndexMap::new()));
    }

    /// Keys whose product is missing from the catalog or no longer in
    /// stock.
    ///
    /// Such lines stay in the map (the display keeps showing them) but are
    /// excluded from totals; callers surface them as "item became
    /// unavailable" warnings.
    #[must_use]
    pub fn stale_keys(&self, catalog: &CatalogCache) -> Vec<CartKey> {
        self.lines
            .load()
            .iter()
            .filter(|(_, line)| {
                catalog
                    .get(&line.product_id)
                    .is_none_or(|product| !product.in_stock)
            })
            .map(|(key, _)| key.clone())
            .collect()
    }
}
