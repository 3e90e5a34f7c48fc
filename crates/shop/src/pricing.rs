//! Variant price resolution.
//!
//! A product may legally define more than one variation pricing scheme.
//! Precedence is fixed and evaluated top-down, first match wins, so a line's
//! unit price is deterministic: wrap add-on, then matching size, then base
//! price.

use tracing::warn;
use voltbook_core::Price;

use crate::cart::VariationSelection;
use crate::catalog::Product;

/// Resolve the unit price for a product given a line's selection.
///
/// A selected size with no matching entry in the product's size list falls
/// back to the base price; the mismatch is logged because it usually means
/// the catalog changed under an open cart.
#[must_use]
pub fn resolve(product: &Product, selection: &VariationSelection) -> Price {
    let variations = product.variations.as_ref();

    if selection.wrap
        && let Some(wrap) = variations.and_then(|v| v.wrap.as_ref())
        && wrap.available
    {
        return wrap.price;
    }

    if let Some(size) = selection.size.as_deref() {
        if let Some(entry) = variations
            .and_then(|v| v.sizes.as_ref())
            .and_then(|sizes| sizes.iter().find(|s| s.size == size))
        {
            return entry.price;
        }
        warn!(
            product = %product.id,
            size,
            "selected size not defined for product, falling back to base price"
        );
    }

    product.base_price
}
