//! Wire types for the shop backend API.
//!
//! Payload shapes mirror the backend exactly; renames pin the JSON names
//! (`_id`, `type`, camelCase bodies) so compatibility survives refactors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use voltbook_core::{NotificationId, ProductId};

use crate::cart::{CartKey, VariationSelection};
use crate::catalog::Product;

/// Envelope for `GET /api/product/list` and `GET /api/product/available`.
#[derive(Debug, Deserialize)]
pub struct ProductListResponse {
    /// Whether the backend accepted the request.
    pub success: bool,
    /// Catalog snapshot; absent on failure.
    #[serde(default)]
    pub products: Vec<Product>,
}

/// Envelope for `POST /api/cart/get`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    /// Whether the backend accepted the request.
    pub success: bool,
    /// The authoritative remote cart, keyed identically to the local cart.
    #[serde(default)]
    pub cart_data: IndexMap<CartKey, RemoteCartLine>,
}

/// A cart line as the backend stores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCartLine {
    /// The referenced product.
    pub item_id: ProductId,
    /// Line quantity.
    pub quantity: u32,
    /// The configuration the customer picked.
    #[serde(default)]
    pub variations: VariationSelection,
}

/// Body for `POST /api/cart/add`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItem<'a> {
    /// The referenced product.
    pub item_id: &'a ProductId,
    /// Quantity delta being added.
    pub quantity: u32,
    /// The configuration the customer picked.
    pub variations: &'a VariationSelection,
}

/// Body for `POST /api/cart/update`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartItem<'a> {
    /// Key of the line being updated.
    pub cart_item_key: &'a str,
    /// Absolute target quantity (zero removes the line).
    pub quantity: u32,
}

/// Minimal `{ success }` acknowledgement for cart mutations.
#[derive(Debug, Deserialize)]
pub struct Ack {
    /// Whether the backend accepted the mutation.
    pub success: bool,
}

/// Response for `GET /api/popup`.
#[derive(Debug, Deserialize)]
pub struct PopupResponse {
    /// Current popup message.
    pub popup: String,
}

/// Body for `PUT /api/popup` (admin only).
#[derive(Debug, Serialize)]
pub struct PopupUpdate<'a> {
    /// New popup message.
    pub message: &'a str,
}

/// An active site notification. Display-only; no dismissal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Notification ID.
    #[serde(rename = "_id")]
    pub id: NotificationId,
    /// Message to display.
    pub message: String,
    /// Severity tag (e.g., "info", "warning").
    #[serde(rename = "type")]
    pub kind: String,
    /// Whether the notification is currently active.
    pub is_active: bool,
}
