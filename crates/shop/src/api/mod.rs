//! HTTP client for the shop backend API.
//!
//! Thin JSON-over-HTTP client built on `reqwest` with a fixed per-request
//! timeout. Paths and payload shapes mirror the backend exactly;
//! authenticated endpoints pass the session token in a `token` header.

pub mod types;

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use indexmap::IndexMap;

use crate::cart::CartKey;
use crate::catalog::Product;

use types::{
    Ack, AddCartItem, CartResponse, Notification, PopupResponse, PopupUpdate,
    ProductListResponse, RemoteCartLine, UpdateCartItem,
};

/// Errors from backend API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure, including the request timeout.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected shape.
    #[error("response parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Backend answered with a non-success HTTP status.
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    /// Backend envelope carried `success: false`.
    #[error("request rejected by backend")]
    Rejected,
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the shop backend.
///
/// Cheaply cloneable; all clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the given backend base URL.
    ///
    /// `timeout` applies to every request; a timed-out call surfaces as
    /// `ApiError::Http` like any other transport failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: base_url.as_str().trim_end_matches('/').to_string(),
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Decode a response, surfacing non-2xx statuses and parse failures.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }

        // Read the body as text first for better error diagnostics.
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.inner.client.get(self.url(path)).send().await?;
        Self::decode(response).await
    }

    async fn post_authed<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &SecretString,
    ) -> Result<T, ApiError> {
        let response = self
            .inner
            .client
            .post(self.url(path))
            .header("token", token.expose_secret())
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn post_json_authed<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &SecretString,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let response = self
            .inner
            .client
            .post(self.url(path))
            .header("token", token.expose_secret())
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Fetch the full catalog (admin console view).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        let response: ProductListResponse = self.get_json("/api/product/list").await?;
        if !response.success {
            return Err(ApiError::Rejected);
        }
        debug!(count = response.products.len(), "fetched full catalog");
        Ok(response.products)
    }

    /// Fetch the storefront-visible catalog subset.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self))]
    pub async fn available_products(&self) -> Result<Vec<Product>, ApiError> {
        let response: ProductListResponse = self.get_json("/api/product/available").await?;
        if !response.success {
            return Err(ApiError::Rejected);
        }
        debug!(count = response.products.len(), "fetched storefront catalog");
        Ok(response.products)
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Fetch the authoritative remote cart for this session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, token))]
    pub async fn get_cart(
        &self,
        token: &SecretString,
    ) -> Result<IndexMap<CartKey, RemoteCartLine>, ApiError> {
        let response: CartResponse = self.post_authed("/api/cart/get", token).await?;
        if !response.success {
            return Err(ApiError::Rejected);
        }
        Ok(response.cart_data)
    }

    /// Mirror an add mutation to the remote cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, token, item))]
    pub async fn add_cart_item(
        &self,
        token: &SecretString,
        item: &AddCartItem<'_>,
    ) -> Result<(), ApiError> {
        let ack: Ack = self.post_json_authed("/api/cart/add", token, item).await?;
        if ack.success { Ok(()) } else { Err(ApiError::Rejected) }
    }

    /// Mirror a quantity change to the remote cart (absolute quantity).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, token), fields(key = %key))]
    pub async fn update_cart_item(
        &self,
        token: &SecretString,
        key: &CartKey,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let body = UpdateCartItem {
            cart_item_key: key.as_str(),
            quantity,
        };
        let ack: Ack = self.post_json_authed("/api/cart/update", token, &body).await?;
        if ack.success { Ok(()) } else { Err(ApiError::Rejected) }
    }

    /// Empty the remote cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, token))]
    pub async fn clear_cart(&self, token: &SecretString) -> Result<(), ApiError> {
        let ack: Ack = self.post_authed("/api/cart/clear", token).await?;
        if ack.success { Ok(()) } else { Err(ApiError::Rejected) }
    }

    // =========================================================================
    // Popup & Notification Methods
    // =========================================================================

    /// Fetch the current popup message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_popup(&self) -> Result<String, ApiError> {
        let response: PopupResponse = self.get_json("/api/popup").await?;
        Ok(response.popup)
    }

    /// Replace the popup message (admin only).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, token, message))]
    pub async fn update_popup(&self, token: &SecretString, message: &str) -> Result<(), ApiError> {
        let response = self
            .inner
            .client
            .put(self.url("/api/popup"))
            .header("token", token.expose_secret())
            .json(&PopupUpdate { message })
            .send()
            .await?;
        let ack: Ack = Self::decode(response).await?;
        if ack.success { Ok(()) } else { Err(ApiError::Rejected) }
    }

    /// Fetch active site notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_notifications(&self) -> Result<Vec<Notification>, ApiError> {
        self.get_json("/api/notification").await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let base = Url::parse("https://api.voltbook.example/").unwrap();
        let client = ApiClient::new(&base, Duration::from_secs(10)).unwrap();
        assert_eq!(
            client.url("/api/product/list"),
            "https://api.voltbook.example/api/product/list"
        );
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Rejected;
        assert_eq!(err.to_string(), "request rejected by backend");

        let err = ApiError::Status(reqwest::StatusCode::BAD_GATEWAY);
        assert_eq!(err.to_string(), "unexpected status 502 Bad Gateway");
    }
}
