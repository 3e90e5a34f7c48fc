//! The shop store: catalog, cart, pricing, and sync wired together.
//!
//! One `ShopStore` is constructed at app start and handed to whatever view
//! layer consumes it. Collaborators - the catalog cache, the sync adapter's
//! backend, and durable storage - are injected rather than reached through
//! ambient state, so the admin console, the storefront, and tests can all
//! share the same engine.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, warn};
use voltbook_core::{Price, ProductId};

use crate::api::{ApiClient, ApiError};
use crate::cart::{CartError, CartKey, CartLines, CartStore, VariationSelection};
use crate::catalog::{CatalogCache, Product};
use crate::config::{LoginCartPolicy, ShopConfig};
use crate::content::ContentService;
use crate::pricing;
use crate::storage::{JsonFileStore, LocalStore, StorageError, storage_keys};
use crate::sync::{CartBackend, RemoteSync, SessionState};

/// Errors building a [`ShopStore`] from configuration.
#[derive(Debug, Error)]
pub enum ShopInitError {
    /// HTTP client construction failed.
    #[error("api client init failed: {0}")]
    Api(#[from] ApiError),

    /// Durable storage could not be opened.
    #[error("storage init failed: {0}")]
    Storage(#[from] StorageError),
}

/// Shared state store behind the storefront and admin views.
pub struct ShopStore {
    api: ApiClient,
    catalog: CatalogCache,
    cart: CartStore,
    sync: RemoteSync,
    content: ContentService,
    storage: Arc<dyn LocalStore>,
    login_cart_policy: LoginCartPolicy,
}

impl ShopStore {
    /// Build the store and its collaborators from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the storage
    /// file cannot be opened.
    pub fn from_config(config: &ShopConfig) -> Result<Self, ShopInitError> {
        let api = ApiClient::new(&config.api_base_url, config.api_timeout)?;
        let storage: Arc<dyn LocalStore> = Arc::new(JsonFileStore::open(&config.storage_path)?);
        Ok(Self::new(api, storage, config.login_cart_policy))
    }

    /// Build the store with injected storage, syncing through the API
    /// client itself.
    #[must_use]
    pub fn new(
        api: ApiClient,
        storage: Arc<dyn LocalStore>,
        login_cart_policy: LoginCartPolicy,
    ) -> Self {
        let backend: Arc<dyn CartBackend> = Arc::new(api.clone());
        Self::with_backend(api, backend, storage, login_cart_policy)
    }

    /// Build the store against a specific cart backend (tests inject a
    /// double here).
    #[must_use]
    pub fn with_backend(
        api: ApiClient,
        backend: Arc<dyn CartBackend>,
        storage: Arc<dyn LocalStore>,
        login_cart_policy: LoginCartPolicy,
    ) -> Self {
        Self {
            catalog: CatalogCache::new(),
            cart: CartStore::new(),
            sync: RemoteSync::new(backend),
            content: ContentService::new(api.clone(), Arc::clone(&storage)),
            api,
            storage,
            login_cart_policy,
        }
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Refresh the storefront catalog snapshot.
    ///
    /// On failure the catalog is replaced with an empty snapshot so stale
    /// prices and stock are never consulted; every lookup then reports
    /// `NotFound`, which disables cart additions until a retry succeeds.
    ///
    /// # Errors
    ///
    /// Returns the fetch error after emptying the catalog.
    pub async fn refresh_catalog(&self) -> Result<(), ApiError> {
        match self.api.available_products().await {
            Ok(products) => {
                debug!(count = products.len(), "catalog refreshed");
                self.catalog.replace(products);
                Ok(())
            }
            Err(error) => {
                warn!(%error, "catalog refresh failed");
                self.catalog.clear();
                Err(error)
            }
        }
    }

    /// Refresh from the full product list (admin console view).
    ///
    /// # Errors
    ///
    /// Returns the fetch error after emptying the catalog.
    pub async fn refresh_full_catalog(&self) -> Result<(), ApiError> {
        match self.api.list_products().await {
            Ok(products) => {
                debug!(count = products.len(), "full catalog refreshed");
                self.catalog.replace(products);
                Ok(())
            }
            Err(error) => {
                warn!(%error, "full catalog refresh failed");
                self.catalog.clear();
                Err(error)
            }
        }
    }

    /// Read access to the catalog cache.
    #[must_use]
    pub fn catalog(&self) -> &CatalogCache {
        &self.catalog
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add a product to the cart in the given configuration.
    ///
    /// Returns the resolved product for UI confirmation messaging. The
    /// mutation is mirrored to the remote cart when a session is active;
    /// mirror failures never affect the local result.
    ///
    /// # Errors
    ///
    /// `NotFound` when the product is not in the catalog cache, otherwise
    /// the stock errors from [`CartStore::add_line`]. Failed additions
    /// leave the cart untouched.
    pub fn add_line(
        &self,
        product_id: &ProductId,
        quantity: u32,
        selection: VariationSelection,
    ) -> Result<Product, CartError> {
        let product = self
            .catalog
            .get(product_id)
            .ok_or_else(|| CartError::NotFound(product_id.clone()))?;

        self.cart.add_line(&product, quantity, selection.clone())?;
        self.sync.push_add(product.id.clone(), quantity, selection);

        Ok(product)
    }

    /// Set a line's quantity. Zero removes the line entirely.
    ///
    /// # Errors
    ///
    /// The validation errors from [`CartStore::set_quantity`]; failed
    /// updates leave the cart untouched.
    pub fn set_quantity(&self, key: &CartKey, quantity: u32) -> Result<(), CartError> {
        let product = self.line_product(key);
        self.cart.set_quantity(key, quantity, product.as_ref())?;
        self.sync.push_update(key.clone(), quantity);
        Ok(())
    }

    fn line_product(&self, key: &CartKey) -> Option<Product> {
        let snapshot = self.cart.snapshot();
        let line = snapshot.get(key)?;
        self.catalog.get(&line.product_id)
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn line_count(&self) -> u32 {
        self.cart.line_count()
    }

    /// Cart total over lines whose product is still purchasable.
    ///
    /// Lines whose product went missing or out of stock since they were
    /// added are skipped, not removed - the cart display stays intact while
    /// stale items never reach checkout. Surface them with
    /// [`Self::unavailable_lines`].
    #[must_use]
    pub fn cart_total(&self) -> Price {
        self.cart
            .snapshot()
            .values()
            .filter_map(|line| {
                let product = self.catalog.get(&line.product_id)?;
                if !product.in_stock {
                    return None;
                }
                Some(pricing::resolve(&product, &line.selection) * line.quantity)
            })
            .sum()
    }

    /// Keys of lines whose product became unavailable since it was added.
    #[must_use]
    pub fn unavailable_lines(&self) -> Vec<CartKey> {
        self.cart.stale_keys(&self.catalog)
    }

    /// Current cart lines, in insertion order.
    #[must_use]
    pub fn cart_lines(&self) -> Arc<CartLines> {
        self.cart.snapshot()
    }

    /// Empty the cart (checkout completion or explicit user action).
    ///
    /// Always succeeds locally; the remote clear is mirrored best-effort.
    pub fn clear_cart(&self) {
        self.cart.clear();
        self.sync.push_clear();
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Authenticate with a session token.
    ///
    /// Persists the token, pulls the authoritative remote cart, applies the
    /// configured [`LoginCartPolicy`], and marks the session live.
    ///
    /// # Errors
    ///
    /// Returns the pull error; the session then stays in Authenticating and
    /// the local cart is untouched, so the caller can retry.
    pub async fn authenticate(&self, token: SecretString) -> Result<(), ApiError> {
        if let Err(error) = self
            .storage
            .set(storage_keys::AUTH_TOKEN, token.expose_secret())
        {
            warn!(%error, "session token not persisted, session will not survive restart");
        }

        self.sync.begin_login(token);
        let remote = self.sync.pull_cart().await?;
        self.apply_login_policy(remote);
        self.sync.mark_synced();
        Ok(())
    }

    fn apply_login_policy(&self, remote: CartLines) {
        match self.login_cart_policy {
            LoginCartPolicy::Replace => self.cart.replace(remote),
            LoginCartPolicy::Merge => {
                let local = self.cart.snapshot();
                let mut merged = remote;
                for (key, line) in local.iter() {
                    if !merged.contains_key(key) {
                        merged.insert(key.clone(), line.clone());
                        self.sync.push_add(
                            line.product_id.clone(),
                            line.quantity,
                            line.selection.clone(),
                        );
                    }
                }
                self.cart.replace(merged);
            }
        }
    }

    /// Restore a persisted session on app start, if one exists.
    ///
    /// Returns whether a session was restored.
    ///
    /// # Errors
    ///
    /// Returns the pull error from [`Self::authenticate`].
    pub async fn restore_session(&self) -> Result<bool, ApiError> {
        let Some(token) = self.storage.get(storage_keys::AUTH_TOKEN) else {
            return Ok(false);
        };
        self.authenticate(SecretString::from(token)).await?;
        Ok(true)
    }

    /// Drop the session. The local cart is deliberately left as-is; call
    /// [`Self::clear_cart`] to empty it.
    pub fn logout(&self) {
        if let Err(error) = self.storage.remove(storage_keys::AUTH_TOKEN) {
            warn!(%error, "persisted session token not removed");
        }
        self.sync.logout();
    }

    /// Where the session stands relative to the remote cart.
    #[must_use]
    pub fn session_state(&self) -> SessionState {
        self.sync.state()
    }

    // =========================================================================
    // Collaborator Access
    // =========================================================================

    /// Popup and notification content service.
    #[must_use]
    pub fn content(&self) -> &ContentService {
        &self.content
    }

    /// The backend API client (the admin console uses it directly for the
    /// full product list and popup updates).
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    use rust_decimal::Decimal;
    use url::Url;

    use crate::catalog::{SizeOption, Variations, WrapOption};
    use crate::storage::MemoryStore;

    fn store() -> ShopStore {
        let api = ApiClient::new(
            &Url::parse("http://127.0.0.1:9").unwrap(),
            Duration::from_secs(1),
        )
        .unwrap();
        ShopStore::new(api, Arc::new(MemoryStore::new()), LoginCartPolicy::Replace)
    }

    fn price(units: i64) -> Price {
        Price::new(Decimal::new(units, 0))
    }

    fn product(id: &str, base: i64, stock: Option<u32>) -> Product {
        Product {
            id: ProductId::new(id),
            name: id.to_string(),
            description: String::new(),
            base_price: price(base),
            in_stock: true,
            stock,
            variations: None,
        }
    }

    #[test]
    fn test_add_line_returns_resolved_product() {
        let shop = store();
        shop.catalog().replace(vec![product("p1", 1000, None)]);

        let resolved = shop
            .add_line(&ProductId::new("p1"), 2, VariationSelection::none())
            .unwrap();
        assert_eq!(resolved.name, "p1");
        assert_eq!(shop.line_count(), 2);
    }

    #[test]
    fn test_add_line_with_empty_catalog_is_not_found() {
        let shop = store();
        let err = shop
            .add_line(&ProductId::new("p1"), 1, VariationSelection::none())
            .unwrap_err();
        assert_eq!(err, CartError::NotFound(ProductId::new("p1")));
        assert_eq!(shop.line_count(), 0);
    }

    #[test]
    fn test_stock_cap_scenario() {
        // product {id:"p1", basePrice:1000, stock:2}: add 1, then adding 2
        // more must fail with the cap reported, leaving quantity at 1.
        let shop = store();
        shop.catalog().replace(vec![product("p1", 1000, Some(2))]);
        let id = ProductId::new("p1");

        shop.add_line(&id, 1, VariationSelection::none()).unwrap();
        let err = shop.add_line(&id, 2, VariationSelection::none()).unwrap_err();

        assert_eq!(err, CartError::InsufficientStock { available: 2 });
        assert_eq!(shop.line_count(), 1);
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let shop = store();
        shop.catalog().replace(vec![product("p1", 1000, None)]);
        let id = ProductId::new("p1");

        shop.add_line(&id, 3, VariationSelection::none()).unwrap();
        let key = CartKey::new(&id, &VariationSelection::none());
        shop.set_quantity(&key, 0).unwrap();

        assert_eq!(shop.line_count(), 0);
    }

    #[test]
    fn test_cart_total_applies_variant_pricing() {
        let shop = store();
        let mut laptop = product("laptop-1", 1000, None);
        laptop.variations = Some(Variations {
            sizes: Some(vec![SizeOption {
                size: "15-inch".to_string(),
                price: price(1100),
            }]),
            wrap: Some(WrapOption {
                available: true,
                price: price(1150),
            }),
            groups: std::collections::BTreeMap::new(),
        });
        shop.catalog().replace(vec![laptop, product("sleeve", 50, None)]);

        let laptop_id = ProductId::new("laptop-1");
        shop.add_line(&laptop_id, 2, VariationSelection::for_size("15-inch"))
            .unwrap();
        shop.add_line(&laptop_id, 1, VariationSelection::none().with_wrap())
            .unwrap();
        shop.add_line(&ProductId::new("sleeve"), 1, VariationSelection::none())
            .unwrap();

        // 2 x 1100 + 1 x 1150 + 1 x 50
        assert_eq!(shop.cart_total(), price(3400));
        assert_eq!(shop.line_count(), 4);
        assert_eq!(shop.cart_lines().len(), 3);
    }

    #[test]
    fn test_cart_total_excludes_unavailable_without_removing() {
        let shop = store();
        shop.catalog()
            .replace(vec![product("p1", 1000, None), product("p2", 200, None)]);

        shop.add_line(&ProductId::new("p1"), 1, VariationSelection::none())
            .unwrap();
        shop.add_line(&ProductId::new("p2"), 1, VariationSelection::none())
            .unwrap();
        assert_eq!(shop.cart_total(), price(1200));

        // p2 goes out of stock, p1 disappears entirely.
        let mut p2 = product("p2", 200, None);
        p2.in_stock = false;
        shop.catalog().replace(vec![p2]);

        assert_eq!(shop.cart_total(), Price::ZERO);
        assert_eq!(shop.cart_lines().len(), 2);
        assert_eq!(shop.unavailable_lines().len(), 2);
    }

    #[test]
    fn test_clear_cart_is_local_first() {
        let shop = store();
        shop.catalog().replace(vec![product("p1", 1000, None)]);
        shop.add_line(&ProductId::new("p1"), 2, VariationSelection::none())
            .unwrap();

        shop.clear_cart();
        assert_eq!(shop.line_count(), 0);
        assert_eq!(shop.session_state(), SessionState::Anonymous);
    }
}
