//! Remote cart synchronization.
//!
//! Local state is authoritative for everything the current session does;
//! the remote cart converges asynchronously. Mutations are mirrored with
//! fire-and-forget tasks whose failures are logged and dropped - they never
//! roll back the already-applied local mutation. The session token drives a
//! small state machine: Anonymous, Authenticating (token just set, remote
//! cart not yet pulled), Synced.

use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use async_trait::async_trait;
use indexmap::IndexMap;
use secrecy::SecretString;
use tracing::{debug, warn};
use voltbook_core::ProductId;

use crate::api::types::{AddCartItem, RemoteCartLine};
use crate::api::{ApiClient, ApiError};
use crate::cart::{CartKey, CartLine, CartLines, VariationSelection};

/// Where the session currently stands relative to the remote cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No token; nothing is mirrored.
    Anonymous,
    /// Token set, authoritative remote cart not yet pulled.
    Authenticating,
    /// Remote cart pulled; local mutations are mirrored.
    Synced,
}

/// Backend operations the sync adapter needs.
///
/// [`ApiClient`] implements this against the real backend; tests inject a
/// double.
#[async_trait]
pub trait CartBackend: Send + Sync {
    /// Fetch the authoritative remote cart.
    async fn fetch_cart(
        &self,
        token: &SecretString,
    ) -> Result<IndexMap<CartKey, RemoteCartLine>, ApiError>;

    /// Mirror an add mutation (quantity is the delta added).
    async fn push_add(
        &self,
        token: &SecretString,
        product_id: &ProductId,
        quantity: u32,
        selection: &VariationSelection,
    ) -> Result<(), ApiError>;

    /// Mirror a quantity change (quantity is the absolute target).
    async fn push_update(
        &self,
        token: &SecretString,
        key: &CartKey,
        quantity: u32,
    ) -> Result<(), ApiError>;

    /// Empty the remote cart.
    async fn clear(&self, token: &SecretString) -> Result<(), ApiError>;
}

#[async_trait]
impl CartBackend for ApiClient {
    async fn fetch_cart(
        &self,
        token: &SecretString,
    ) -> Result<IndexMap<CartKey, RemoteCartLine>, ApiError> {
        self.get_cart(token).await
    }

    async fn push_add(
        &self,
        token: &SecretString,
        product_id: &ProductId,
        quantity: u32,
        selection: &VariationSelection,
    ) -> Result<(), ApiError> {
        self.add_cart_item(
            token,
            &AddCartItem {
                item_id: product_id,
                quantity,
                variations: selection,
            },
        )
        .await
    }

    async fn push_update(
        &self,
        token: &SecretString,
        key: &CartKey,
        quantity: u32,
    ) -> Result<(), ApiError> {
        self.update_cart_item(token, key, quantity).await
    }

    async fn clear(&self, token: &SecretString) -> Result<(), ApiError> {
        self.clear_cart(token).await
    }
}

// =============================================================================
// RemoteSync
// =============================================================================

/// Mirrors local cart mutations to the server-held cart while a session
/// token is present.
pub struct RemoteSync {
    backend: Arc<dyn CartBackend>,
    token: ArcSwapOption<SecretString>,
    state: ArcSwap<SessionState>,
}

impl RemoteSync {
    /// Create an anonymous adapter over a backend.
    #[must_use]
    pub fn new(backend: Arc<dyn CartBackend>) -> Self {
        Self {
            backend,
            token: ArcSwapOption::new(None),
            state: ArcSwap::from_pointee(SessionState::Anonymous),
        }
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        **self.state.load()
    }

    /// Whether a session token is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.load().is_some()
    }

    /// Install a token; the session is Authenticating until the remote cart
    /// has been pulled.
    pub fn begin_login(&self, token: SecretString) {
        self.token.store(Some(Arc::new(token)));
        self.state.store(Arc::new(SessionState::Authenticating));
        debug!("session token set, pulling remote cart");
    }

    /// Pull the authoritative remote cart, converted to local cart lines.
    ///
    /// Returns an empty map when no token is present.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails; the session stays in its
    /// current state so the pull can be retried.
    pub async fn pull_cart(&self) -> Result<CartLines, ApiError> {
        let Some(token) = self.token.load_full() else {
            return Ok(IndexMap::new());
        };

        let remote = self.backend.fetch_cart(&token).await?;
        Ok(remote
            .into_iter()
            .map(|(key, line)| {
                (
                    key,
                    CartLine {
                        product_id: line.item_id,
                        quantity: line.quantity,
                        selection: line.variations,
                    },
                )
            })
            .collect())
    }

    /// Mark the session live after a successful pull.
    pub fn mark_synced(&self) {
        if self.is_authenticated() {
            self.state.store(Arc::new(SessionState::Synced));
        }
    }

    /// Drop the token. The local cart is deliberately left as-is.
    pub fn logout(&self) {
        self.token.store(None);
        self.state.store(Arc::new(SessionState::Anonymous));
    }

    // =========================================================================
    // Fire-and-forget mirrors
    // =========================================================================

    /// Mirror an add mutation. No-op when anonymous.
    pub fn push_add(&self, product_id: ProductId, quantity: u32, selection: VariationSelection) {
        let Some(token) = self.token.load_full() else {
            return;
        };
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            if let Err(error) = backend
                .push_add(&token, &product_id, quantity, &selection)
                .await
            {
                warn!(%error, product = %product_id, "cart add not mirrored to remote");
            }
        });
    }

    /// Mirror a quantity change. The absolute target quantity is sent, so a
    /// rapid sequence of updates on one key converges last-write-wins.
    /// No-op when anonymous.
    pub fn push_update(&self, key: CartKey, quantity: u32) {
        let Some(token) = self.token.load_full() else {
            return;
        };
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            if let Err(error) = backend.push_update(&token, &key, quantity).await {
                warn!(%error, %key, "cart update not mirrored to remote");
            }
        });
    }

    /// Mirror a cart clear. No-op when anonymous.
    pub fn push_clear(&self) {
        let Some(token) = self.token.load_full() else {
            return;
        };
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            if let Err(error) = backend.clear(&token).await {
                warn!(%error, "cart clear not mirrored to remote");
            }
        });
    }
}
