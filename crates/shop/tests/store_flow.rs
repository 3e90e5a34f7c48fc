//! End-to-end cart flows over an in-memory backend double.
//!
//! Exercises the login transition, the login cart policies, and the
//! best-effort mirroring of local mutations.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use secrecy::SecretString;
use url::Url;
use voltbook_core::{Price, ProductId};

use voltbook_shop::ShopStore;
use voltbook_shop::api::types::RemoteCartLine;
use voltbook_shop::api::{ApiClient, ApiError};
use voltbook_shop::cart::{CartKey, VariationSelection};
use voltbook_shop::catalog::Product;
use voltbook_shop::config::LoginCartPolicy;
use voltbook_shop::storage::{LocalStore, MemoryStore, storage_keys};
use voltbook_shop::sync::{CartBackend, SessionState};

// =============================================================================
// Recording backend double
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Fetch,
    Add { product: ProductId, quantity: u32 },
    Update { key: CartKey, quantity: u32 },
    Clear,
}

#[derive(Default)]
struct RecordingBackend {
    remote: Mutex<IndexMap<CartKey, RemoteCartLine>>,
    calls: Mutex<Vec<Call>>,
    fail_pushes: bool,
}

impl RecordingBackend {
    fn with_remote(remote: IndexMap<CartKey, RemoteCartLine>) -> Self {
        Self {
            remote: Mutex::new(remote),
            ..Self::default()
        }
    }

    fn record(&self, call: Call) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CartBackend for RecordingBackend {
    async fn fetch_cart(
        &self,
        _token: &SecretString,
    ) -> Result<IndexMap<CartKey, RemoteCartLine>, ApiError> {
        self.record(Call::Fetch);
        Ok(self
            .remote
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn push_add(
        &self,
        _token: &SecretString,
        product_id: &ProductId,
        quantity: u32,
        _selection: &VariationSelection,
    ) -> Result<(), ApiError> {
        self.record(Call::Add {
            product: product_id.clone(),
            quantity,
        });
        if self.fail_pushes {
            return Err(ApiError::Rejected);
        }
        Ok(())
    }

    async fn push_update(
        &self,
        _token: &SecretString,
        key: &CartKey,
        quantity: u32,
    ) -> Result<(), ApiError> {
        self.record(Call::Update {
            key: key.clone(),
            quantity,
        });
        if self.fail_pushes {
            return Err(ApiError::Rejected);
        }
        Ok(())
    }

    async fn clear(&self, _token: &SecretString) -> Result<(), ApiError> {
        self.record(Call::Clear);
        if self.fail_pushes {
            return Err(ApiError::Rejected);
        }
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn product(id: &str) -> Product {
    Product {
        id: ProductId::new(id),
        name: id.to_string(),
        description: String::new(),
        base_price: Price::new(Decimal::new(1000, 0)),
        in_stock: true,
        stock: None,
        variations: None,
    }
}

fn remote_line(id: &str, quantity: u32) -> (CartKey, RemoteCartLine) {
    let product_id = ProductId::new(id);
    (
        CartKey::new(&product_id, &VariationSelection::none()),
        RemoteCartLine {
            item_id: product_id,
            quantity,
            variations: VariationSelection::none(),
        },
    )
}

fn store_with(
    backend: Arc<RecordingBackend>,
    storage: Arc<MemoryStore>,
    policy: LoginCartPolicy,
) -> ShopStore {
    let api = ApiClient::new(
        &Url::parse("http://127.0.0.1:9").unwrap(),
        Duration::from_secs(1),
    )
    .unwrap();
    ShopStore::with_backend(api, backend, storage, policy)
}

/// Let fire-and-forget mirror tasks run to completion.
async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn login_replaces_local_cart_wholesale() {
    let (remote_key, line) = remote_line("p-remote", 2);
    let backend = Arc::new(RecordingBackend::with_remote(IndexMap::from_iter([(
        remote_key.clone(),
        line,
    )])));
    let storage = Arc::new(MemoryStore::new());
    let shop = store_with(
        Arc::clone(&backend),
        Arc::clone(&storage),
        LoginCartPolicy::Replace,
    );

    shop.catalog()
        .replace(vec![product("p-local"), product("p-remote")]);
    shop.add_line(&ProductId::new("p-local"), 1, VariationSelection::none())
        .unwrap();
    assert_eq!(shop.session_state(), SessionState::Anonymous);

    shop.authenticate(SecretString::from("tok-1".to_string()))
        .await
        .unwrap();

    // The remote line set exactly; the anonymous line is discarded.
    let lines = shop.cart_lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines.get(&remote_key).unwrap().quantity, 2);
    assert_eq!(shop.session_state(), SessionState::Synced);
    assert_eq!(storage.get(storage_keys::AUTH_TOKEN).as_deref(), Some("tok-1"));
}

#[tokio::test]
async fn login_merge_keeps_local_only_lines() {
    let (remote_key, line) = remote_line("p-remote", 2);
    let backend = Arc::new(RecordingBackend::with_remote(IndexMap::from_iter([(
        remote_key.clone(),
        line,
    )])));
    let shop = store_with(
        Arc::clone(&backend),
        Arc::new(MemoryStore::new()),
        LoginCartPolicy::Merge,
    );

    shop.catalog()
        .replace(vec![product("p-local"), product("p-remote")]);
    shop.add_line(&ProductId::new("p-local"), 3, VariationSelection::none())
        .unwrap();

    shop.authenticate(SecretString::from("tok".to_string()))
        .await
        .unwrap();
    settle().await;

    let lines = shop.cart_lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines.get(&remote_key).unwrap().quantity, 2);

    // The local-only line was pushed to the remote.
    assert!(backend.calls().contains(&Call::Add {
        product: ProductId::new("p-local"),
        quantity: 3,
    }));
}

#[tokio::test]
async fn authenticated_mutations_are_mirrored() {
    let backend = Arc::new(RecordingBackend::default());
    let shop = store_with(
        Arc::clone(&backend),
        Arc::new(MemoryStore::new()),
        LoginCartPolicy::Replace,
    );

    shop.catalog().replace(vec![product("p1")]);
    shop.authenticate(SecretString::from("tok".to_string()))
        .await
        .unwrap();

    let id = ProductId::new("p1");
    shop.add_line(&id, 2, VariationSelection::none()).unwrap();
    let key = CartKey::new(&id, &VariationSelection::none());
    shop.set_quantity(&key, 5).unwrap();
    shop.clear_cart();
    settle().await;

    assert_eq!(
        backend.calls(),
        vec![
            Call::Fetch,
            Call::Add {
                product: id,
                quantity: 2
            },
            Call::Update { key, quantity: 5 },
            Call::Clear,
        ]
    );
}

#[tokio::test]
async fn anonymous_mutations_are_not_mirrored() {
    let backend = Arc::new(RecordingBackend::default());
    let shop = store_with(
        Arc::clone(&backend),
        Arc::new(MemoryStore::new()),
        LoginCartPolicy::Replace,
    );

    shop.catalog().replace(vec![product("p1")]);
    shop.add_line(&ProductId::new("p1"), 1, VariationSelection::none())
        .unwrap();
    shop.clear_cart();
    settle().await;

    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn push_failures_never_roll_back_local_state() {
    let backend = Arc::new(RecordingBackend {
        fail_pushes: true,
        ..RecordingBackend::default()
    });
    let shop = store_with(
        Arc::clone(&backend),
        Arc::new(MemoryStore::new()),
        LoginCartPolicy::Replace,
    );

    shop.catalog().replace(vec![product("p1")]);
    shop.authenticate(SecretString::from("tok".to_string()))
        .await
        .unwrap();

    shop.add_line(&ProductId::new("p1"), 2, VariationSelection::none())
        .unwrap();
    settle().await;

    // The push was attempted and failed; the local line is intact.
    assert_eq!(backend.calls().len(), 2); // Fetch + Add
    assert_eq!(shop.line_count(), 2);
}

#[tokio::test]
async fn restore_session_consumes_persisted_token() {
    let backend = Arc::new(RecordingBackend::default());
    let storage = Arc::new(MemoryStore::new());
    storage.set(storage_keys::AUTH_TOKEN, "tok-saved").unwrap();

    let shop = store_with(
        Arc::clone(&backend),
        Arc::clone(&storage),
        LoginCartPolicy::Replace,
    );

    assert!(shop.restore_session().await.unwrap());
    assert_eq!(shop.session_state(), SessionState::Synced);
    assert_eq!(backend.calls(), vec![Call::Fetch]);

    // Without a stored token nothing happens.
    let fresh = store_with(
        Arc::new(RecordingBackend::default()),
        Arc::new(MemoryStore::new()),
        LoginCartPolicy::Replace,
    );
    assert!(!fresh.restore_session().await.unwrap());
    assert_eq!(fresh.session_state(), SessionState::Anonymous);
}

#[tokio::test]
async fn logout_leaves_local_cart_intact() {
    let backend = Arc::new(RecordingBackend::default());
    let storage = Arc::new(MemoryStore::new());
    let shop = store_with(
        Arc::clone(&backend),
        Arc::clone(&storage),
        LoginCartPolicy::Replace,
    );

    shop.catalog().replace(vec![product("p1")]);
    shop.authenticate(SecretString::from("tok".to_string()))
        .await
        .unwrap();
    shop.add_line(&ProductId::new("p1"), 2, VariationSelection::none())
        .unwrap();
    settle().await;

    shop.logout();
    assert_eq!(shop.session_state(), SessionState::Anonymous);
    assert_eq!(shop.line_count(), 2);
    assert_eq!(storage.get(storage_keys::AUTH_TOKEN), None);

    // Post-logout mutations stay local.
    shop.clear_cart();
    settle().await;
    assert!(!backend.calls().contains(&Call::Clear));
}
