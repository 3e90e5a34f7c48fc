//! Site notifications and the dismissible popup.
//!
//! The popup is a single message; the client remembers the last message the
//! user dismissed and only shows the popup again once the message changes
//! server-side. Notifications are display-only, with no dismissal state.

use std::sync::Arc;

use secrecy::SecretString;

use crate::api::types::Notification;
use crate::api::{ApiClient, ApiError};
use crate::storage::{LocalStore, StorageError, storage_keys};

/// Popup visibility for the current app load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupState {
    /// Current message from the backend.
    pub message: String,
    /// Whether the popup should be shown.
    pub should_show: bool,
}

impl PopupState {
    /// Evaluate a fetched message against the persisted dismissal marker.
    #[must_use]
    pub fn evaluate(message: String, last_dismissed: Option<&str>) -> Self {
        let should_show = last_dismissed != Some(message.as_str());
        Self {
            message,
            should_show,
        }
    }
}

/// Fetches popup and notification content.
pub struct ContentService {
    api: ApiClient,
    storage: Arc<dyn LocalStore>,
}

impl ContentService {
    /// Create the service over the backend client and durable storage.
    #[must_use]
    pub fn new(api: ApiClient, storage: Arc<dyn LocalStore>) -> Self {
        Self { api, storage }
    }

    /// Fetch the current popup and compare it with the dismissal marker.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails.
    pub async fn fetch_popup(&self) -> Result<PopupState, ApiError> {
        let message = self.api.get_popup().await?;
        let marker = self.storage.get(storage_keys::POPUP_DISMISSED);
        Ok(PopupState::evaluate(message, marker.as_deref()))
    }

    /// Record the message as seen; the popup stays hidden until the message
    /// changes server-side.
    ///
    /// # Errors
    ///
    /// Returns an error if the marker could not be persisted (the popup
    /// would then reappear on the next app load).
    pub fn dismiss(&self, message: &str) -> Result<(), StorageError> {
        self.storage.set(storage_keys::POPUP_DISMISSED, message)
    }

    /// Fetch active site notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails.
    pub async fn fetch_notifications(&self) -> Result<Vec<Notification>, ApiError> {
        self.api.get_notifications().await
    }

    /// Replace the popup message (admin console).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn update_popup(
        &self,
        token: &SecretString,
        message: &str,
    ) -> Result<(), ApiError> {
        self.api.update_popup(token, message).await
    }
}
