//! Shop engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOP_API_BASE_URL` - Base URL of the shop backend API
//!
//! ## Optional
//! - `SHOP_API_TIMEOUT_SECS` - Remote call timeout in seconds (default: 10)
//! - `SHOP_STORAGE_PATH` - Durable key-value storage file
//!   (default: voltbook-store.json)
//! - `SHOP_LOGIN_CART_POLICY` - What happens to anonymous cart lines on
//!   login: `replace` or `merge` (default: replace)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_TIMEOUT_SECS: u64 = 10;
const DEFAULT_STORAGE_PATH: &str = "voltbook-store.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// What happens to anonymous cart lines when a user logs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoginCartPolicy {
    /// The remote cart replaces local state wholesale; anonymous lines are
    /// discarded. Matches the historical behavior.
    #[default]
    Replace,
    /// Remote lines win per key; anonymous-only lines are kept locally and
    /// pushed to the remote.
    Merge,
}

impl FromStr for LoginCartPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "merge" => Ok(Self::Merge),
            other => Err(format!("expected 'replace' or 'merge', got '{other}'")),
        }
    }
}

/// Shop engine configuration.
#[derive(Debug, Clone)]
pub struct ShopConfig {
    /// Base URL of the shop backend API.
    pub api_base_url: Url,
    /// Timeout applied to every remote call.
    pub api_timeout: Duration,
    /// Path of the durable key-value storage file.
    pub storage_path: PathBuf,
    /// Login cart policy.
    pub login_cart_policy: LoginCartPolicy,
}

impl ShopConfig {
    /// Configuration with defaults for everything but the base URL.
    #[must_use]
    pub fn new(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            api_timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            login_cart_policy: LoginCartPolicy::default(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from a `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = get_required_env("SHOP_API_BASE_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SHOP_API_BASE_URL".to_string(), e.to_string())
            })?;

        let api_timeout = get_env_or_default(
            "SHOP_API_TIMEOUT_SECS",
            &DEFAULT_API_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| {
            ConfigError::InvalidEnvVar("SHOP_API_TIMEOUT_SECS".to_string(), e.to_string())
        })?;

        let storage_path =
            PathBuf::from(get_env_or_default("SHOP_STORAGE_PATH", DEFAULT_STORAGE_PATH));

        let login_cart_policy = get_env_or_default("SHOP_LOGIN_CART_POLICY", "replace")
            .parse::<LoginCartPolicy>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOP_LOGIN_CART_POLICY".to_string(), e))?;

        Ok(Self {
            api_base_url,
            api_timeout,
            storage_path,
            login_cart_policy,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
