//! Cart service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CATALOG_BASE_URL` - Base URL of the catalog/stock service
//!
//! ## Optional
//! - `SHOEBOX_HOST` - Bind address (default: 127.0.0.1)
//! - `SHOEBOX_PORT` - Listen port (default: 3000)
//! - `SHOEBOX_STORE_PATH` - Path of the persistent mirror file (default: shoebox-store.json)
//! - `SHOEBOX_STORE_KEY` - Key the cart is mirrored under (default: @shoebox:cart)
//! - `CATALOG_API_TOKEN` - Bearer token for the catalog service
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

/// Default key the serialized cart lives under in the store.
pub const DEFAULT_STORE_KEY: &str = "@shoebox:cart";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart service application configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Catalog/stock service configuration
    pub catalog: CatalogConfig,
    /// Path of the persistent mirror file
    pub store_path: PathBuf,
    /// Key the serialized cart is mirrored under
    pub store_key: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Catalog/stock service configuration.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone)]
pub struct CatalogConfig {
    /// Base URL of the catalog service (e.g., <https://catalog.example.com>)
    pub base_url: String,
    /// Bearer token sent with catalog requests, if the service requires one
    pub api_token: Option<SecretString>,
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("base_url", &self.base_url)
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("SHOEBOX_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOEBOX_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("SHOEBOX_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOEBOX_PORT".to_string(), e.to_string()))?;

        let catalog = CatalogConfig::from_env()?;

        let store_path = PathBuf::from(get_env_or_default(
            "SHOEBOX_STORE_PATH",
            "shoebox-store.json",
        ));
        let store_key = get_env_or_default("SHOEBOX_STORE_KEY", DEFAULT_STORE_KEY);
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            host,
            port,
            catalog,
            store_path,
            store_key,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl CatalogConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: get_required_env("CATALOG_BASE_URL")?,
            api_token: get_optional_env("CATALOG_API_TOKEN").map(SecretString::from),
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

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_config() -> CartConfig {
        CartConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            catalog: CatalogConfig {
                base_url: "http://localhost:3333".to_string(),
                api_token: Some(SecretString::from("catalog_api_token_value")),
            },
            store_path: PathBuf::from("shoebox-store.json"),
            store_key: DEFAULT_STORE_KEY.to_string(),
            sentry_dsn: None,
        }
    }

    #[test]
    fn test_socket_addr() {
        let config = sample_config();

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_catalog_config_debug_redacts_token() {
        let config = sample_config();

        let debug_output = format!("{config:?}");

        // Public fields should be visible
        assert!(debug_output.contains("http://localhost:3333"));

        // The token should be redacted
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("catalog_api_token_value"));
    }

    #[test]
    fn test_catalog_config_debug_without_token() {
        let config = CatalogConfig {
            base_url: "http://localhost:3333".to_string(),
            api_token: None,
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("None"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingEnvVar("CATALOG_BASE_URL".to_string());
        assert_eq!(
            err.to_string(),
            "Missing environment variable: CATALOG_BASE_URL"
        );

        let err = ConfigError::InvalidEnvVar("SHOEBOX_PORT".to_string(), "bad".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid environment variable SHOEBOX_PORT: bad"
        );
    }
}
