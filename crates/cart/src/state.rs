//! Application state shared across handlers.

use std::sync::Arc;

use crate::cart::CartService;
use crate::catalog::CatalogClient;
use crate::config::CartConfig;
use crate::storage::Storage;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// one cart instance every consumer shares.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: CartConfig,
    cart: CartService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Cart service configuration
    /// * `storage` - Persistent mirror backing the cart
    #[must_use]
    pub fn new(config: CartConfig, storage: Arc<dyn Storage>) -> Self {
        let catalog = CatalogClient::new(&config.catalog);
        let cart = CartService::new(catalog, storage, config.store_key.clone());

        Self {
            inner: Arc::new(AppStateInner { config, cart }),
        }
    }

    /// Get a reference to the service configuration.
    #[must_use]
    pub fn config(&self) -> &CartConfig {
        &self.inner.config
    }

    /// Get a reference to the shared cart.
    #[must_use]
    pub fn cart(&self) -> &CartService {
        &self.inner.cart
    }
}
