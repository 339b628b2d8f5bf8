//! Cart state container.
//!
//! [`CartService`] owns the authoritative in-memory cart (an ordered list of
//! line items, unique by product ID) and keeps the persistent mirror in
//! sync by rewriting it in full on every mutation. The add and
//! update-amount operations validate the target quantity against the
//! catalog's stock endpoint before touching the cart; remove is local.
//!
//! Operations never return errors to the caller. Each failure category maps
//! to a user-visible [`Notice`] published on a broadcast channel (the toast
//! analogue), and the operation leaves the cart untouched. Every successful
//! mutation publishes the new snapshot on a `watch` channel so all
//! consumers re-render from the same state.
//!
//! The stock check is read-fresh-validate-write; a stock change between
//! the read and the write is not detected.

use std::sync::Arc;

use tokio::sync::{RwLock, broadcast, watch};
use tracing::instrument;

use shoebox_core::{LineItem, ProductId};

use crate::catalog::{CatalogClient, CatalogError};
use crate::storage::{Storage, StorageError};

const NOTICE_CHANNEL_CAPACITY: usize = 16;

/// User-visible transient notification conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Requested quantity exceeds the catalog's reported stock.
    OutOfStock,
    /// Adding a product failed.
    AddFailed,
    /// Removing a product failed.
    RemoveFailed,
    /// Updating a product's amount failed.
    UpdateFailed,
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Self::OutOfStock => "Requested quantity is out of stock",
            Self::AddFailed => "Failed to add product",
            Self::RemoveFailed => "Failed to remove product",
            Self::UpdateFailed => "Failed to update product amount",
        };
        f.write_str(message)
    }
}

/// Errors raised by the internal operation paths.
///
/// These never cross the public operation boundary; they are mapped to
/// [`Notice`] values there.
#[derive(Debug, thiserror::Error)]
pub enum CartError {
    /// Requested quantity exceeds available stock.
    #[error("requested quantity exceeds available stock")]
    OutOfStock,

    /// The operation targets a product that is not in the cart.
    #[error("product is not in the cart")]
    NotInCart,

    /// Catalog request failed.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Mirror write failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

// =============================================================================
// CartService
// =============================================================================

/// The cart state container.
///
/// Cheaply cloneable; every clone shares the same cart instance, so all
/// consumers observe the same state.
#[derive(Clone)]
pub struct CartService {
    inner: Arc<CartServiceInner>,
}

struct CartServiceInner {
    catalog: CatalogClient,
    storage: Arc<dyn Storage>,
    store_key: String,
    items: RwLock<Vec<LineItem>>,
    changes: watch::Sender<Vec<LineItem>>,
    notices: broadcast::Sender<Notice>,
}

impl CartService {
    /// Create a cart service, restoring state from the persistent mirror.
    ///
    /// An absent or unparsable mirror value yields an empty cart; the
    /// unparsable case logs a warning and is overwritten on the next
    /// mutation.
    #[must_use]
    pub fn new(
        catalog: CatalogClient,
        storage: Arc<dyn Storage>,
        store_key: impl Into<String>,
    ) -> Self {
        let store_key = store_key.into();
        let items = load_mirror(storage.as_ref(), &store_key);
        let (changes, _) = watch::channel(items.clone());
        let (notices, _) = broadcast::channel(NOTICE_CHANNEL_CAPACITY);

        Self {
            inner: Arc::new(CartServiceInner {
                catalog,
                storage,
                store_key,
                items: RwLock::new(items),
                changes,
                notices,
            }),
        }
    }

    /// Snapshot of the current line items, in insertion order.
    pub async fn items(&self) -> Vec<LineItem> {
        self.inner.items.read().await.clone()
    }

    /// Subscribe to cart snapshots; receives the state after every mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<LineItem>> {
        self.inner.changes.subscribe()
    }

    /// Subscribe to user-visible notices.
    #[must_use]
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.inner.notices.subscribe()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Add one unit of a product to the cart.
    ///
    /// Validates against current stock first. If the product is already in
    /// the cart this delegates to [`Self::update_product_amount`] with the
    /// incremented quantity (which re-reads stock and reports its own
    /// notices); otherwise the catalog metadata is fetched and a new line
    /// item with quantity 1 is appended.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_product(&self, product_id: ProductId) {
        match self.try_add(product_id).await {
            Ok(()) => {}
            Err(CartError::OutOfStock) => self.notify(Notice::OutOfStock),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to add product to cart");
                self.notify(Notice::AddFailed);
            }
        }
    }

    /// Remove a product from the cart.
    ///
    /// Purely local; no catalog call. Removing an id that is not in the
    /// cart emits [`Notice::RemoveFailed`] and changes nothing.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_product(&self, product_id: ProductId) {
        match self.try_remove(product_id).await {
            Ok(()) => {}
            Err(CartError::NotInCart) => self.notify(Notice::RemoveFailed),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to remove product from cart");
                self.notify(Notice::RemoveFailed);
            }
        }
    }

    /// Set the quantity of a product already in the cart.
    ///
    /// A non-positive `amount` is a silent no-op, not a removal. A target
    /// quantity above current stock emits [`Notice::OutOfStock`] and
    /// changes nothing.
    #[instrument(skip(self), fields(product_id = %product_id, amount))]
    pub async fn update_product_amount(&self, product_id: ProductId, amount: i64) {
        match self.try_update(product_id, amount).await {
            Ok(()) => {}
            Err(CartError::OutOfStock) => self.notify(Notice::OutOfStock),
            Err(CartError::NotInCart) => self.notify(Notice::UpdateFailed),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to update product amount");
                self.notify(Notice::UpdateFailed);
            }
        }
    }

    // =========================================================================
    // Internal operation paths
    // =========================================================================

    async fn try_add(&self, product_id: ProductId) -> Result<(), CartError> {
        let stock = self.inner.catalog.get_stock(product_id).await?;

        let current = {
            let items = self.inner.items.read().await;
            items
                .iter()
                .find(|item| item.product_id() == product_id)
                .map_or(0, |item| item.amount)
        };

        let requested = current + 1;
        if requested > stock.amount {
            return Err(CartError::OutOfStock);
        }

        if current > 0 {
            // Already in the cart: the update path re-reads stock, applies
            // the new amount, and reports its own notices.
            self.update_product_amount(product_id, i64::from(requested))
                .await;
            return Ok(());
        }

        let product = self.inner.catalog.get_product(product_id).await?;

        let mut items = self.inner.items.write().await;
        items.push(LineItem::new(product));
        self.commit(&items)?;
        Ok(())
    }

    async fn try_remove(&self, product_id: ProductId) -> Result<(), CartError> {
        let mut items = self.inner.items.write().await;
        if !items.iter().any(|item| item.product_id() == product_id) {
            return Err(CartError::NotInCart);
        }

        items.retain(|item| item.product_id() != product_id);
        self.commit(&items)?;
        Ok(())
    }

    async fn try_update(&self, product_id: ProductId, amount: i64) -> Result<(), CartError> {
        {
            let items = self.inner.items.read().await;
            if !items.iter().any(|item| item.product_id() == product_id) {
                return Err(CartError::NotInCart);
            }
        }

        // Observable behavior of the storefront: a non-positive target
        // quantity changes nothing and reports nothing.
        if amount <= 0 {
            return Ok(());
        }
        let requested = u32::try_from(amount).unwrap_or(u32::MAX);

        let stock = self.inner.catalog.get_stock(product_id).await?;
        if requested > stock.amount {
            return Err(CartError::OutOfStock);
        }

        let mut items = self.inner.items.write().await;
        let Some(item) = items
            .iter_mut()
            .find(|item| item.product_id() == product_id)
        else {
            return Err(CartError::NotInCart);
        };
        item.amount = requested;
        self.commit(&items)?;
        Ok(())
    }

    /// Publish the new snapshot and rewrite the persistent mirror.
    ///
    /// Subscribers observe the new state even if the mirror write fails;
    /// there is no rollback for that partial-failure window.
    fn commit(&self, items: &[LineItem]) -> Result<(), StorageError> {
        // send_replace keeps the stored snapshot fresh even with no
        // subscribers, so late subscribers start from the current state
        self.inner.changes.send_replace(items.to_vec());
        let raw = serde_json::to_string(items)?;
        self.inner.storage.set(&self.inner.store_key, &raw)
    }

    fn notify(&self, notice: Notice) {
        // No subscribers is fine; notices are fire-and-forget.
        let _ = self.inner.notices.send(notice);
    }
}

/// Read the mirrored cart from storage; empty on absent or unparsable.
fn load_mirror(storage: &dyn Storage, key: &str) -> Vec<LineItem> {
    match storage.get(key) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(err) => {
                tracing::warn!(error = %err, "Stored cart is unparsable, starting empty");
                Vec::new()
            }
        },
        Ok(None) => Vec::new(),
        Err(err) => {
            tracing::warn!(error = %err, "Failed to read stored cart, starting empty");
            Vec::new()
        }
    }
}
