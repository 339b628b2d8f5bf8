//! Cart mirror commands.
//!
//! These commands operate directly on the persistent mirror file; they do
//! not talk to a running cart service.
//!
//! # Environment Variables
//!
//! - `SHOEBOX_STORE_PATH` - Path of the mirror file (default: shoebox-store.json)
//! - `SHOEBOX_STORE_KEY` - Key the cart is mirrored under (default: @shoebox:cart)

use tracing::info;

use shoebox_cart::config::DEFAULT_STORE_KEY;
use shoebox_cart::storage::{FileStorage, Storage};
use shoebox_core::LineItem;

fn store() -> (FileStorage, String) {
    // Load environment variables
    dotenvy::dotenv().ok();

    let path = std::env::var("SHOEBOX_STORE_PATH")
        .unwrap_or_else(|_| "shoebox-store.json".to_string());
    let key =
        std::env::var("SHOEBOX_STORE_KEY").unwrap_or_else(|_| DEFAULT_STORE_KEY.to_string());

    (FileStorage::new(path), key)
}

/// Print the mirrored cart line items.
///
/// # Errors
///
/// Returns an error if the mirror cannot be read or decoded.
pub fn show() -> Result<(), Box<dyn std::error::Error>> {
    let (storage, key) = store();

    let Some(raw) = storage.get(&key)? else {
        info!("Mirror is empty (no cart stored)");
        return Ok(());
    };

    let items: Vec<LineItem> = serde_json::from_str(&raw)?;
    if items.is_empty() {
        info!("Cart is empty");
        return Ok(());
    }

    info!(items = items.len(), "Stored cart");
    for item in &items {
        info!(
            id = %item.product_id(),
            amount = item.amount,
            price = %item.product.price,
            "{}",
            item.product.title
        );
    }

    Ok(())
}

/// Reset the mirror to an empty cart.
///
/// # Errors
///
/// Returns an error if the mirror cannot be written.
pub fn clear() -> Result<(), Box<dyn std::error::Error>> {
    let (storage, key) = store();

    storage.set(&key, "[]")?;
    info!("Mirror reset to an empty cart");

    Ok(())
}
