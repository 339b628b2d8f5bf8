//! Cart route handlers.
//!
//! JSON handlers over the shared [`CartService`]. Mutating handlers return
//! the refreshed cart view together with any user-visible notice the
//! operation emitted, so clients can toast it.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use shoebox_core::{LineItem, ProductId};

use crate::cart::Notice;
use crate::state::AppState;

/// Cart item display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub id: ProductId,
    pub title: String,
    pub amount: u32,
    pub price: String,
    pub line_price: String,
    pub image: String,
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl CartView {
    /// Create an empty cart view.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            subtotal: "$0.00".to_string(),
            item_count: 0,
        }
    }
}

// =============================================================================
// Type Conversions
// =============================================================================

/// Format an amount as a price string.
fn format_price(amount: Decimal) -> String {
    format!("${amount:.2}")
}

impl From<&[LineItem]> for CartView {
    fn from(items: &[LineItem]) -> Self {
        let subtotal: Decimal = items
            .iter()
            .map(|item| item.product.price * Decimal::from(item.amount))
            .sum();

        Self {
            items: items.iter().map(CartItemView::from).collect(),
            subtotal: format_price(subtotal),
            item_count: items.iter().map(|item| item.amount).sum(),
        }
    }
}

impl From<&LineItem> for CartItemView {
    fn from(item: &LineItem) -> Self {
        Self {
            id: item.product_id(),
            title: item.product.title.clone(),
            amount: item.amount,
            price: format_price(item.product.price),
            line_price: format_price(item.product.price * Decimal::from(item.amount)),
            image: item.product.image.clone(),
        }
    }
}

// =============================================================================
// Payloads
// =============================================================================

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
}

/// Update cart request body.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub product_id: ProductId,
    pub amount: i64,
}

/// Remove from cart request body.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub product_id: ProductId,
}

/// Response for mutating cart operations.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub cart: CartView,
    /// User-visible message emitted by the operation, if any.
    pub notice: Option<String>,
}

/// Cart count response.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u32,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the current cart.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Json<CartView> {
    let items = state.cart().items().await;
    Json(CartView::from(items.as_slice()))
}

/// Add one unit of a product to the cart.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    Json(request): Json<AddToCartRequest>,
) -> Json<CartResponse> {
    let mut notices = state.cart().notices();
    state.cart().add_product(request.product_id).await;

    Json(respond(state, notices.try_recv().ok()).await)
}

/// Set a product's quantity.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Json(request): Json<UpdateCartRequest>,
) -> Json<CartResponse> {
    let mut notices = state.cart().notices();
    state
        .cart()
        .update_product_amount(request.product_id, request.amount)
        .await;

    Json(respond(state, notices.try_recv().ok()).await)
}

/// Remove a product from the cart.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Json(request): Json<RemoveFromCartRequest>,
) -> Json<CartResponse> {
    let mut notices = state.cart().notices();
    state.cart().remove_product(request.product_id).await;

    Json(respond(state, notices.try_recv().ok()).await)
}

/// Get the total item count.
#[instrument(skip(state))]
pub async fn count(State(state): State<AppState>) -> Json<CartCount> {
    let items = state.cart().items().await;
    Json(CartCount {
        count: items.iter().map(|item| item.amount).sum(),
    })
}

async fn respond(state: AppState, notice: Option<Notice>) -> CartResponse {
    let items = state.cart().items().await;
    CartResponse {
        cart: CartView::from(items.as_slice()),
        notice: notice.map(|n| n.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shoebox_core::Product;

    use super::*;

    fn line_item(id: i32, price: Decimal, amount: u32) -> LineItem {
        LineItem {
            product: Product {
                id: ProductId::new(id),
                title: format!("Sneaker {id}"),
                price,
                image: format!("https://cdn.example.com/{id}.jpg"),
            },
            amount,
        }
    }

    #[test]
    fn test_format_price_pads_to_two_decimals() {
        assert_eq!(format_price(Decimal::new(1399, 1)), "$139.90");
        assert_eq!(format_price(Decimal::new(5, 0)), "$5.00");
    }

    #[test]
    fn test_empty_cart_view() {
        let view = CartView::empty();
        assert!(view.items.is_empty());
        assert_eq!(view.subtotal, "$0.00");
        assert_eq!(view.item_count, 0);
    }

    #[test]
    fn test_cart_view_totals() {
        let items = vec![
            line_item(1, Decimal::new(1399, 1), 2), // 2 x 139.90
            line_item(2, Decimal::new(8999, 2), 1), // 1 x 89.99
        ];

        let view = CartView::from(items.as_slice());

        assert_eq!(view.item_count, 3);
        assert_eq!(view.subtotal, "$369.79");
        let first = view.items.first().unwrap();
        assert_eq!(first.price, "$139.90");
        assert_eq!(first.line_price, "$279.80");
    }
}
