//! HTTP route handlers for the cart service.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health      - Health check
//!
//! # Cart
//! GET  /cart        - Cart view (items, subtotal, item count)
//! POST /cart/add    - Add one unit of a product
//! POST /cart/update - Set a product's quantity
//! POST /cart/remove - Remove a product
//! GET  /cart/count  - Total item count
//! ```

pub mod cart;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create all routes for the cart service.
pub fn routes() -> Router<AppState> {
    Router::new().nest("/cart", cart_routes())
}
