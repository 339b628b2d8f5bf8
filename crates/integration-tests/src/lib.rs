//! Integration tests for Shoebox.
//!
//! # Test Setup
//!
//! Every test runs fully in-process: [`TestContext`] spawns a mock catalog
//! service (axum, ephemeral port) with adjustable stock levels, builds the
//! real cart router over a file-backed mirror in a temp directory, and
//! drives it with `reqwest`.
//!
//! # Test Categories
//!
//! - `cart_api` - Cart operation matrix over HTTP
//! - `persistence` - Mirror behavior across service restarts

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use shoebox_cart::config::{CartConfig, CatalogConfig, DEFAULT_STORE_KEY};
use shoebox_cart::routes;
use shoebox_cart::state::AppState;
use shoebox_cart::storage::FileStorage;

static STORE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Stock levels served by the mock catalog, adjustable mid-test.
///
/// A product is known to the catalog iff it has a stock entry.
#[derive(Clone, Default)]
pub struct StockLevels(Arc<Mutex<HashMap<i32, u32>>>);

impl StockLevels {
    /// Set the available stock for a product.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set(&self, id: i32, amount: u32) {
        self.0
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(id, amount);
    }

    fn get(&self, id: i32) -> Option<u32> {
        self.0
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&id)
            .copied()
    }
}

async fn stock_handler(State(levels): State<StockLevels>, Path(id): Path<i32>) -> impl IntoResponse {
    match levels.get(id) {
        Some(amount) => Json(json!({ "amount": amount })).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn product_handler(
    State(levels): State<StockLevels>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    if levels.get(id).is_none() {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(json!({
        "id": id,
        "title": format!("Sneaker {id}"),
        "price": 99.9,
        "image": format!("https://cdn.example.com/{id}.jpg"),
    }))
    .into_response()
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

/// A fresh mirror path under the system temp directory.
#[must_use]
pub fn temp_store_path() -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "shoebox-it-{}-{}.json",
        std::process::id(),
        STORE_COUNTER.fetch_add(1, Ordering::SeqCst)
    ));
    path
}

/// One running cart service plus its mock catalog.
pub struct TestContext {
    /// HTTP client for driving the service.
    pub client: reqwest::Client,
    /// Base URL of the cart service under test.
    pub base_url: String,
    /// Stock levels of the mock catalog.
    pub stock: StockLevels,
    /// Path of the mirror file backing the service.
    pub store_path: PathBuf,
}

impl TestContext {
    /// Start a cart service over a fresh mirror.
    pub async fn new() -> Self {
        Self::with_store_path(temp_store_path()).await
    }

    /// Start a cart service over an existing mirror path.
    ///
    /// Reusing the path of a previous context simulates a service restart.
    pub async fn with_store_path(store_path: PathBuf) -> Self {
        let stock = StockLevels::default();

        let catalog_app = Router::new()
            .route("/stock/{id}", get(stock_handler))
            .route("/products/{id}", get(product_handler))
            .with_state(stock.clone());
        let catalog_url = spawn(catalog_app).await;

        let config = CartConfig {
            host: "127.0.0.1".parse().expect("valid host"),
            port: 0,
            catalog: CatalogConfig {
                base_url: catalog_url,
                api_token: None,
            },
            store_path: store_path.clone(),
            store_key: DEFAULT_STORE_KEY.to_string(),
            sentry_dsn: None,
        };

        let storage = Arc::new(FileStorage::new(&store_path));
        let state = AppState::new(config, storage);
        let app = routes::routes().with_state(state);
        let base_url = spawn(app).await;

        Self {
            client: reqwest::Client::new(),
            base_url,
            stock,
            store_path,
        }
    }

    /// GET the current cart view as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the body is not valid JSON.
    pub async fn cart(&self) -> serde_json::Value {
        self.client
            .get(format!("{}/cart", self.base_url))
            .send()
            .await
            .expect("GET /cart failed")
            .json()
            .await
            .expect("GET /cart returned invalid JSON")
    }

    /// POST a cart operation and return the response body.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the body is not valid JSON.
    pub async fn post(&self, path: &str, body: serde_json::Value) -> serde_json::Value {
        self.client
            .post(format!("{}{path}", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("POST failed")
            .json()
            .await
            .expect("POST returned invalid JSON")
    }

    /// Remove the mirror file.
    pub fn cleanup(&self) {
        let _ = std::fs::remove_file(&self.store_path);
    }
}
