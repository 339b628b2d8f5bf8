//! Catalog service client.
//!
//! REST client for the external catalog/stock service backing the cart:
//!
//! - `GET /products/{id}` - product metadata, cached via `moka` (5-minute
//!   TTL) since the cart denormalizes it at add time anyway
//! - `GET /stock/{id}` - current availability, fetched fresh on every
//!   validation and never cached
//!
//! Failures are terminal for the calling operation: there is no retry or
//! backoff here.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use shoebox_core::{Product, ProductId};

use crate::config::CatalogConfig;

/// Errors that can occur when interacting with the catalog service.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Catalog returned a non-success status.
    #[error("catalog returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the catalog.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

/// Current availability for one product, as reported by the stock endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Stock {
    /// Units available for sale.
    pub amount: u32,
}

// =============================================================================
// CatalogClient
// =============================================================================

/// Client for the catalog/stock service.
///
/// Product metadata is cached for 5 minutes; stock is never cached.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<SecretString>,
    products: Cache<ProductId, Product>,
}

impl CatalogClient {
    /// Create a new catalog client.
    #[must_use]
    pub fn new(config: &CatalogConfig) -> Self {
        let products = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CatalogClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.trim_end_matches('/').to_string(),
                api_token: config.api_token.clone(),
                products,
            }),
        }
    }

    /// Execute a GET request and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CatalogError> {
        let url = format!("{}/{path}", self.inner.base_url);

        let mut request = self.inner.client.get(&url);
        if let Some(token) = &self.inner.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CatalogError::RateLimited(retry_after));
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(path.to_string()));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Catalog returned non-success status"
            );
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body: response_text.chars().take(200).collect::<String>(),
            });
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse catalog response"
            );
            CatalogError::Parse(e)
        })
    }

    /// Get the current stock for a product.
    ///
    /// Always hits the catalog; availability is validated fresh on every
    /// cart operation that needs it.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is unknown or the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_stock(&self, product_id: ProductId) -> Result<Stock, CatalogError> {
        self.get_json(&format!("stock/{product_id}")).await
    }

    /// Get product metadata by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product(&self, product_id: ProductId) -> Result<Product, CatalogError> {
        // Check cache
        if let Some(product) = self.inner.products.get(&product_id).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let product: Product = self.get_json(&format!("products/{product_id}")).await?;

        // Cache the result
        self.inner
            .products
            .insert(product_id, product.clone())
            .await;

        Ok(product)
    }

    /// Invalidate a cached product.
    pub async fn invalidate_product(&self, product_id: ProductId) {
        self.inner.products.invalidate(&product_id).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;

    #[derive(Clone, Default)]
    struct MockCatalog {
        stock: Arc<AtomicU32>,
        stock_hits: Arc<AtomicUsize>,
        product_hits: Arc<AtomicUsize>,
    }

    async fn stock_handler(
        State(mock): State<MockCatalog>,
        Path(id): Path<i32>,
    ) -> impl IntoResponse {
        mock.stock_hits.fetch_add(1, Ordering::SeqCst);
        if id == 1 {
            Json(json!({ "amount": mock.stock.load(Ordering::SeqCst) })).into_response()
        } else {
            StatusCode::NOT_FOUND.into_response()
        }
    }

    async fn product_handler(
        State(mock): State<MockCatalog>,
        Path(id): Path<i32>,
    ) -> impl IntoResponse {
        mock.product_hits.fetch_add(1, Ordering::SeqCst);
        if id == 1 {
            Json(json!({
                "id": 1,
                "title": "Trail Runner",
                "price": 139.9,
                "image": "https://cdn.example.com/trail-runner.jpg",
            }))
            .into_response()
        } else {
            StatusCode::NOT_FOUND.into_response()
        }
    }

    async fn broken_handler() -> impl IntoResponse {
        (StatusCode::OK, "not json")
    }

    async fn spawn_mock(mock: MockCatalog) -> String {
        let app = Router::new()
            .route("/stock/{id}", get(stock_handler))
            .route("/products/{id}", get(product_handler))
            .with_state(mock);

        spawn_router(app).await
    }

    async fn spawn_router(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client_for(base_url: String) -> CatalogClient {
        CatalogClient::new(&CatalogConfig {
            base_url,
            api_token: None,
        })
    }

    #[tokio::test]
    async fn test_get_stock_reads_amount() {
        let mock = MockCatalog::default();
        mock.stock.store(5, Ordering::SeqCst);
        let client = client_for(spawn_mock(mock).await);

        let stock = client.get_stock(ProductId::new(1)).await.unwrap();
        assert_eq!(stock, Stock { amount: 5 });
    }

    #[tokio::test]
    async fn test_get_stock_is_never_cached() {
        let mock = MockCatalog::default();
        mock.stock.store(5, Ordering::SeqCst);
        let hits = Arc::clone(&mock.stock_hits);
        let client = client_for(spawn_mock(mock).await);

        client.get_stock(ProductId::new(1)).await.unwrap();
        client.get_stock(ProductId::new(1)).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_get_product_parses_metadata() {
        let client = client_for(spawn_mock(MockCatalog::default()).await);

        let product = client.get_product(ProductId::new(1)).await.unwrap();

        assert_eq!(product.id, ProductId::new(1));
        assert_eq!(product.title, "Trail Runner");
        assert_eq!(product.price, Decimal::new(1399, 1));
    }

    #[tokio::test]
    async fn test_get_product_is_cached() {
        let mock = MockCatalog::default();
        let hits = Arc::clone(&mock.product_hits);
        let client = client_for(spawn_mock(mock).await);

        client.get_product(ProductId::new(1)).await.unwrap();
        client.get_product(ProductId::new(1)).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_product_forces_refetch() {
        let mock = MockCatalog::default();
        let hits = Arc::clone(&mock.product_hits);
        let client = client_for(spawn_mock(mock).await);

        client.get_product(ProductId::new(1)).await.unwrap();
        client.invalidate_product(ProductId::new(1)).await;
        client.get_product(ProductId::new(1)).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let client = client_for(spawn_mock(MockCatalog::default()).await);

        let err = client.get_stock(ProductId::new(99)).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));

        let err = client.get_product(ProductId::new(99)).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_invalid_body_is_a_parse_error() {
        let app = Router::new().route("/stock/{id}", get(broken_handler));
        let client = client_for(spawn_router(app).await);

        let err = client.get_stock(ProductId::new(1)).await.unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn test_catalog_error_display() {
        let err = CatalogError::NotFound("products/123".to_string());
        assert_eq!(err.to_string(), "Not found: products/123");

        let err = CatalogError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");

        let err = CatalogError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "catalog returned HTTP 500: boom");
    }
}
