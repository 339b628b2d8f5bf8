//! Integration tests for mirror persistence across service restarts.

use serde_json::json;

use shoebox_integration_tests::{TestContext, temp_store_path};

#[tokio::test]
async fn test_cart_survives_service_restart() {
    let store_path = temp_store_path();

    let before = {
        let ctx = TestContext::with_store_path(store_path.clone()).await;
        ctx.stock.set(1, 5);
        ctx.stock.set(2, 5);
        ctx.post("/cart/add", json!({ "product_id": 2 })).await;
        ctx.post("/cart/add", json!({ "product_id": 1 })).await;
        ctx.post("/cart/update", json!({ "product_id": 1, "amount": 3 }))
            .await;
        ctx.cart().await
    };

    // A fresh service over the same mirror restores the identical sequence
    let restarted = TestContext::with_store_path(store_path).await;
    assert_eq!(restarted.cart().await, before);

    restarted.cleanup();
}

#[tokio::test]
async fn test_unparsable_mirror_starts_empty() {
    let store_path = temp_store_path();
    std::fs::write(&store_path, "definitely not json").expect("write corrupt mirror");

    let ctx = TestContext::with_store_path(store_path).await;

    let cart = ctx.cart().await;
    assert_eq!(cart["item_count"], 0);
    assert!(cart["items"].as_array().expect("items array").is_empty());

    ctx.cleanup();
}

#[tokio::test]
async fn test_mutations_overwrite_a_previously_corrupt_mirror() {
    let store_path = temp_store_path();
    std::fs::write(&store_path, "{ broken").expect("write corrupt mirror");

    let ctx = TestContext::with_store_path(store_path.clone()).await;
    ctx.stock.set(1, 5);
    ctx.post("/cart/add", json!({ "product_id": 1 })).await;

    // The mirror is valid again and a restart sees the new cart
    let restarted = TestContext::with_store_path(store_path).await;
    let cart = restarted.cart().await;
    assert_eq!(cart["item_count"], 1);

    restarted.cleanup();
}
