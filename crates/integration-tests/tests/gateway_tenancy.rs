//! Session tokens and tenant isolation.

use reqwest::StatusCode;
use serde_json::Value;

use storedeck_integration_tests::TestContext;

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let ctx = TestContext::spawn().await;

    let resp = ctx
        .client
        .get(format!("{}/api/stores", ctx.gateway_url))
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("bad body");
    assert_eq!(body["error"], "Unauthenticated");
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let ctx = TestContext::spawn().await;

    let resp = ctx.get("/api/stores", "not-a-real-token").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_store_list_is_scoped_to_tenant() {
    let ctx = TestContext::spawn().await;
    ctx.add_store("store-a", "alice@example.com");
    ctx.add_store("store-b", "bob@example.com");

    let token = ctx.token_for("alice@example.com");
    let resp = ctx.get("/api/stores", &token).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let stores: Vec<Value> = resp.json().await.expect("bad body");
    assert_eq!(stores.len(), 1);
    assert_eq!(stores[0]["id"], "store-a");
}

#[tokio::test]
async fn test_foreign_store_id_reads_as_not_found() {
    let ctx = TestContext::spawn().await;
    ctx.add_store("store-a", "alice@example.com");
    ctx.upstream.seed_products(3);

    // Bob names Alice's store id. The answer must be the same plain 404
    // an unknown id gets, leaking nothing about the store's existence.
    let token = ctx.token_for("bob@example.com");
    let resp = ctx.get("/api/products?storeId=store-a", &token).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("bad body");
    assert_eq!(body["error"], "Not found: Store not found");
}

#[tokio::test]
async fn test_missing_store_id_is_bad_request() {
    let ctx = TestContext::spawn().await;
    let token = ctx.token_for("alice@example.com");

    let resp = ctx.get("/api/products", &token).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = ctx.get("/api/products?storeId=", &token).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_store_registration_forces_owner() {
    let ctx = TestContext::spawn().await;
    let token = ctx.token_for("alice@example.com");

    let resp = ctx
        .post(
            "/api/stores",
            &token,
            &serde_json::json!({
                "name": "My Shop",
                "base_url": "https://shop.example.com",
                "api_key": "ck_live",
                "api_secret": "cs_live",
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let store: Value = resp.json().await.expect("bad body");
    assert_eq!(store["owner"], "alice@example.com");

    // Only Alice sees it.
    let bob = ctx.token_for("bob@example.com");
    let resp = ctx.get("/api/stores", &bob).await;
    let stores: Vec<Value> = resp.json().await.expect("bad body");
    assert!(stores.is_empty());
}
