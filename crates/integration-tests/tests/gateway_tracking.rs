//! Tracking ledger over order metadata, end to end.

use reqwest::StatusCode;
use serde_json::{Value, json};

use storedeck_integration_tests::TestContext;

fn order_with_tracking(id: i64, entries: &Value) -> Value {
    json!({
        "id": id,
        "status": "processing",
        "total": "55.00",
        "meta_data": [
            { "id": 9, "key": "tracking_info", "value": entries.to_string() }
        ],
    })
}

#[tokio::test]
async fn test_list_decodes_the_metadata_slot() {
    let ctx = TestContext::spawn().await;
    ctx.add_store("store-1", "alice@example.com");
    ctx.upstream.seed_order(order_with_tracking(
        101,
        &json!([{ "id": "t-1", "provider": "dhl", "tracking_number": "TN-1", "date_shipped": "2026-08-01" }]),
    ));

    let token = ctx.token_for("alice@example.com");
    let resp = ctx
        .get("/api/orders/101/tracking?storeId=store-1", &token)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let entries: Vec<Value> = resp.json().await.expect("bad body");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["provider"], "dhl");
}

#[tokio::test]
async fn test_append_rewrites_the_whole_array_in_one_update() {
    let ctx = TestContext::spawn().await;
    ctx.add_store("store-1", "alice@example.com");
    ctx.upstream.seed_order(order_with_tracking(
        101,
        &json!([{ "id": "t-1", "provider": "dhl", "tracking_number": "TN-1", "date_shipped": "2026-08-01" }]),
    ));

    let token = ctx.token_for("alice@example.com");
    let resp = ctx
        .post(
            "/api/orders/101/tracking?storeId=store-1",
            &token,
            &json!({
                "provider": "postnl",
                "trackingNumber": "3S456",
                "dateShipped": "2026-08-20",
                "markCompleted": true,
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("bad body");
    assert_eq!(body["success"], true);

    // One update call carried both the slot rewrite and the status.
    let updates = ctx.upstream.order_updates();
    assert_eq!(updates.len(), 1);
    let (order_id, update) = &updates[0];
    assert_eq!(*order_id, 101);
    assert_eq!(update["status"], "completed");

    let slot = &update["meta_data"][0];
    assert_eq!(slot["key"], "tracking_info");
    let encoded = slot["value"].as_str().expect("slot value is a JSON string");
    let entries: Vec<Value> = serde_json::from_str(encoded).expect("slot decodes");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["id"], "t-1");
    assert_eq!(entries[1]["provider"], "postnl");

    // The appended entry is visible on a follow-up read.
    let resp = ctx
        .get("/api/orders/101/tracking?storeId=store-1", &token)
        .await;
    let listed: Vec<Value> = resp.json().await.expect("bad body");
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn test_remove_requires_tracking_id() {
    let ctx = TestContext::spawn().await;
    ctx.add_store("store-1", "alice@example.com");
    ctx.upstream.seed_order(order_with_tracking(101, &json!([])));

    let token = ctx.token_for("alice@example.com");
    let resp = ctx
        .delete("/api/orders/101/tracking?storeId=store-1", &token)
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("bad body");
    assert!(body["error"].as_str().expect("message").contains("trackingId"));
}

#[tokio::test]
async fn test_remove_filters_the_array() {
    let ctx = TestContext::spawn().await;
    ctx.add_store("store-1", "alice@example.com");
    ctx.upstream.seed_order(order_with_tracking(
        101,
        &json!([
            { "id": "t-1", "provider": "dhl", "tracking_number": "TN-1", "date_shipped": "" },
            { "id": "t-2", "provider": "ups", "tracking_number": "1Z", "date_shipped": "" }
        ]),
    ));

    let token = ctx.token_for("alice@example.com");
    let resp = ctx
        .delete(
            "/api/orders/101/tracking?storeId=store-1&trackingId=t-1",
            &token,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ctx
        .get("/api/orders/101/tracking?storeId=store-1", &token)
        .await;
    let entries: Vec<Value> = resp.json().await.expect("bad body");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], "t-2");
}

#[tokio::test]
async fn test_tracking_on_missing_order_is_not_found() {
    let ctx = TestContext::spawn().await;
    ctx.add_store("store-1", "alice@example.com");

    let token = ctx.token_for("alice@example.com");
    let resp = ctx
        .get("/api/orders/404404/tracking?storeId=store-1", &token)
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_listing_degrades_when_upstream_is_unreachable() {
    let ctx = TestContext::spawn().await;
    ctx.add_store("store-1", "alice@example.com");
    ctx.upstream.set_fail_reads(true);

    let token = ctx.token_for("alice@example.com");
    let resp = ctx.get("/api/orders?storeId=store-1", &token).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let orders: Vec<Value> = resp.json().await.expect("bad body");
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["total"], "100");
    assert_eq!(orders[1]["total"], "200");
}
