mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn create_and_fetch_item_by_sku() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory",
            Some(json!({
                "sku": "WIDGET-01",
                "product_name": "Widget",
                "current_stock": 25,
                "cost": "4.50",
                "reorder_point": 10,
                "vendor": "Acme Supply",
                "sales_velocity": "1.5"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(Method::GET, "/api/v1/inventory/WIDGET-01", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let item = &body["data"];
    assert_eq!(item["sku"], "WIDGET-01");
    assert_eq!(item["current_stock"], 25);
    // 25 units at 1.5/day is under 30 days of supply
    assert_eq!(item["stock_status"], "low");
}

#[tokio::test]
async fn duplicate_sku_returns_conflict() {
    let app = TestApp::new().await;
    app.seed_item("DUP-1", 10, 2, dec!(0), None).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory",
            Some(json!({ "sku": "DUP-1", "product_name": "Duplicate" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_sku_is_not_found() {
    let app = TestApp::new().await;
    let response = app
        .request(Method::GET, "/api/v1/inventory/NOPE", None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn list_filters_by_vendor_and_search() {
    let app = TestApp::new().await;
    app.seed_item("AAA-1", 100, 5, dec!(1), Some("Acme")).await;
    app.seed_item("BBB-1", 100, 5, dec!(1), Some("Bolt Co")).await;
    app.seed_item("BBB-2", 100, 5, dec!(1), Some("Bolt Co")).await;

    let response = app
        .request(Method::GET, "/api/v1/inventory?vendor=Bolt%20Co", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], 2);

    let response = app
        .request(Method::GET, "/api/v1/inventory?search=AAA", None)
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["sku"], "AAA-1");
}

#[tokio::test]
async fn list_filters_by_derived_status() {
    let app = TestApp::new().await;
    // Out of stock: critical
    app.seed_item("OUT-1", 0, 5, dec!(1), None).await;
    // Plenty of stock, no velocity, above reorder point: adequate
    app.seed_item("OK-1", 500, 5, dec!(0), None).await;

    let response = app
        .request(Method::GET, "/api/v1/inventory?status=critical", None)
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["sku"], "OUT-1");
}

#[tokio::test]
async fn unfiltered_list_is_cached_until_forced() {
    let app = TestApp::new().await;
    app.seed_item("CACHE-1", 50, 5, dec!(0), None).await;

    // First read populates the snapshot
    let body = body_json(app.request(Method::GET, "/api/v1/inventory", None).await).await;
    assert_eq!(body["data"]["cache"], "miss");
    assert_eq!(body["data"]["total"], 1);

    // Second read hits it
    let body = body_json(app.request(Method::GET, "/api/v1/inventory", None).await).await;
    assert_eq!(body["data"]["cache"], "hit");

    // Seed behind the cache's back; the stale snapshot still serves one item
    app.seed_item("CACHE-2", 50, 5, dec!(0), None).await;
    let body = body_json(app.request(Method::GET, "/api/v1/inventory", None).await).await;
    assert_eq!(body["data"]["total"], 1);

    // force_refresh bypasses and rebuilds
    let body = body_json(
        app.request(Method::GET, "/api/v1/inventory?force_refresh=true", None)
            .await,
    )
    .await;
    assert_eq!(body["data"]["cache"], "miss");
    assert_eq!(body["data"]["total"], 2);
}

#[tokio::test]
async fn update_changes_fields_and_clears_sync_hash() {
    let app = TestApp::new().await;
    app.seed_item("UPD-1", 10, 2, dec!(0), None).await;

    let response = app
        .request(
            Method::PUT,
            "/api/v1/inventory/UPD-1",
            Some(json!({ "current_stock": 0 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["current_stock"], 0);
    assert_eq!(body["data"]["stock_status"], "critical");
}

#[tokio::test]
async fn delete_removes_item() {
    let app = TestApp::new().await;
    app.seed_item("DEL-1", 10, 2, dec!(0), None).await;

    let response = app
        .request(Method::DELETE, "/api/v1/inventory/DEL-1", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(Method::GET, "/api/v1/inventory/DEL-1", None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn summary_counts_statuses_and_value() {
    let app = TestApp::new().await;
    app.seed_item("S-CRIT", 0, 5, dec!(1), None).await;
    app.seed_item("S-LOW", 3, 5, dec!(0), None).await;
    app.seed_item("S-OK", 500, 5, dec!(0), None).await;

    let body = body_json(
        app.request(Method::GET, "/api/v1/inventory/summary", None)
            .await,
    )
    .await;
    let data = &body["data"];
    assert_eq!(data["total_items"], 3);
    assert_eq!(data["critical_count"], 1);
    assert_eq!(data["low_count"], 1);
    assert_eq!(data["adequate_count"], 1);
}

#[tokio::test]
async fn validation_failures_are_bad_requests() {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory",
            Some(json!({ "sku": "", "product_name": "No sku" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
