mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

fn two_line_order() -> Value {
    json!({
        "vendor_name": "Acme",
        "items": [
            { "sku": "SKU-1", "product_name": "Widget", "quantity": 10, "unit_cost": "12.50" },
            { "sku": "SKU-2", "product_name": "Bolt", "quantity": 3, "unit_cost": "4.25" }
        ]
    })
}

fn total_of(order: &Value) -> Decimal {
    order["total_amount"]
        .as_str()
        .expect("total_amount serializes as a decimal string")
        .parse()
        .unwrap()
}

async fn create_order(app: &TestApp, body: Value) -> Value {
    let response = app
        .request(Method::POST, "/api/v1/purchase-orders", Some(body))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

async fn post_action(app: &TestApp, id: &str, action: &str) -> axum::response::Response {
    app.request(
        Method::POST,
        &format!("/api/v1/purchase-orders/{}/{}", id, action),
        None,
    )
    .await
}

#[tokio::test]
async fn create_computes_total_and_starts_as_draft() {
    let app = TestApp::new().await;
    let order = create_order(&app, two_line_order()).await;

    assert_eq!(order["status"], "draft");
    assert_eq!(order["vendor_name"], "Acme");
    assert_eq!(total_of(&order), dec!(137.75));
    assert!(order["order_number"].as_str().unwrap().starts_with("PO-"));

    let fetched = body_json(
        app.request(
            Method::GET,
            &format!("/api/v1/purchase-orders/{}", order["id"].as_str().unwrap()),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(fetched["data"]["order_number"], order["order_number"]);
}

#[tokio::test]
async fn create_rejects_empty_and_invalid_line_items() {
    let app = TestApp::new().await;

    let empty = app
        .request(
            Method::POST,
            "/api/v1/purchase-orders",
            Some(json!({ "vendor_name": "Acme", "items": [] })),
        )
        .await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

    let zero_qty = app
        .request(
            Method::POST,
            "/api/v1/purchase-orders",
            Some(json!({
                "vendor_name": "Acme",
                "items": [{ "sku": "S", "product_name": "P", "quantity": 0, "unit_cost": "1.00" }]
            })),
        )
        .await;
    assert_eq!(zero_qty.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn lifecycle_runs_draft_to_received() {
    let app = TestApp::new().await;
    let order = create_order(&app, two_line_order()).await;
    let id = order["id"].as_str().unwrap().to_string();

    let submitted = body_json(post_action(&app, &id, "submit").await).await;
    assert_eq!(submitted["data"]["status"], "pending_approval");

    let approved = body_json(post_action(&app, &id, "approve").await).await;
    assert_eq!(approved["data"]["status"], "approved");

    // No Finale credentials are configured, so the push fails quietly and the
    // order still moves to sent
    let sent = body_json(post_action(&app, &id, "send").await).await;
    assert_eq!(sent["data"]["status"], "sent");
    assert!(sent["data"]["finale_order_id"].is_null());

    let partial = body_json(
        app.request(
            Method::POST,
            &format!("/api/v1/purchase-orders/{}/receive", id),
            Some(json!({ "partial": true })),
        )
        .await,
    )
    .await;
    assert_eq!(partial["data"]["status"], "partial");

    let received = body_json(post_action(&app, &id, "receive").await).await;
    assert_eq!(received["data"]["status"], "received");
}

#[tokio::test]
async fn out_of_order_transitions_are_rejected() {
    let app = TestApp::new().await;
    let order = create_order(&app, two_line_order()).await;
    let id = order["id"].as_str().unwrap().to_string();

    // Draft cannot be approved, sent, or received directly
    for action in ["approve", "send", "receive"] {
        let response = post_action(&app, &id, action).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "action {action}");
    }

    // A received order cannot be cancelled
    post_action(&app, &id, "submit").await;
    post_action(&app, &id, "approve").await;
    post_action(&app, &id, "send").await;
    post_action(&app, &id, "receive").await;
    let cancel = post_action(&app, &id, "cancel").await;
    assert_eq!(cancel.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cancel_closes_an_open_order() {
    let app = TestApp::new().await;
    let order = create_order(&app, two_line_order()).await;
    let id = order["id"].as_str().unwrap().to_string();

    post_action(&app, &id, "submit").await;
    let cancelled = body_json(post_action(&app, &id, "cancel").await).await;
    assert_eq!(cancelled["data"]["status"], "cancelled");
}

#[tokio::test]
async fn update_recomputes_total_only_before_approval() {
    let app = TestApp::new().await;
    let order = create_order(&app, two_line_order()).await;
    let id = order["id"].as_str().unwrap().to_string();

    let updated = body_json(
        app.request(
            Method::PUT,
            &format!("/api/v1/purchase-orders/{}", id),
            Some(json!({
                "items": [
                    { "sku": "SKU-1", "product_name": "Widget", "quantity": 4, "unit_cost": "2.00" }
                ],
                "notes": "trimmed"
            })),
        )
        .await,
    )
    .await;
    assert_eq!(total_of(&updated["data"]), dec!(8.00));
    assert_eq!(updated["data"]["notes"], "trimmed");

    post_action(&app, &id, "submit").await;
    post_action(&app, &id, "approve").await;
    let locked = app
        .request(
            Method::PUT,
            &format!("/api/v1/purchase-orders/{}", id),
            Some(json!({ "notes": "too late" })),
        )
        .await;
    assert_eq!(locked.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_filters_by_status_and_vendor() {
    let app = TestApp::new().await;
    let first = create_order(&app, two_line_order()).await;
    create_order(
        &app,
        json!({
            "vendor_name": "Bolt Co",
            "items": [
                { "sku": "SKU-3", "product_name": "Gear", "quantity": 1, "unit_cost": "5.00" }
            ]
        }),
    )
    .await;
    post_action(&app, first["id"].as_str().unwrap(), "submit").await;

    let drafts = body_json(
        app.request(Method::GET, "/api/v1/purchase-orders?status=draft", None)
            .await,
    )
    .await;
    assert_eq!(drafts["data"]["total"], 1);
    assert_eq!(drafts["data"]["items"][0]["vendor_name"], "Bolt Co");

    let acme = body_json(
        app.request(Method::GET, "/api/v1/purchase-orders?vendor=Acme", None)
            .await,
    )
    .await;
    assert_eq!(acme["data"]["total"], 1);
    assert_eq!(acme["data"]["items"][0]["status"], "pending_approval");
}

#[tokio::test]
async fn generate_builds_one_draft_per_vendor_with_restock_quantities() {
    let app = TestApp::new().await;
    app.seed_item("LOW-1", 2, 5, dec!(0), Some("Acme")).await;
    app.seed_item("LOW-2", 0, 4, dec!(0), Some("Acme")).await;
    app.seed_item("LOW-3", 1, 3, dec!(0), Some("Bolt Co")).await;
    app.seed_item("OK-1", 100, 5, dec!(0), Some("Acme")).await;

    let response = app
        .request(Method::POST, "/api/v1/purchase-orders/generate", None)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["created"], 2);

    let orders = body["data"]["orders"].as_array().unwrap();
    // Vendors come back in name order
    assert_eq!(orders[0]["vendor_name"], "Acme");
    assert_eq!(orders[1]["vendor_name"], "Bolt Co");
    assert_eq!(orders[0]["status"], "draft");

    // Quantity restocks to twice the reorder point
    let acme_items = orders[0]["items"].as_array().unwrap();
    assert_eq!(acme_items.len(), 2);
    let qty_by_sku: Vec<(&str, i64)> = acme_items
        .iter()
        .map(|i| (i["sku"].as_str().unwrap(), i["quantity"].as_i64().unwrap()))
        .collect();
    assert!(qty_by_sku.contains(&("LOW-1", 8)));
    assert!(qty_by_sku.contains(&("LOW-2", 8)));
}

#[tokio::test]
async fn generate_out_of_stock_mode_skips_low_stock_items() {
    let app = TestApp::new().await;
    app.seed_item("OUT-1", 0, 5, dec!(0), Some("Acme")).await;
    app.seed_item("LOW-1", 2, 5, dec!(0), Some("Acme")).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/purchase-orders/generate",
            Some(json!({ "type": "out_of_stock" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["created"], 1);

    // LOW-1 is below its reorder point but still in stock, so it stays out
    let items = body["data"]["orders"][0]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["sku"], "OUT-1");
}

#[tokio::test]
async fn unknown_purchase_order_is_not_found() {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::GET,
            "/api/v1/purchase-orders/00000000-0000-0000-0000-000000000000",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
