mod common;

use std::time::Duration;

use axum::http::{Method, StatusCode};
use chrono::Utc;
use common::{body_json, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ActiveValue::Set};
use serde_json::json;
use stocksync_api::entities::sync_log;
use uuid::Uuid;

#[tokio::test]
async fn settings_row_is_created_with_defaults_on_first_read() {
    let app = TestApp::new().await;
    let body = body_json(app.request(Method::GET, "/api/v1/settings", None).await).await;

    let data = &body["data"];
    assert_eq!(data["sync_enabled"], true);
    assert_eq!(data["sync_frequency_minutes"], 60);
    assert_eq!(data["low_stock_alerts"], true);
    assert!(data["last_sync_time"].is_null());
    // The API secret never serializes back out
    assert!(data.get("finale_api_secret").is_none());
}

#[tokio::test]
async fn settings_updates_are_partial_and_persisted() {
    let app = TestApp::new().await;

    let updated = body_json(
        app.request(
            Method::PUT,
            "/api/v1/settings",
            Some(json!({
                "sync_frequency_minutes": 30,
                "finale_account_path": "myco",
                "finale_api_key": "key",
                "finale_api_secret": "secret"
            })),
        )
        .await,
    )
    .await;
    assert_eq!(updated["data"]["sync_frequency_minutes"], 30);
    assert_eq!(updated["data"]["finale_account_path"], "myco");
    assert!(updated["data"].get("finale_api_secret").is_none());

    // Untouched fields survive the partial update
    let fetched = body_json(app.request(Method::GET, "/api/v1/settings", None).await).await;
    assert_eq!(fetched["data"]["sync_frequency_minutes"], 30);
    assert_eq!(fetched["data"]["sync_enabled"], true);
    assert_eq!(fetched["data"]["finale_api_key"], "key");
}

#[tokio::test]
async fn settings_rejects_out_of_range_values() {
    let app = TestApp::new().await;

    for payload in [
        json!({ "sync_frequency_minutes": 2 }),
        json!({ "sync_frequency_minutes": 2000 }),
        json!({ "stuck_sync_timeout_minutes": 1 }),
        json!({ "finale_api_key": "" }),
    ] {
        let response = app
            .request(Method::PUT, "/api/v1/settings", Some(payload.clone()))
            .await;
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "payload {payload}"
        );
    }
}

#[tokio::test]
async fn dashboard_metrics_aggregate_and_cache() {
    let app = TestApp::new().await;
    app.seed_item("CRIT-1", 0, 5, dec!(0), Some("Acme")).await;
    app.seed_item("LOW-1", 3, 5, dec!(0), Some("Acme")).await;
    app.seed_item("OK-1", 100, 5, dec!(0), Some("Bolt Co")).await;

    let body = body_json(
        app.request(Method::GET, "/api/v1/dashboard/metrics", None)
            .await,
    )
    .await;
    assert_eq!(body["data"]["cache"], "miss");
    let metrics = &body["data"]["metrics"];
    assert_eq!(metrics["total_items"], 3);
    assert_eq!(metrics["critical_count"], 1);
    assert_eq!(metrics["low_count"], 1);
    assert_eq!(metrics["adequate_count"], 1);
    assert_eq!(metrics["overstocked_count"], 0);
    assert_eq!(metrics["open_purchase_orders"], 0);
    // Seeded items cost 10.50 each
    let value: Decimal = metrics["total_inventory_value"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(value, dec!(1081.50));

    // Writes that bypass the service are invisible until a forced refresh
    app.seed_item("CRIT-2", 0, 5, dec!(0), None).await;
    let cached = body_json(
        app.request(Method::GET, "/api/v1/dashboard/metrics", None)
            .await,
    )
    .await;
    assert_eq!(cached["data"]["cache"], "hit");
    assert_eq!(cached["data"]["metrics"]["total_items"], 3);

    let fresh = body_json(
        app.request(
            Method::GET,
            "/api/v1/dashboard/metrics?force_refresh=true",
            None,
        )
        .await,
    )
    .await;
    assert_eq!(fresh["data"]["cache"], "miss");
    assert_eq!(fresh["data"]["metrics"]["total_items"], 4);
}

#[tokio::test]
async fn clear_cache_forces_the_next_read_to_recompute() {
    let app = TestApp::new().await;
    app.seed_item("OK-1", 100, 5, dec!(0), None).await;

    body_json(
        app.request(Method::GET, "/api/v1/dashboard/metrics", None)
            .await,
    )
    .await;
    let cached = body_json(
        app.request(Method::GET, "/api/v1/dashboard/metrics", None)
            .await,
    )
    .await;
    assert_eq!(cached["data"]["cache"], "hit");

    let cleared = body_json(
        app.request(Method::POST, "/api/v1/settings/clear-cache", None)
            .await,
    )
    .await;
    assert_eq!(cleared["data"]["cleared"], true);

    let fresh = body_json(
        app.request(Method::GET, "/api/v1/dashboard/metrics", None)
            .await,
    )
    .await;
    assert_eq!(fresh["data"]["cache"], "miss");
}

#[tokio::test]
async fn critical_items_rank_worst_first() {
    let app = TestApp::new().await;
    // One day of supply left
    app.seed_item("CRIT-SOON", 2, 5, dec!(2.0), Some("Acme")).await;
    // Out of stock, no velocity
    app.seed_item("CRIT-OUT", 0, 5, dec!(0), Some("Acme")).await;
    app.seed_item("LOW-1", 4, 5, dec!(0), Some("Acme")).await;
    app.seed_item("OK-1", 100, 5, dec!(0), Some("Acme")).await;

    let body = body_json(
        app.request(Method::GET, "/api/v1/dashboard/critical-items", None)
            .await,
    )
    .await;
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["sku"], "CRIT-SOON");
    assert_eq!(items[1]["sku"], "CRIT-OUT");
    assert_eq!(items[2]["sku"], "LOW-1");

    let limited = body_json(
        app.request(Method::GET, "/api/v1/dashboard/critical-items?limit=1", None)
            .await,
    )
    .await;
    assert_eq!(limited["data"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn vendor_stats_group_by_vendor() {
    let app = TestApp::new().await;
    app.seed_item("A-1", 2, 5, dec!(0), Some("Acme")).await;
    app.seed_item("A-2", 50, 5, dec!(0), Some("Acme")).await;
    app.seed_item("B-1", 10, 5, dec!(0), Some("Bolt Co")).await;
    app.seed_item("NOVENDOR", 10, 5, dec!(0), None).await;

    let body = body_json(
        app.request(Method::GET, "/api/v1/dashboard/vendor-stats", None)
            .await,
    )
    .await;
    let stats = body["data"].as_array().unwrap();
    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0]["vendor"], "Acme");
    assert_eq!(stats[0]["item_count"], 2);
    assert_eq!(stats[0]["items_below_reorder"], 1);
    assert_eq!(stats[1]["vendor"], "Bolt Co");
    assert_eq!(stats[1]["item_count"], 1);
}

#[tokio::test]
async fn po_summary_counts_open_orders() {
    let app = TestApp::new().await;
    let order = json!({
        "vendor_name": "Acme",
        "items": [
            { "sku": "S-1", "product_name": "Widget", "quantity": 2, "unit_cost": "10.00" }
        ]
    });
    let first = body_json(
        app.request(Method::POST, "/api/v1/purchase-orders", Some(order.clone()))
            .await,
    )
    .await;
    body_json(
        app.request(Method::POST, "/api/v1/purchase-orders", Some(order))
            .await,
    )
    .await;
    app.request(
        Method::POST,
        &format!(
            "/api/v1/purchase-orders/{}/cancel",
            first["data"]["id"].as_str().unwrap()
        ),
        None,
    )
    .await;

    let body = body_json(
        app.request(Method::GET, "/api/v1/dashboard/po-summary", None)
            .await,
    )
    .await;
    assert_eq!(body["data"]["by_status"]["draft"], 1);
    assert_eq!(body["data"]["by_status"]["cancelled"], 1);
    assert_eq!(body["data"]["open_count"], 1);
    let open_total: Decimal = body["data"]["open_total_amount"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(open_total, dec!(20.00));
}

#[tokio::test]
async fn trends_return_runs_oldest_first() {
    let app = TestApp::new().await;
    for (offset_minutes, status) in [(30i64, "success"), (10, "error")] {
        let row = sync_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            sync_type: Set("inventory".to_string()),
            status: Set(status.to_string()),
            running_marker: Set(None),
            items_processed: Set(5),
            items_updated: Set(3),
            duration_ms: Set(Some(1200)),
            errors: Set(None),
            metadata: Set(None),
            started_at: Set(Utc::now().naive_utc() - chrono::Duration::minutes(offset_minutes)),
            completed_at: Set(Some(Utc::now().naive_utc())),
        };
        row.insert(&*app.state.db).await.unwrap();
    }

    let body = body_json(
        app.request(Method::GET, "/api/v1/dashboard/trends", None)
            .await,
    )
    .await;
    let points = body["data"].as_array().unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points[0]["status"], "success");
    assert_eq!(points[1]["status"], "error");
}

#[tokio::test]
async fn live_updates_surface_recent_events() {
    let app = TestApp::new().await;
    let created = body_json(
        app.request(
            Method::POST,
            "/api/v1/purchase-orders",
            Some(json!({
                "vendor_name": "Acme",
                "items": [
                    { "sku": "S-1", "product_name": "Widget", "quantity": 1, "unit_cost": "1.00" }
                ]
            })),
        )
        .await,
    )
    .await;
    let order_number = created["data"]["order_number"].as_str().unwrap();

    // The event loop drains the channel asynchronously
    tokio::time::sleep(Duration::from_millis(100)).await;

    let body = body_json(
        app.request(Method::GET, "/api/v1/dashboard/live-updates", None)
            .await,
    )
    .await;
    let events = body["data"]["events"].as_array().unwrap();
    assert!(!events.is_empty());
    assert!(events
        .iter()
        .any(|e| e["summary"].as_str().unwrap_or_default().contains(order_number)));
}
