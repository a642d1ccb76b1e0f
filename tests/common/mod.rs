use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    middleware,
    routing::get,
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set};
use serde_json::Value;
use stocksync_api::{
    cache::{CacheHandle, InMemoryCache},
    config::AppConfig,
    db,
    entities::inventory_item,
    events::{self, EventSender, RecentEvents},
    handlers::AppServices,
    request_id::request_id_middleware,
    AppState,
};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

/// Helper harness for spinning up an application backed by a throwaway
/// SQLite database. The cache is always in-memory; no Redis is needed.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
    _db_dir: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Construct a test application after tweaking the config, e.g. to point
    /// the Finale client at a mock server.
    pub async fn with_config(tweak: impl FnOnce(&mut AppConfig)) -> Self {
        let db_dir = TempDir::new().expect("create temp dir for test database");
        let db_path = db_dir.path().join("stocksync_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "redis://127.0.0.1:6379".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        tweak(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db_arc = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let recent_events = RecentEvents::new();
        let event_task = tokio::spawn(events::process_events(event_rx, recent_events.clone()));

        let cache = CacheHandle::new(Arc::new(InMemoryCache::new()), cfg.cache.clone());
        let services = AppServices::new(
            db_arc.clone(),
            cache.clone(),
            event_sender.clone(),
            recent_events.clone(),
            cfg.clone(),
        );

        let state = AppState {
            db: db_arc,
            config: cfg.clone(),
            event_sender,
            services,
            cache,
            recent_events,
            redis: None,
        };

        let router = Router::new()
            .route("/status", get(stocksync_api::api_status))
            .route("/health", get(stocksync_api::health_check))
            .nest("/api/v1", stocksync_api::api_v1_routes())
            .layer(middleware::from_fn(request_id_middleware))
            .with_state(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
            _db_dir: db_dir,
        }
    }

    /// Send a JSON request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Insert an inventory row directly, bypassing the API.
    pub async fn seed_item(
        &self,
        sku: &str,
        stock: i32,
        reorder_point: i32,
        velocity: Decimal,
        vendor: Option<&str>,
    ) -> inventory_item::Model {
        let now = Utc::now().naive_utc();
        let model = inventory_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(sku.to_string()),
            product_name: Set(format!("Test item {}", sku)),
            current_stock: Set(stock),
            cost: Set(Some(Decimal::new(1050, 2))),
            reorder_point: Set(reorder_point),
            vendor: Set(vendor.map(str::to_string)),
            location: Set(Some("Main".to_string())),
            sales_velocity: Set(velocity),
            content_hash: Set(None),
            last_synced: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        model
            .insert(&*self.state.db)
            .await
            .expect("seed inventory item")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Read a response body as JSON.
pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}
