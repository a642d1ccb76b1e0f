use axum::{
    extract::{Json, Query, State},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    errors::ServiceError,
    sync::{SyncRunReport, SyncType},
    ApiResponse, AppState, PaginatedResponse,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct TriggerSyncRequest {
    pub sync_type: SyncType,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SyncHistoryQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

pub fn sync_routes() -> Router<AppState> {
    Router::new()
        .route("/trigger", post(trigger_sync))
        .route("/status", get(sync_status))
        .route("/health", get(sync_health))
        .route("/history", get(sync_history))
        .route("/metrics", get(sync_metrics))
}

/// Runs a sync to completion. A second trigger while one of the same type is
/// in flight returns 409.
#[utoipa::path(
    post,
    path = "/api/v1/sync/trigger",
    request_body = TriggerSyncRequest,
    responses(
        (status = 200, description = "Sync finished", body = ApiResponse<SyncRunReport>),
        (status = 409, description = "Sync already running", body = crate::errors::ErrorResponse),
        (status = 502, description = "Finale unreachable", body = crate::errors::ErrorResponse)
    ),
    tag = "sync"
)]
pub async fn trigger_sync(
    State(state): State<AppState>,
    Json(request): Json<TriggerSyncRequest>,
) -> Result<Json<ApiResponse<SyncRunReport>>, ServiceError> {
    let report = match request.sync_type {
        SyncType::Inventory => state.services.sync.run_inventory_sync().await?,
        SyncType::Vendors => state.services.sync.run_vendor_sync().await?,
    };
    Ok(Json(ApiResponse::success(report)))
}

/// Latest run per sync type
#[utoipa::path(
    get,
    path = "/api/v1/sync/status",
    responses(
        (status = 200, description = "Status returned", body = ApiResponse<serde_json::Value>)
    ),
    tag = "sync"
)]
pub async fn sync_status(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    let status = state.services.sync.status().await?;
    Ok(Json(ApiResponse::success(status)))
}

/// Sweeps stuck runs, then reports overall sync health
#[utoipa::path(
    get,
    path = "/api/v1/sync/health",
    responses(
        (status = 200, description = "Health returned", body = ApiResponse<serde_json::Value>)
    ),
    tag = "sync"
)]
pub async fn sync_health(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    let health = state.services.sync.health().await?;
    Ok(Json(ApiResponse::success(health)))
}

#[utoipa::path(
    get,
    path = "/api/v1/sync/history",
    params(SyncHistoryQuery),
    responses(
        (status = 200, description = "Run history returned", body = ApiResponse<serde_json::Value>)
    ),
    tag = "sync"
)]
pub async fn sync_history(
    State(state): State<AppState>,
    Query(query): Query<SyncHistoryQuery>,
) -> Result<
    Json<ApiResponse<PaginatedResponse<crate::entities::sync_log::Model>>>,
    ServiceError,
> {
    let limit = query.limit.clamp(1, 200);
    let (rows, total) = state.services.sync.history(query.page, limit).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items: rows,
        total,
        page: query.page.max(1),
        limit,
        total_pages: total.div_ceil(limit),
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/sync/metrics",
    responses(
        (status = 200, description = "Aggregate run metrics returned", body = ApiResponse<serde_json::Value>)
    ),
    tag = "sync"
)]
pub async fn sync_metrics(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    let metrics = state.services.sync.metrics().await?;
    Ok(Json(ApiResponse::success(metrics)))
}