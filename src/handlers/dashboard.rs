use axum::{
    extract::{Json, Query, State},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

use crate::{
    errors::ServiceError,
    services::dashboard::{PoSummary, SyncTrendPoint, VendorStats},
    ApiResponse, AppState,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct MetricsQuery {
    /// Bypass the cached aggregates
    #[serde(default)]
    pub force_refresh: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CriticalItemsQuery {
    #[serde(default = "default_critical_limit")]
    pub limit: u64,
}

fn default_critical_limit() -> u64 {
    20
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TrendsQuery {
    /// Number of recent sync runs to chart
    #[serde(default = "default_trend_window")]
    pub window: u64,
}

fn default_trend_window() -> u64 {
    50
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LiveUpdatesQuery {
    #[serde(default = "default_updates_limit")]
    pub limit: usize,
}

fn default_updates_limit() -> usize {
    50
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/metrics", get(dashboard_metrics))
        .route("/critical-items", get(critical_items))
        .route("/vendor-stats", get(vendor_stats))
        .route("/po-summary", get(po_summary))
        .route("/trends", get(sync_trends))
        .route("/live-updates", get(live_updates))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/metrics",
    params(MetricsQuery),
    responses(
        (status = 200, description = "Dashboard metrics returned", body = ApiResponse<serde_json::Value>)
    ),
    tag = "dashboard"
)]
pub async fn dashboard_metrics(
    State(state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    let (metrics, cache_status) = state.services.dashboard.metrics(query.force_refresh).await?;
    Ok(Json(ApiResponse::success(json!({
        "metrics": metrics,
        "cache": cache_status,
    }))))
}

/// Items most in need of attention: critical first, then low
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/critical-items",
    params(CriticalItemsQuery),
    responses(
        (status = 200, description = "Critical items returned", body = ApiResponse<serde_json::Value>)
    ),
    tag = "dashboard"
)]
pub async fn critical_items(
    State(state): State<AppState>,
    Query(query): Query<CriticalItemsQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    let (items, cache_status) = state.services.dashboard.critical_items(query.limit).await?;
    Ok(Json(ApiResponse::success(json!({
        "items": items,
        "cache": cache_status,
    }))))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/vendor-stats",
    responses(
        (status = 200, description = "Per-vendor stats returned", body = ApiResponse<Vec<VendorStats>>)
    ),
    tag = "dashboard"
)]
pub async fn vendor_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<VendorStats>>>, ServiceError> {
    let stats = state.services.dashboard.vendor_stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/po-summary",
    responses(
        (status = 200, description = "Purchase order summary returned", body = ApiResponse<PoSummary>)
    ),
    tag = "dashboard"
)]
pub async fn po_summary(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PoSummary>>, ServiceError> {
    let summary = state.services.dashboard.po_summary().await?;
    Ok(Json(ApiResponse::success(summary)))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/trends",
    params(TrendsQuery),
    responses(
        (status = 200, description = "Sync trend points returned", body = ApiResponse<Vec<SyncTrendPoint>>)
    ),
    tag = "dashboard"
)]
pub async fn sync_trends(
    State(state): State<AppState>,
    Query(query): Query<TrendsQuery>,
) -> Result<Json<ApiResponse<Vec<SyncTrendPoint>>>, ServiceError> {
    let points = state.services.dashboard.trends(query.window).await?;
    Ok(Json(ApiResponse::success(points)))
}

/// Most recent domain events, newest first
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/live-updates",
    params(LiveUpdatesQuery),
    responses(
        (status = 200, description = "Recent events returned", body = ApiResponse<serde_json::Value>)
    ),
    tag = "dashboard"
)]
pub async fn live_updates(
    State(state): State<AppState>,
    Query(query): Query<LiveUpdatesQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    let events = state.services.dashboard.live_updates(query.limit);
    Ok(Json(ApiResponse::success(json!({ "events": events }))))
}
