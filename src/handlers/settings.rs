use axum::{
    extract::{Json, State},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tracing::info;

use crate::{
    entities::setting,
    errors::ServiceError,
    services::settings::UpdateSettingsInput,
    ApiResponse, AppState,
};

pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_settings).put(update_settings))
        .route("/clear-cache", post(clear_cache))
}

/// Current settings. The Finale API secret is never serialized back out.
#[utoipa::path(
    get,
    path = "/api/v1/settings",
    responses(
        (status = 200, description = "Settings returned", body = ApiResponse<serde_json::Value>)
    ),
    tag = "settings"
)]
pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<setting::Model>>, ServiceError> {
    let settings = state.services.settings.get().await?;
    Ok(Json(ApiResponse::success(settings)))
}

#[utoipa::path(
    put,
    path = "/api/v1/settings",
    request_body = UpdateSettingsInput,
    responses(
        (status = 200, description = "Settings updated", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid values", body = crate::errors::ErrorResponse)
    ),
    tag = "settings"
)]
pub async fn update_settings(
    State(state): State<AppState>,
    Json(input): Json<UpdateSettingsInput>,
) -> Result<Json<ApiResponse<setting::Model>>, ServiceError> {
    let updated = state.services.settings.update(input).await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Drops every cached snapshot and aggregate; the next reads rebuild them.
#[utoipa::path(
    post,
    path = "/api/v1/settings/clear-cache",
    responses(
        (status = 200, description = "Cache cleared", body = ApiResponse<serde_json::Value>)
    ),
    tag = "settings"
)]
pub async fn clear_cache(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    state.cache.clear().await?;
    info!("Cache cleared by request");
    Ok(Json(ApiResponse::success(json!({ "cleared": true }))))
}
