use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    entities::vendor,
    errors::ServiceError,
    services::vendors::{CreateVendorInput, UpdateVendorInput},
    ApiResponse, AppState,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct VendorListQuery {
    /// Bypass the cached vendor list
    #[serde(default)]
    pub force_refresh: bool,
}

pub fn vendor_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vendors).post(create_vendor))
        .route(
            "/:id",
            get(get_vendor).put(update_vendor).delete(delete_vendor),
        )
}

/// Full vendor list, cache-backed
#[utoipa::path(
    get,
    path = "/api/v1/vendors",
    params(VendorListQuery),
    responses(
        (status = 200, description = "Vendor list returned", body = ApiResponse<serde_json::Value>)
    ),
    tag = "vendors"
)]
pub async fn list_vendors(
    State(state): State<AppState>,
    Query(query): Query<VendorListQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    let (vendors, cache_status) = state.services.vendors.list(query.force_refresh).await?;
    Ok(Json(ApiResponse::success(json!({
        "vendors": vendors,
        "total": vendors.len(),
        "cache": cache_status,
    }))))
}

#[utoipa::path(
    get,
    path = "/api/v1/vendors/{id}",
    params(("id" = Uuid, Path, description = "Vendor id")),
    responses(
        (status = 200, description = "Vendor returned", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Unknown vendor", body = crate::errors::ErrorResponse)
    ),
    tag = "vendors"
)]
pub async fn get_vendor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<vendor::Model>>, ServiceError> {
    let vendor = state.services.vendors.get(id).await?;
    Ok(Json(ApiResponse::success(vendor)))
}

#[utoipa::path(
    post,
    path = "/api/v1/vendors",
    request_body = CreateVendorInput,
    responses(
        (status = 201, description = "Vendor created", body = ApiResponse<serde_json::Value>),
        (status = 409, description = "Name already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "vendors"
)]
pub async fn create_vendor(
    State(state): State<AppState>,
    Json(input): Json<CreateVendorInput>,
) -> Result<(StatusCode, Json<ApiResponse<vendor::Model>>), ServiceError> {
    let created = state.services.vendors.create(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

#[utoipa::path(
    put,
    path = "/api/v1/vendors/{id}",
    params(("id" = Uuid, Path, description = "Vendor id")),
    request_body = UpdateVendorInput,
    responses(
        (status = 200, description = "Vendor updated", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Unknown vendor", body = crate::errors::ErrorResponse)
    ),
    tag = "vendors"
)]
pub async fn update_vendor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateVendorInput>,
) -> Result<Json<ApiResponse<vendor::Model>>, ServiceError> {
    let updated = state.services.vendors.update(id, input).await?;
    Ok(Json(ApiResponse::success(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/vendors/{id}",
    params(("id" = Uuid, Path, description = "Vendor id")),
    responses(
        (status = 200, description = "Vendor deleted"),
        (status = 404, description = "Unknown vendor", body = crate::errors::ErrorResponse)
    ),
    tag = "vendors"
)]
pub async fn delete_vendor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    state.services.vendors.delete(id).await?;
    Ok(Json(ApiResponse::success(json!({ "deleted": id }))))
}
