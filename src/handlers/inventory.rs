use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

use crate::{
    errors::ServiceError,
    services::inventory::{
        CreateItemInput, InventoryItemView, InventoryListParams, InventoryPage, InventorySummary,
        UpdateItemInput,
    },
    stock_status::StockStatusLevel,
    ApiResponse, AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct InventoryQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Derived status filter: critical, low, adequate or overstocked
    pub status: Option<StockStatusLevel>,
    pub vendor: Option<String>,
    pub location: Option<String>,
    /// Matches sku or product name
    pub search: Option<String>,
    pub sort_by: Option<String>,
    /// "asc" (default) or "desc"
    pub sort_order: Option<String>,
    /// Bypass the cached snapshot
    #[serde(default)]
    pub force_refresh: bool,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    50
}

impl InventoryQuery {
    fn has_filters(&self) -> bool {
        self.status.is_some()
            || self.vendor.is_some()
            || self.location.is_some()
            || self.search.is_some()
            || self.sort_by.is_some()
            || self.sort_order.is_some()
    }

    fn into_params(self) -> InventoryListParams {
        InventoryListParams {
            page: self.page,
            limit: self.limit,
            status: self.status,
            vendor: self.vendor,
            location: self.location,
            search: self.search,
            sort_by: self.sort_by,
            sort_descending: matches!(self.sort_order.as_deref(), Some("desc")),
        }
    }
}

pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_inventory).post(create_item))
        .route("/summary", get(inventory_summary))
        .route(
            "/:sku",
            get(get_item).put(update_item).delete(delete_item),
        )
}

/// List inventory with filtering, sorting and pagination. The unfiltered
/// listing is served from the cached snapshot.
#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(InventoryQuery),
    responses(
        (status = 200, description = "Inventory page returned", body = ApiResponse<serde_json::Value>)
    ),
    tag = "inventory"
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(query): Query<InventoryQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    let service = &state.services.inventory;

    if !query.has_filters() {
        let (all, cache_status) = service.full_snapshot(query.force_refresh).await?;
        let page = query.page.max(1);
        let limit = query.limit.clamp(1, 500);
        let total = all.len() as u64;
        let items: Vec<&InventoryItemView> = all
            .iter()
            .skip(((page - 1) * limit) as usize)
            .take(limit as usize)
            .collect();
        return Ok(Json(ApiResponse::success(json!({
            "items": items,
            "total": total,
            "page": page,
            "limit": limit,
            "cache": cache_status,
        }))));
    }

    let page: InventoryPage = service.list(&query.into_params()).await?;
    Ok(Json(ApiResponse::success(json!({
        "items": page.items,
        "total": page.total,
        "page": page.page,
        "limit": page.limit,
        "cache": crate::cache::CacheStatus::Miss,
    }))))
}

/// Status counts and total value across all items
#[utoipa::path(
    get,
    path = "/api/v1/inventory/summary",
    responses((status = 200, description = "Summary returned", body = ApiResponse<InventorySummary>)),
    tag = "inventory"
)]
pub async fn inventory_summary(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<InventorySummary>>, ServiceError> {
    let summary = state.services.inventory.summary().await?;
    Ok(Json(ApiResponse::success(summary)))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/{sku}",
    params(("sku" = String, Path, description = "Item sku")),
    responses(
        (status = 200, description = "Item returned", body = ApiResponse<InventoryItemView>),
        (status = 404, description = "Unknown sku", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> Result<Json<ApiResponse<InventoryItemView>>, ServiceError> {
    let item = state.services.inventory.get_by_sku(&sku).await?;
    Ok(Json(ApiResponse::success(item)))
}

#[utoipa::path(
    post,
    path = "/api/v1/inventory",
    request_body = CreateItemInput,
    responses(
        (status = 201, description = "Item created", body = ApiResponse<InventoryItemView>),
        (status = 409, description = "Sku already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn create_item(
    State(state): State<AppState>,
    Json(input): Json<CreateItemInput>,
) -> Result<(StatusCode, Json<ApiResponse<InventoryItemView>>), ServiceError> {
    let created = state.services.inventory.create(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

#[utoipa::path(
    put,
    path = "/api/v1/inventory/{sku}",
    params(("sku" = String, Path, description = "Item sku")),
    request_body = UpdateItemInput,
    responses(
        (status = 200, description = "Item updated", body = ApiResponse<InventoryItemView>),
        (status = 404, description = "Unknown sku", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(sku): Path<String>,
    Json(input): Json<UpdateItemInput>,
) -> Result<Json<ApiResponse<InventoryItemView>>, ServiceError> {
    let updated = state.services.inventory.update_by_sku(&sku, input).await?;
    Ok(Json(ApiResponse::success(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/inventory/{sku}",
    params(("sku" = String, Path, description = "Item sku")),
    responses(
        (status = 200, description = "Item deleted"),
        (status = 404, description = "Unknown sku", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    state.services.inventory.delete_by_sku(&sku).await?;
    Ok(Json(ApiResponse::success(json!({ "deleted": sku }))))
}
