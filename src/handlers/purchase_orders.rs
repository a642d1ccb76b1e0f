use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    entities::purchase_order,
    errors::ServiceError,
    services::purchase_orders::{
        CreatePurchaseOrderInput, GenerateMode, PoListParams, PoStatus, UpdatePurchaseOrderInput,
    },
    ApiResponse, AppState, PaginatedResponse,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct PoListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub status: Option<PoStatus>,
    pub vendor: Option<String>,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct GenerateRequest {
    /// Qualifying-item mode: "out_of_stock" or "reorder_needed" (default)
    #[serde(default, rename = "type")]
    pub mode: GenerateMode,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ReceiveRequest {
    /// Marks the receipt as partial; the order stays open
    #[serde(default)]
    pub partial: bool,
}

pub fn purchase_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_purchase_orders).post(create_purchase_order))
        .route("/generate", post(generate_purchase_orders))
        .route("/:id", get(get_purchase_order).put(update_purchase_order))
        .route("/:id/submit", post(submit_purchase_order))
        .route("/:id/approve", post(approve_purchase_order))
        .route("/:id/send", post(send_purchase_order))
        .route("/:id/receive", post(receive_purchase_order))
        .route("/:id/cancel", post(cancel_purchase_order))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders",
    params(PoListQuery),
    responses(
        (status = 200, description = "Purchase orders returned", body = ApiResponse<serde_json::Value>)
    ),
    tag = "purchase-orders"
)]
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    Query(query): Query<PoListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<purchase_order::Model>>>, ServiceError> {
    let params = PoListParams {
        page: query.page,
        limit: query.limit,
        status: query.status,
        vendor_name: query.vendor,
    };
    let (rows, total) = state.services.purchase_orders.list(&params).await?;
    let limit = params.limit.clamp(1, 200);
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items: rows,
        total,
        page: params.page.max(1),
        limit,
        total_pages: total.div_ceil(limit),
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/{id}",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    responses(
        (status = 200, description = "Purchase order returned", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Unknown purchase order", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn get_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<purchase_order::Model>>, ServiceError> {
    let order = state.services.purchase_orders.get(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders",
    request_body = CreatePurchaseOrderInput,
    responses(
        (status = 201, description = "Purchase order created", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn create_purchase_order(
    State(state): State<AppState>,
    Json(input): Json<CreatePurchaseOrderInput>,
) -> Result<(StatusCode, Json<ApiResponse<purchase_order::Model>>), ServiceError> {
    let created = state.services.purchase_orders.create(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

#[utoipa::path(
    put,
    path = "/api/v1/purchase-orders/{id}",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    request_body = UpdatePurchaseOrderInput,
    responses(
        (status = 200, description = "Purchase order updated", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Not editable in its current status", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn update_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdatePurchaseOrderInput>,
) -> Result<Json<ApiResponse<purchase_order::Model>>, ServiceError> {
    let updated = state.services.purchase_orders.update(id, input).await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// One draft order per vendor covering qualifying items. The optional body
/// narrows qualification to out-of-stock items only.
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/generate",
    request_body = GenerateRequest,
    responses(
        (status = 201, description = "Draft orders generated", body = ApiResponse<serde_json::Value>)
    ),
    tag = "purchase-orders"
)]
pub async fn generate_purchase_orders(
    State(state): State<AppState>,
    body: Option<Json<GenerateRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<serde_json::Value>>), ServiceError> {
    let mode = body.map(|Json(b)| b.mode).unwrap_or_default();
    let created = state.services.purchase_orders.generate(mode).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(json!({
            "created": created.len(),
            "orders": created,
        }))),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/submit",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    responses(
        (status = 200, description = "Submitted for approval", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid transition", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn submit_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<purchase_order::Model>>, ServiceError> {
    let order = state.services.purchase_orders.submit(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/approve",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    responses(
        (status = 200, description = "Approved", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid transition", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn approve_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<purchase_order::Model>>, ServiceError> {
    let order = state.services.purchase_orders.approve(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Marks the order sent and pushes it to Finale
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/send",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    responses(
        (status = 200, description = "Sent", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid transition", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn send_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<purchase_order::Model>>, ServiceError> {
    let order = state.services.purchase_orders.send(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/receive",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    request_body = ReceiveRequest,
    responses(
        (status = 200, description = "Receipt recorded", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid transition", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn receive_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<ReceiveRequest>>,
) -> Result<Json<ApiResponse<purchase_order::Model>>, ServiceError> {
    let partial = body.map(|Json(b)| b.partial).unwrap_or(false);
    let order = state.services.purchase_orders.receive(id, partial).await?;
    Ok(Json(ApiResponse::success(order)))
}

#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    responses(
        (status = 200, description = "Cancelled", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Already closed", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn cancel_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<purchase_order::Model>>, ServiceError> {
    let order = state.services.purchase_orders.cancel(id).await?;
    Ok(Json(ApiResponse::success(order)))
}
