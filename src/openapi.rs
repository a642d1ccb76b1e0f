use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "StockSync API",
        version = "1.0.0",
        description = r#"
# StockSync Inventory Management API

Backend for an inventory and purchase-order dashboard synced from Finale
Inventory.

## Features

- **Inventory**: Filtered, sorted, paginated item listings with derived
  stock status and cached full snapshots
- **Purchase Orders**: Draft-to-received lifecycle with audit logging and
  reorder suggestions grouped per vendor
- **Vendors**: Vendor directory kept in step with Finale parties
- **Sync**: On-demand inventory and vendor syncs with change detection,
  run history and health reporting
- **Dashboard**: Aggregate metrics, critical item lists, trends and a
  live event feed

## Error Handling

Errors use a consistent envelope with appropriate HTTP status codes:

```json
{
  "success": false,
  "error": "not_found",
  "message": "Inventory item ABC-1 not found",
  "request_id": "..."
}
```

## Pagination

List endpoints accept `page` and `limit` query parameters; cached read
paths additionally accept `force_refresh=true` to bypass the cache.
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "inventory", description = "Inventory read and write paths"),
        (name = "purchase-orders", description = "Purchase order lifecycle"),
        (name = "vendors", description = "Vendor directory"),
        (name = "sync", description = "Finale sync runs and monitoring"),
        (name = "dashboard", description = "Aggregates and live updates"),
        (name = "settings", description = "Application settings")
    ),
    paths(
        // Inventory
        crate::handlers::inventory::list_inventory,
        crate::handlers::inventory::inventory_summary,
        crate::handlers::inventory::get_item,
        crate::handlers::inventory::create_item,
        crate::handlers::inventory::update_item,
        crate::handlers::inventory::delete_item,

        // Vendors
        crate::handlers::vendors::list_vendors,
        crate::handlers::vendors::get_vendor,
        crate::handlers::vendors::create_vendor,
        crate::handlers::vendors::update_vendor,
        crate::handlers::vendors::delete_vendor,

        // Purchase orders
        crate::handlers::purchase_orders::list_purchase_orders,
        crate::handlers::purchase_orders::get_purchase_order,
        crate::handlers::purchase_orders::create_purchase_order,
        crate::handlers::purchase_orders::update_purchase_order,
        crate::handlers::purchase_orders::generate_purchase_orders,
        crate::handlers::purchase_orders::submit_purchase_order,
        crate::handlers::purchase_orders::approve_purchase_order,
        crate::handlers::purchase_orders::send_purchase_order,
        crate::handlers::purchase_orders::receive_purchase_order,
        crate::handlers::purchase_orders::cancel_purchase_order,

        // Sync
        crate::handlers::sync::trigger_sync,
        crate::handlers::sync::sync_status,
        crate::handlers::sync::sync_health,
        crate::handlers::sync::sync_history,
        crate::handlers::sync::sync_metrics,

        // Dashboard
        crate::handlers::dashboard::dashboard_metrics,
        crate::handlers::dashboard::critical_items,
        crate::handlers::dashboard::vendor_stats,
        crate::handlers::dashboard::po_summary,
        crate::handlers::dashboard::sync_trends,
        crate::handlers::dashboard::live_updates,

        // Settings
        crate::handlers::settings::get_settings,
        crate::handlers::settings::update_settings,
        crate::handlers::settings::clear_cache,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,

            // Inventory types
            crate::services::inventory::InventoryItemView,
            crate::services::inventory::InventorySummary,
            crate::services::inventory::CreateItemInput,
            crate::services::inventory::UpdateItemInput,
            crate::stock_status::StockStatusLevel,

            // Vendor types
            crate::services::vendors::CreateVendorInput,
            crate::services::vendors::UpdateVendorInput,

            // Purchase order types
            crate::services::purchase_orders::PoStatus,
            crate::services::purchase_orders::GenerateMode,
            crate::services::purchase_orders::PurchaseOrderItemInput,
            crate::services::purchase_orders::CreatePurchaseOrderInput,
            crate::services::purchase_orders::UpdatePurchaseOrderInput,
            crate::handlers::purchase_orders::GenerateRequest,
            crate::handlers::purchase_orders::ReceiveRequest,

            // Sync types
            crate::sync::SyncType,
            crate::sync::SyncStatus,
            crate::sync::SyncRunReport,
            crate::handlers::sync::TriggerSyncRequest,

            // Dashboard types
            crate::services::dashboard::DashboardMetrics,
            crate::services::dashboard::VendorStats,
            crate::services::dashboard::PoSummary,
            crate::services::dashboard::SyncTrendPoint,

            // Settings types
            crate::services::settings::UpdateSettingsInput,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
