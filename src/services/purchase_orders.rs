use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Deserialize;
use serde_json::json;
use strum::{Display, EnumString};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AppConfig,
    entities::{
        audit_log,
        inventory_item::{self, Entity as InventoryEntity},
        purchase_order::{self, Column, Entity as PoEntity, PurchaseOrderItem},
        vendor::{self, Entity as VendorEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    finale::FinaleClient,
    services::settings::SettingsService,
    stock_status::{derive_stock_status, StockStatusLevel},
};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, serde::Serialize, Deserialize, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PoStatus {
    Draft,
    PendingApproval,
    Approved,
    Sent,
    Partial,
    Received,
    Cancelled,
}

impl PoStatus {
    fn parse(raw: &str) -> Result<Self, ServiceError> {
        raw.parse()
            .map_err(|_| ServiceError::InternalError(format!("Bad purchase order status: {}", raw)))
    }

    fn is_terminal(self) -> bool {
        matches!(self, PoStatus::Received | PoStatus::Cancelled)
    }
}

/// Which inventory rows qualify when generating draft orders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, Deserialize, ToSchema)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GenerateMode {
    /// Only items with no stock on hand
    OutOfStock,
    /// Items at or below their reorder point, including out-of-stock ones
    #[default]
    ReorderNeeded,
}

#[derive(Debug, Clone, serde::Serialize, Deserialize, Validate, ToSchema)]
pub struct PurchaseOrderItemInput {
    #[validate(length(min = 1, max = 100))]
    pub sku: String,
    #[validate(length(min = 1, max = 255))]
    pub product_name: String,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub unit_cost: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePurchaseOrderInput {
    pub vendor_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255))]
    pub vendor_name: String,
    #[validate(length(min = 1))]
    pub items: Vec<PurchaseOrderItemInput>,
    pub expected_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePurchaseOrderInput {
    pub vendor_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255))]
    pub vendor_name: Option<String>,
    pub items: Option<Vec<PurchaseOrderItemInput>>,
    pub expected_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PoListParams {
    pub page: u64,
    pub limit: u64,
    pub status: Option<PoStatus>,
    pub vendor_name: Option<String>,
}

/// Purchase order lifecycle: draft through received, with an audit row per
/// transition and a best-effort push to Finale on send.
#[derive(Clone)]
pub struct PurchaseOrderService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
    settings: SettingsService,
    config: AppConfig,
}

impl PurchaseOrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: EventSender,
        settings: SettingsService,
        config: AppConfig,
    ) -> Self {
        Self {
            db,
            event_sender,
            settings,
            config,
        }
    }

    fn order_number() -> String {
        let stamp = Utc::now().format("%Y%m%d");
        let suffix = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
        format!("PO-{}-{}", stamp, suffix)
    }

    fn items_from_input(items: &[PurchaseOrderItemInput]) -> Vec<PurchaseOrderItem> {
        items
            .iter()
            .map(|i| PurchaseOrderItem {
                sku: i.sku.clone(),
                product_name: i.product_name.clone(),
                quantity: i.quantity,
                unit_cost: i.unit_cost,
            })
            .collect()
    }

    fn total_of(items: &[PurchaseOrderItem]) -> Decimal {
        items.iter().map(|i| i.line_total()).sum()
    }

    pub fn parse_items(model: &purchase_order::Model) -> Result<Vec<PurchaseOrderItem>, ServiceError> {
        serde_json::from_value(model.items.clone())
            .map_err(|e| ServiceError::SerializationError(format!("Bad items payload: {}", e)))
    }

    async fn record_audit(
        &self,
        entity_id: Uuid,
        action: &str,
        detail: serde_json::Value,
    ) -> Result<(), ServiceError> {
        let row = audit_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            entity_type: Set("purchase_order".to_string()),
            entity_id: Set(entity_id.to_string()),
            action: Set(action.to_string()),
            detail: Set(Some(detail)),
            created_at: Set(Utc::now().naive_utc()),
        };
        row.insert(&*self.db).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        params: &PoListParams,
    ) -> Result<(Vec<purchase_order::Model>, u64), ServiceError> {
        let page = params.page.max(1);
        let limit = params.limit.clamp(1, 200);
        let mut query = PoEntity::find().order_by_desc(Column::CreatedAt);
        if let Some(status) = params.status {
            query = query.filter(Column::Status.eq(status.to_string()));
        }
        if let Some(vendor) = &params.vendor_name {
            query = query.filter(Column::VendorName.eq(vendor.clone()));
        }
        let paginator = query.paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page - 1).await?;
        Ok((rows, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<purchase_order::Model, ServiceError> {
        PoEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Purchase order {}", id)))
    }

    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        input: CreatePurchaseOrderInput,
    ) -> Result<purchase_order::Model, ServiceError> {
        input.validate()?;
        for item in &input.items {
            item.validate()?;
        }

        let items = Self::items_from_input(&input.items);
        let total = Self::total_of(&items);
        let now = Utc::now().naive_utc();
        let model = purchase_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_number: Set(Self::order_number()),
            vendor_id: Set(input.vendor_id),
            vendor_name: Set(input.vendor_name),
            status: Set(PoStatus::Draft.to_string()),
            items: Set(json!(items)),
            total_amount: Set(total),
            expected_date: Set(input.expected_date),
            notes: Set(input.notes),
            finale_order_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = model.insert(&*self.db).await?;

        self.record_audit(created.id, "created", json!({ "total": total }))
            .await?;
        let _ = self
            .event_sender
            .send(Event::PurchaseOrderCreated {
                id: created.id,
                order_number: created.order_number.clone(),
            })
            .await;
        Ok(created)
    }

    /// Edits are only allowed before approval.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdatePurchaseOrderInput,
    ) -> Result<purchase_order::Model, ServiceError> {
        input.validate()?;

        let model = self.get(id).await?;
        let status = PoStatus::parse(&model.status)?;
        if !matches!(status, PoStatus::Draft | PoStatus::PendingApproval) {
            return Err(ServiceError::InvalidStatus(format!(
                "Purchase order in status {} cannot be edited",
                status
            )));
        }

        let mut active: purchase_order::ActiveModel = model.into();
        if let Some(v) = input.vendor_id {
            active.vendor_id = Set(Some(v));
        }
        if let Some(v) = input.vendor_name {
            active.vendor_name = Set(v);
        }
        if let Some(v) = input.items {
            if v.is_empty() {
                return Err(ServiceError::ValidationError(
                    "A purchase order needs at least one line item".to_string(),
                ));
            }
            for item in &v {
                item.validate()?;
            }
            let items = Self::items_from_input(&v);
            active.total_amount = Set(Self::total_of(&items));
            active.items = Set(json!(items));
        }
        if let Some(v) = input.expected_date {
            active.expected_date = Set(Some(v));
        }
        if let Some(v) = input.notes {
            active.notes = Set(Some(v));
        }
        active.updated_at = Set(Utc::now().naive_utc());
        let updated = active.update(&*self.db).await?;
        self.record_audit(updated.id, "updated", json!({})).await?;
        Ok(updated)
    }

    async fn transition(
        &self,
        id: Uuid,
        allowed_from: &[PoStatus],
        to: PoStatus,
    ) -> Result<purchase_order::Model, ServiceError> {
        let model = self.get(id).await?;
        let from = PoStatus::parse(&model.status)?;
        if !allowed_from.contains(&from) {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot move purchase order from {} to {}",
                from, to
            )));
        }

        let mut active: purchase_order::ActiveModel = model.into();
        active.status = Set(to.to_string());
        active.updated_at = Set(Utc::now().naive_utc());
        let updated = active.update(&*self.db).await?;

        self.record_audit(
            updated.id,
            "status_change",
            json!({ "from": from.to_string(), "to": to.to_string() }),
        )
        .await?;
        let _ = self
            .event_sender
            .send(Event::PurchaseOrderStatusChanged {
                id: updated.id,
                old_status: from.to_string(),
                new_status: to.to_string(),
            })
            .await;
        info!(po_id = %updated.id, %from, %to, "Purchase order transitioned");
        Ok(updated)
    }

    pub async fn submit(&self, id: Uuid) -> Result<purchase_order::Model, ServiceError> {
        self.transition(id, &[PoStatus::Draft], PoStatus::PendingApproval)
            .await
    }

    pub async fn approve(&self, id: Uuid) -> Result<purchase_order::Model, ServiceError> {
        self.transition(id, &[PoStatus::PendingApproval], PoStatus::Approved)
            .await
    }

    /// Moves an approved order to `sent` and pushes it to Finale. The push is
    /// best-effort: a failure is logged on the order, not returned.
    #[instrument(skip(self))]
    pub async fn send(&self, id: Uuid) -> Result<purchase_order::Model, ServiceError> {
        let updated = self.transition(id, &[PoStatus::Approved], PoStatus::Sent).await?;

        match self.push_to_finale(&updated).await {
            Ok(Some(finale_id)) => {
                let mut active: purchase_order::ActiveModel = updated.clone().into();
                active.finale_order_id = Set(Some(finale_id.clone()));
                let updated = active.update(&*self.db).await?;
                self.record_audit(id, "pushed_to_finale", json!({ "finale_order_id": finale_id }))
                    .await?;
                Ok(updated)
            }
            Ok(None) => Ok(updated),
            Err(e) => {
                warn!(po_id = %id, error = %e, "Finale push failed; order stays sent");
                self.record_audit(id, "finale_push_failed", json!({ "error": e.to_string() }))
                    .await?;
                Ok(updated)
            }
        }
    }

    async fn push_to_finale(
        &self,
        order: &purchase_order::Model,
    ) -> Result<Option<String>, ServiceError> {
        let credentials = self.settings.finale_credentials().await?;
        let client = FinaleClient::new(&self.config.finale, credentials)?;
        let items = Self::parse_items(order)?;
        let body = json!({
            "orderTypeId": "PURCHASE_ORDER",
            "referenceNumber": order.order_number,
            "vendorName": order.vendor_name,
            "orderItemList": items.iter().map(|i| json!({
                "productId": i.sku,
                "quantity": i.quantity,
                "unitListPrice": i.unit_cost,
            })).collect::<Vec<_>>(),
        });
        client.push_purchase_order(&body).await
    }

    pub async fn receive(
        &self,
        id: Uuid,
        partial: bool,
    ) -> Result<purchase_order::Model, ServiceError> {
        let to = if partial {
            PoStatus::Partial
        } else {
            PoStatus::Received
        };
        self.transition(id, &[PoStatus::Sent, PoStatus::Partial], to)
            .await
    }

    pub async fn cancel(&self, id: Uuid) -> Result<purchase_order::Model, ServiceError> {
        let model = self.get(id).await?;
        let from = PoStatus::parse(&model.status)?;
        if from.is_terminal() {
            return Err(ServiceError::InvalidStatus(format!(
                "Purchase order in status {} cannot be cancelled",
                from
            )));
        }
        self.transition(
            id,
            &[
                PoStatus::Draft,
                PoStatus::PendingApproval,
                PoStatus::Approved,
                PoStatus::Sent,
                PoStatus::Partial,
            ],
            PoStatus::Cancelled,
        )
        .await
    }

    /// Builds one draft order per vendor covering every qualifying item.
    /// Suggested quantity restocks to twice the reorder point.
    #[instrument(skip(self))]
    pub async fn generate(
        &self,
        mode: GenerateMode,
    ) -> Result<Vec<purchase_order::Model>, ServiceError> {
        let items = InventoryEntity::find().all(&*self.db).await?;

        let mut per_vendor: BTreeMap<String, Vec<&inventory_item::Model>> = BTreeMap::new();
        for item in &items {
            let qualifies = match mode {
                GenerateMode::OutOfStock => item.current_stock <= 0,
                GenerateMode::ReorderNeeded => {
                    let status = derive_stock_status(
                        item.current_stock,
                        item.reorder_point,
                        item.sales_velocity,
                    );
                    status == StockStatusLevel::Critical
                        || item.current_stock <= item.reorder_point
                }
            };
            if !qualifies {
                continue;
            }
            let Some(vendor) = &item.vendor else { continue };
            per_vendor.entry(vendor.clone()).or_default().push(item);
        }

        let mut created = Vec::new();
        for (vendor_name, lines) in per_vendor {
            let vendor_row = VendorEntity::find()
                .filter(vendor::Column::Name.eq(vendor_name.clone()))
                .one(&*self.db)
                .await?;

            let po_items: Vec<PurchaseOrderItem> = lines
                .iter()
                .map(|item| PurchaseOrderItem {
                    sku: item.sku.clone(),
                    product_name: item.product_name.clone(),
                    quantity: (item.reorder_point * 2 - item.current_stock).max(1),
                    unit_cost: item.cost.unwrap_or(Decimal::ZERO),
                })
                .collect();

            let input = CreatePurchaseOrderInput {
                vendor_id: vendor_row.map(|v| v.id),
                vendor_name,
                items: po_items
                    .iter()
                    .map(|i| PurchaseOrderItemInput {
                        sku: i.sku.clone(),
                        product_name: i.product_name.clone(),
                        quantity: i.quantity,
                        unit_cost: i.unit_cost,
                    })
                    .collect(),
                expected_date: None,
                notes: Some("Generated from reorder suggestions".to_string()),
            };
            created.push(self.create(input).await?);
        }

        info!(count = created.len(), "Generated reorder purchase orders");
        Ok(created)
    }
}
