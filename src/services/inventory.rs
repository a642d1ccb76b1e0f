use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition,
    DatabaseConnection, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    cache::{keys, CacheHandle, CacheStatus},
    entities::inventory_item::{self, Column, Entity as InventoryEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    finale::FinaleProductRow,
    stock_status::{days_of_supply, derive_stock_status, StockStatusLevel},
    sync::change_detection::{content_hash, ExistingItemState},
};

/// An inventory row as the API reports it: the stored columns plus the
/// derived stock status and days of supply.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct InventoryItemView {
    pub id: Uuid,
    pub sku: String,
    pub product_name: String,
    pub current_stock: i32,
    pub cost: Option<Decimal>,
    pub reorder_point: i32,
    pub vendor: Option<String>,
    pub location: Option<String>,
    pub sales_velocity: Decimal,
    pub stock_status: StockStatusLevel,
    pub days_of_supply: Option<Decimal>,
    pub last_synced: Option<NaiveDateTime>,
    pub updated_at: NaiveDateTime,
}

impl From<inventory_item::Model> for InventoryItemView {
    fn from(m: inventory_item::Model) -> Self {
        let stock_status = derive_stock_status(m.current_stock, m.reorder_point, m.sales_velocity);
        let days = days_of_supply(m.current_stock, m.sales_velocity);
        Self {
            id: m.id,
            sku: m.sku,
            product_name: m.product_name,
            current_stock: m.current_stock,
            cost: m.cost,
            reorder_point: m.reorder_point,
            vendor: m.vendor,
            location: m.location,
            sales_velocity: m.sales_velocity,
            stock_status,
            days_of_supply: days,
            last_synced: m.last_synced,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InventoryListParams {
    pub page: u64,
    pub limit: u64,
    pub status: Option<StockStatusLevel>,
    pub vendor: Option<String>,
    pub location: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_descending: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InventoryPage {
    pub items: Vec<InventoryItemView>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InventorySummary {
    pub total_items: u64,
    pub total_value: Decimal,
    pub critical_count: u64,
    pub low_count: u64,
    pub adequate_count: u64,
    pub overstocked_count: u64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateItemInput {
    #[validate(length(min = 1, max = 100))]
    pub sku: String,
    #[validate(length(min = 1, max = 255))]
    pub product_name: String,
    #[serde(default)]
    pub current_stock: i32,
    pub cost: Option<Decimal>,
    #[serde(default)]
    pub reorder_point: i32,
    pub vendor: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub sales_velocity: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateItemInput {
    #[validate(length(min = 1, max = 255))]
    pub product_name: Option<String>,
    pub current_stock: Option<i32>,
    pub cost: Option<Decimal>,
    pub reorder_point: Option<i32>,
    pub vendor: Option<String>,
    pub location: Option<String>,
    pub sales_velocity: Option<Decimal>,
}

/// Service for the inventory read and write paths, including the bulk upsert
/// the Finale sync drives.
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
    cache: CacheHandle,
    event_sender: EventSender,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>, cache: CacheHandle, event_sender: EventSender) -> Self {
        Self {
            db,
            cache,
            event_sender,
        }
    }

    fn sort_column(name: Option<&str>) -> Column {
        match name {
            Some("product_name") => Column::ProductName,
            Some("current_stock") => Column::CurrentStock,
            Some("cost") => Column::Cost,
            Some("sales_velocity") => Column::SalesVelocity,
            Some("last_synced") => Column::LastSynced,
            Some("updated_at") => Column::UpdatedAt,
            _ => Column::Sku,
        }
    }

    fn filter_condition(params: &InventoryListParams) -> Condition {
        let mut cond = Condition::all();
        if let Some(vendor) = &params.vendor {
            cond = cond.add(Column::Vendor.eq(vendor.clone()));
        }
        if let Some(location) = &params.location {
            cond = cond.add(Column::Location.eq(location.clone()));
        }
        if let Some(search) = &params.search {
            cond = cond.add(
                Condition::any()
                    .add(Column::Sku.contains(search))
                    .add(Column::ProductName.contains(search)),
            );
        }
        cond
    }

    /// Filtered, sorted, paginated listing. Everything except the derived
    /// status filter runs in SQL; a status filter forces the derivation over
    /// the filtered set before paginating.
    #[instrument(skip(self))]
    pub async fn list(&self, params: &InventoryListParams) -> Result<InventoryPage, ServiceError> {
        let page = params.page.max(1);
        let limit = params.limit.clamp(1, 500);
        let order = if params.sort_descending {
            Order::Desc
        } else {
            Order::Asc
        };
        let query = InventoryEntity::find()
            .filter(Self::filter_condition(params))
            .order_by(Self::sort_column(params.sort_by.as_deref()), order);

        if let Some(status) = params.status {
            let all: Vec<InventoryItemView> = query
                .all(&*self.db)
                .await?
                .into_iter()
                .map(InventoryItemView::from)
                .filter(|v| v.stock_status == status)
                .collect();
            let total = all.len() as u64;
            let start = ((page - 1) * limit) as usize;
            let items = all.into_iter().skip(start).take(limit as usize).collect();
            return Ok(InventoryPage {
                items,
                total,
                page,
                limit,
            });
        }

        let paginator = query.paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let items = paginator
            .fetch_page(page - 1)
            .await?
            .into_iter()
            .map(InventoryItemView::from)
            .collect();
        Ok(InventoryPage {
            items,
            total,
            page,
            limit,
        })
    }

    /// The full unfiltered item list, served from cache when fresh.
    #[instrument(skip(self))]
    pub async fn full_snapshot(
        &self,
        force_refresh: bool,
    ) -> Result<(Vec<InventoryItemView>, CacheStatus), ServiceError> {
        if !force_refresh {
            if let Some(cached) = self
                .cache
                .get_json::<Vec<InventoryItemView>>(keys::INVENTORY_FULL)
                .await
            {
                return Ok((cached, CacheStatus::Hit));
            }
        }
        let views = self.rebuild_snapshot().await?;
        Ok((views, CacheStatus::Miss))
    }

    /// Reloads every row, re-derives views and rewrites the cache entry.
    pub async fn rebuild_snapshot(&self) -> Result<Vec<InventoryItemView>, ServiceError> {
        let views: Vec<InventoryItemView> = InventoryEntity::find()
            .order_by_asc(Column::Sku)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(InventoryItemView::from)
            .collect();
        self.cache
            .set_json(
                keys::INVENTORY_FULL,
                &views,
                Duration::from_secs(self.cache.config.inventory_ttl_secs),
            )
            .await;
        self.cache.delete(keys::DASHBOARD_METRICS).await;
        Ok(views)
    }

    pub async fn get_by_sku(&self, sku: &str) -> Result<InventoryItemView, ServiceError> {
        let model = InventoryEntity::find()
            .filter(Column::Sku.eq(sku))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Inventory item {}", sku)))?;
        Ok(model.into())
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: CreateItemInput) -> Result<InventoryItemView, ServiceError> {
        input.validate()?;

        let existing = InventoryEntity::find()
            .filter(Column::Sku.eq(input.sku.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Inventory item {} already exists",
                input.sku
            )));
        }

        let now = Utc::now().naive_utc();
        let model = inventory_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(input.sku.clone()),
            product_name: Set(input.product_name),
            current_stock: Set(input.current_stock),
            cost: Set(input.cost),
            reorder_point: Set(input.reorder_point),
            vendor: Set(input.vendor),
            location: Set(input.location),
            sales_velocity: Set(input.sales_velocity),
            // Left empty so the next sync treats the row as changed
            content_hash: Set(None),
            last_synced: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = model.insert(&*self.db).await?;
        self.cache.delete(keys::INVENTORY_FULL).await;
        let _ = self
            .event_sender
            .send(Event::InventoryItemUpserted {
                sku: created.sku.clone(),
            })
            .await;
        Ok(created.into())
    }

    #[instrument(skip(self, input))]
    pub async fn update_by_sku(
        &self,
        sku: &str,
        input: UpdateItemInput,
    ) -> Result<InventoryItemView, ServiceError> {
        input.validate()?;

        let model = InventoryEntity::find()
            .filter(Column::Sku.eq(sku))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Inventory item {}", sku)))?;

        let mut active: inventory_item::ActiveModel = model.into();
        if let Some(v) = input.product_name {
            active.product_name = Set(v);
        }
        if let Some(v) = input.current_stock {
            active.current_stock = Set(v);
        }
        if let Some(v) = input.cost {
            active.cost = Set(Some(v));
        }
        if let Some(v) = input.reorder_point {
            active.reorder_point = Set(v);
        }
        if let Some(v) = input.vendor {
            active.vendor = Set(Some(v));
        }
        if let Some(v) = input.location {
            active.location = Set(Some(v));
        }
        if let Some(v) = input.sales_velocity {
            active.sales_velocity = Set(v);
        }
        // A manual edit invalidates the sync hash
        active.content_hash = Set(None);
        active.updated_at = Set(Utc::now().naive_utc());
        let updated = active.update(&*self.db).await?;

        self.cache.delete(keys::INVENTORY_FULL).await;
        let _ = self
            .event_sender
            .send(Event::InventoryItemUpserted {
                sku: updated.sku.clone(),
            })
            .await;
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    pub async fn delete_by_sku(&self, sku: &str) -> Result<(), ServiceError> {
        let model = InventoryEntity::find()
            .filter(Column::Sku.eq(sku))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Inventory item {}", sku)))?;
        InventoryEntity::delete_by_id(model.id)
            .exec(&*self.db)
            .await?;
        self.cache.delete(keys::INVENTORY_FULL).await;
        Ok(())
    }

    /// Status counts and total stock value over the whole table.
    pub async fn summary(&self) -> Result<InventorySummary, ServiceError> {
        let rows = InventoryEntity::find().all(&*self.db).await?;
        let mut summary = InventorySummary {
            total_items: rows.len() as u64,
            total_value: Decimal::ZERO,
            critical_count: 0,
            low_count: 0,
            adequate_count: 0,
            overstocked_count: 0,
        };
        for row in rows {
            if let Some(cost) = row.cost {
                summary.total_value += Decimal::from(row.current_stock.max(0)) * cost;
            }
            match derive_stock_status(row.current_stock, row.reorder_point, row.sales_velocity) {
                StockStatusLevel::Critical => summary.critical_count += 1,
                StockStatusLevel::Low => summary.low_count += 1,
                StockStatusLevel::Adequate => summary.adequate_count += 1,
                StockStatusLevel::Overstocked => summary.overstocked_count += 1,
            }
        }
        Ok(summary)
    }

    /// Per-sku hash and sync-time map the change detector compares against.
    pub async fn existing_sync_state(
        &self,
    ) -> Result<HashMap<String, ExistingItemState>, ServiceError> {
        let rows: Vec<(String, Option<String>, Option<NaiveDateTime>)> = InventoryEntity::find()
            .select_only()
            .column(Column::Sku)
            .column(Column::ContentHash)
            .column(Column::LastSynced)
            .into_tuple()
            .all(&*self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(sku, hash, synced)| {
                (
                    sku,
                    ExistingItemState {
                        content_hash: hash,
                        last_synced: synced,
                    },
                )
            })
            .collect())
    }

    /// Batched upsert of changed Finale rows, keyed on sku. A failed batch is
    /// recorded and skipped; the run carries on with the rest.
    #[instrument(skip(self, rows))]
    pub async fn upsert_from_finale(
        &self,
        rows: &[FinaleProductRow],
        batch_size: usize,
    ) -> (usize, Vec<String>) {
        let batch_size = batch_size.max(1);
        let now = Utc::now().naive_utc();
        let mut updated = 0usize;
        let mut errors = Vec::new();

        for chunk in rows.chunks(batch_size) {
            let models: Vec<inventory_item::ActiveModel> = chunk
                .iter()
                .map(|row| inventory_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    sku: Set(row.sku.clone()),
                    product_name: Set(row
                        .product_name
                        .clone()
                        .unwrap_or_else(|| row.sku.clone())),
                    current_stock: Set(row.quantity_on_hand.unwrap_or(0)),
                    cost: Set(row.unit_cost),
                    reorder_point: Set(row.reorder_point.unwrap_or(0)),
                    vendor: Set(row.supplier.clone()),
                    location: Set(row.location.clone()),
                    sales_velocity: Set(row.sales_velocity.unwrap_or(Decimal::ZERO)),
                    content_hash: Set(Some(content_hash(row))),
                    last_synced: Set(Some(now)),
                    created_at: Set(now),
                    updated_at: Set(now),
                })
                .collect();

            let stmt = InventoryEntity::insert_many(models).on_conflict(
                OnConflict::column(Column::Sku)
                    .update_columns([
                        Column::ProductName,
                        Column::CurrentStock,
                        Column::Cost,
                        Column::ReorderPoint,
                        Column::Vendor,
                        Column::Location,
                        Column::SalesVelocity,
                        Column::ContentHash,
                        Column::LastSynced,
                        Column::UpdatedAt,
                    ])
                    .to_owned(),
            );

            match stmt.exec(&*self.db).await {
                Ok(_) => updated += chunk.len(),
                Err(e) => {
                    error!(error = %e, batch = chunk.len(), "Inventory upsert batch failed");
                    errors.push(format!("Batch of {} rows failed: {}", chunk.len(), e));
                }
            }
        }

        if !errors.is_empty() {
            warn!(failed_batches = errors.len(), "Inventory upsert finished with errors");
        }
        (updated, errors)
    }
}
