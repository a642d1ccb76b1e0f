use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use crate::{
    cache::{keys, CacheHandle, CacheStatus},
    entities::{
        inventory_item::{self, Entity as InventoryEntity},
        purchase_order::{self, Entity as PoEntity},
        sync_log::{self, Entity as SyncLogEntity},
        vendor::{self, Entity as VendorEntity},
    },
    errors::ServiceError,
    events::{EventRecord, RecentEvents},
    services::inventory::InventoryItemView,
    stock_status::{derive_stock_status, StockStatusLevel},
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardMetrics {
    pub total_items: u64,
    pub total_inventory_value: Decimal,
    pub critical_count: u64,
    pub low_count: u64,
    pub adequate_count: u64,
    pub overstocked_count: u64,
    pub active_vendors: u64,
    pub open_purchase_orders: u64,
    pub last_sync_at: Option<NaiveDateTime>,
    pub last_sync_status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VendorStats {
    pub vendor: String,
    pub item_count: u64,
    pub total_value: Decimal,
    pub items_below_reorder: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PoSummary {
    pub by_status: BTreeMap<String, u64>,
    pub open_count: u64,
    pub open_total_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SyncTrendPoint {
    pub started_at: NaiveDateTime,
    pub sync_type: String,
    pub status: String,
    pub items_processed: i32,
    pub items_updated: i32,
    pub duration_ms: Option<i64>,
}

/// Read-only aggregates behind the dashboard endpoints. Everything here is
/// derived from the primary tables and cached briefly.
#[derive(Clone)]
pub struct DashboardService {
    db: Arc<DatabaseConnection>,
    cache: CacheHandle,
    recent_events: RecentEvents,
}

impl DashboardService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        cache: CacheHandle,
        recent_events: RecentEvents,
    ) -> Self {
        Self {
            db,
            cache,
            recent_events,
        }
    }

    #[instrument(skip(self))]
    pub async fn metrics(
        &self,
        force_refresh: bool,
    ) -> Result<(DashboardMetrics, CacheStatus), ServiceError> {
        if !force_refresh {
            if let Some(cached) = self
                .cache
                .get_json::<DashboardMetrics>(keys::DASHBOARD_METRICS)
                .await
            {
                return Ok((cached, CacheStatus::Hit));
            }
        }

        let items = InventoryEntity::find().all(&*self.db).await?;
        let mut metrics = DashboardMetrics {
            total_items: items.len() as u64,
            total_inventory_value: Decimal::ZERO,
            critical_count: 0,
            low_count: 0,
            adequate_count: 0,
            overstocked_count: 0,
            active_vendors: 0,
            open_purchase_orders: 0,
            last_sync_at: None,
            last_sync_status: None,
        };
        for item in &items {
            if let Some(cost) = item.cost {
                metrics.total_inventory_value += Decimal::from(item.current_stock.max(0)) * cost;
            }
            match derive_stock_status(item.current_stock, item.reorder_point, item.sales_velocity)
            {
                StockStatusLevel::Critical => metrics.critical_count += 1,
                StockStatusLevel::Low => metrics.low_count += 1,
                StockStatusLevel::Adequate => metrics.adequate_count += 1,
                StockStatusLevel::Overstocked => metrics.overstocked_count += 1,
            }
        }

        metrics.active_vendors = VendorEntity::find()
            .filter(vendor::Column::Active.eq(true))
            .count(&*self.db)
            .await?;
        metrics.open_purchase_orders = PoEntity::find()
            .filter(
                purchase_order::Column::Status
                    .is_not_in(["received".to_string(), "cancelled".to_string()]),
            )
            .count(&*self.db)
            .await?;

        if let Some(last) = SyncLogEntity::find()
            .order_by_desc(sync_log::Column::StartedAt)
            .one(&*self.db)
            .await?
        {
            metrics.last_sync_at = Some(last.started_at);
            metrics.last_sync_status = Some(last.status);
        }

        self.cache
            .set_json(
                keys::DASHBOARD_METRICS,
                &metrics,
                Duration::from_secs(self.cache.config.dashboard_ttl_secs),
            )
            .await;
        Ok((metrics, CacheStatus::Miss))
    }

    /// Worst items first: critical, then low, ordered by days of supply.
    #[instrument(skip(self))]
    pub async fn critical_items(
        &self,
        limit: u64,
    ) -> Result<(Vec<InventoryItemView>, CacheStatus), ServiceError> {
        let limit = limit.clamp(1, 200);
        let key = keys::dashboard_critical_items(limit);
        if let Some(cached) = self.cache.get_json::<Vec<InventoryItemView>>(&key).await {
            return Ok((cached, CacheStatus::Hit));
        }

        let mut views: Vec<InventoryItemView> = InventoryEntity::find()
            .all(&*self.db)
            .await?
            .into_iter()
            .map(InventoryItemView::from)
            .filter(|v| {
                matches!(
                    v.stock_status,
                    StockStatusLevel::Critical | StockStatusLevel::Low
                )
            })
            .collect();
        views.sort_by(|a, b| {
            let rank = |v: &InventoryItemView| match v.stock_status {
                StockStatusLevel::Critical => 0,
                _ => 1,
            };
            rank(a)
                .cmp(&rank(b))
                .then_with(|| {
                    a.days_of_supply
                        .unwrap_or(Decimal::MAX)
                        .cmp(&b.days_of_supply.unwrap_or(Decimal::MAX))
                })
                .then_with(|| a.sku.cmp(&b.sku))
        });
        views.truncate(limit as usize);

        self.cache
            .set_json(
                &key,
                &views,
                Duration::from_secs(self.cache.config.critical_items_ttl_secs),
            )
            .await;
        Ok((views, CacheStatus::Miss))
    }

    #[instrument(skip(self))]
    pub async fn vendor_stats(&self) -> Result<Vec<VendorStats>, ServiceError> {
        let items = InventoryEntity::find()
            .filter(inventory_item::Column::Vendor.is_not_null())
            .all(&*self.db)
            .await?;

        let mut per_vendor: BTreeMap<String, VendorStats> = BTreeMap::new();
        for item in items {
            let Some(vendor) = item.vendor.clone() else { continue };
            let entry = per_vendor.entry(vendor.clone()).or_insert(VendorStats {
                vendor,
                item_count: 0,
                total_value: Decimal::ZERO,
                items_below_reorder: 0,
            });
            entry.item_count += 1;
            if let Some(cost) = item.cost {
                entry.total_value += Decimal::from(item.current_stock.max(0)) * cost;
            }
            if item.current_stock <= item.reorder_point {
                entry.items_below_reorder += 1;
            }
        }
        Ok(per_vendor.into_values().collect())
    }

    #[instrument(skip(self))]
    pub async fn po_summary(&self) -> Result<PoSummary, ServiceError> {
        let orders = PoEntity::find().all(&*self.db).await?;
        let mut summary = PoSummary {
            by_status: BTreeMap::new(),
            open_count: 0,
            open_total_amount: Decimal::ZERO,
        };
        for order in orders {
            *summary.by_status.entry(order.status.clone()).or_insert(0) += 1;
            if order.status != "received" && order.status != "cancelled" {
                summary.open_count += 1;
                summary.open_total_amount += order.total_amount;
            }
        }
        Ok(summary)
    }

    /// Recent sync runs, oldest first, for charting.
    #[instrument(skip(self))]
    pub async fn trends(&self, window: u64) -> Result<Vec<SyncTrendPoint>, ServiceError> {
        let window = window.clamp(1, 500);
        let mut points: Vec<SyncTrendPoint> = SyncLogEntity::find()
            .order_by_desc(sync_log::Column::StartedAt)
            .limit(window)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|row| SyncTrendPoint {
                started_at: row.started_at,
                sync_type: row.sync_type,
                status: row.status,
                items_processed: row.items_processed,
                items_updated: row.items_updated,
                duration_ms: row.duration_ms,
            })
            .collect();
        points.reverse();
        Ok(points)
    }

    pub fn live_updates(&self, limit: usize) -> Vec<EventRecord> {
        self.recent_events.snapshot(limit)
    }
}
