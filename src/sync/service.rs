use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use strum::{Display, EnumString};
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    entities::sync_log::{self, Entity as SyncLogEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    finale::FinaleClient,
    services::{inventory::InventoryService, settings::SettingsService, vendors::VendorService},
    sync::change_detection,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, ToSchema)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SyncType {
    Inventory,
    Vendors,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, ToSchema)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Running,
    Success,
    Partial,
    Error,
}

/// Outcome of one completed sync run, returned from the trigger endpoint.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SyncRunReport {
    pub sync_id: Uuid,
    pub sync_type: SyncType,
    pub status: SyncStatus,
    pub items_processed: i32,
    pub items_updated: i32,
    pub unchanged_count: usize,
    pub duration_ms: i64,
    pub errors: Vec<String>,
}

/// Orchestrates sync runs end to end and owns the `sync_logs` audit trail.
#[derive(Clone)]
pub struct SyncService {
    db: Arc<DatabaseConnection>,
    inventory: InventoryService,
    vendors: VendorService,
    settings: SettingsService,
    event_sender: EventSender,
    config: AppConfig,
}

impl SyncService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        inventory: InventoryService,
        vendors: VendorService,
        settings: SettingsService,
        event_sender: EventSender,
        config: AppConfig,
    ) -> Self {
        Self {
            db,
            inventory,
            vendors,
            settings,
            event_sender,
            config,
        }
    }

    async fn build_client(&self) -> Result<FinaleClient, ServiceError> {
        let credentials = self.settings.finale_credentials().await?;
        FinaleClient::new(&self.config.finale, credentials)
    }

    /// Inserts the `running` audit row. The unique index on `running_marker`
    /// makes this the concurrency guard: a second concurrent trigger fails
    /// here with a conflict instead of racing a read-then-write check.
    async fn begin_run(&self, sync_type: SyncType) -> Result<sync_log::Model, ServiceError> {
        let now = Utc::now().naive_utc();
        let model = sync_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            sync_type: Set(sync_type.to_string()),
            status: Set(SyncStatus::Running.to_string()),
            running_marker: Set(Some(sync_type.to_string())),
            items_processed: Set(0),
            items_updated: Set(0),
            duration_ms: Set(None),
            errors: Set(None),
            metadata: Set(None),
            started_at: Set(now),
            completed_at: Set(None),
        };

        match model.insert(&*self.db).await {
            Ok(row) => {
                let _ = self
                    .event_sender
                    .send(Event::SyncStarted {
                        sync_type: sync_type.to_string(),
                        sync_id: row.id,
                    })
                    .await;
                Ok(row)
            }
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Err(ServiceError::Conflict(
                    format!("A {} sync is already running", sync_type),
                )),
                _ => Err(ServiceError::DatabaseError(e)),
            },
        }
    }

    async fn finalize_run(
        &self,
        run: &sync_log::Model,
        status: SyncStatus,
        items_processed: i32,
        items_updated: i32,
        errors: &[String],
        metadata: serde_json::Value,
    ) -> Result<SyncRunReport, ServiceError> {
        let completed = Utc::now().naive_utc();
        let duration_ms = (completed - run.started_at).num_milliseconds();

        let mut active: sync_log::ActiveModel = run.clone().into();
        active.status = Set(status.to_string());
        active.running_marker = Set(None);
        active.items_processed = Set(items_processed);
        active.items_updated = Set(items_updated);
        active.duration_ms = Set(Some(duration_ms));
        active.errors = Set(if errors.is_empty() {
            None
        } else {
            Some(json!(errors))
        });
        active.metadata = Set(Some(metadata.clone()));
        active.completed_at = Set(Some(completed));
        active.update(&*self.db).await?;

        let sync_type: SyncType = run
            .sync_type
            .parse()
            .map_err(|_| ServiceError::InternalError(format!("Bad sync type: {}", run.sync_type)))?;

        let _ = self
            .event_sender
            .send(Event::SyncCompleted {
                sync_type: run.sync_type.clone(),
                sync_id: run.id,
                status: status.to_string(),
                items_processed,
                items_updated,
            })
            .await;

        Ok(SyncRunReport {
            sync_id: run.id,
            sync_type,
            status,
            items_processed,
            items_updated,
            unchanged_count: metadata
                .get("unchanged_count")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as usize,
            duration_ms,
            errors: errors.to_vec(),
        })
    }

    /// Runs a full inventory sync: fetch, change-detect, batch upsert,
    /// snapshot refresh, audit.
    #[instrument(skip(self))]
    pub async fn run_inventory_sync(&self) -> Result<SyncRunReport, ServiceError> {
        let client = self.build_client().await?;
        let run = self.begin_run(SyncType::Inventory).await?;

        // Total upstream failure aborts before any write
        let fetched = match &self.config.finale.report_url {
            Some(report_url) => client.get_report_rows(report_url).await,
            None => client.get_products().await,
        };
        let incoming = match fetched {
            Ok(rows) => rows,
            Err(e) => {
                error!(error = %e, "Inventory sync failed before any write");
                let msg = e.to_string();
                self.finalize_run(&run, SyncStatus::Error, 0, 0, &[msg], json!({}))
                    .await?;
                return Err(e);
            }
        };

        let items_processed = incoming.len() as i32;
        let existing = self.inventory.existing_sync_state().await?;
        let change_set = change_detection::partition(incoming, &existing);
        let unchanged_count = change_set.unchanged_count;

        let (items_updated, errors) = self
            .inventory
            .upsert_from_finale(&change_set.to_sync, self.config.sync.batch_size)
            .await;

        if let Err(e) = self.inventory.rebuild_snapshot().await {
            // Cache refresh is best-effort
            warn!(error = %e, "Failed to rebuild inventory snapshot after sync");
        }
        self.settings.touch_last_sync_time().await;

        let status = if !errors.is_empty() {
            SyncStatus::Partial
        } else {
            SyncStatus::Success
        };
        let metadata = json!({
            "unchanged_count": unchanged_count,
            "changed_count": change_set.to_sync.len(),
            "batch_size": self.config.sync.batch_size,
        });

        let report = self
            .finalize_run(
                &run,
                status,
                items_processed,
                items_updated as i32,
                &errors,
                metadata,
            )
            .await?;

        info!(
            sync_id = %report.sync_id,
            processed = report.items_processed,
            updated = report.items_updated,
            unchanged = report.unchanged_count,
            status = %report.status,
            "Inventory sync finished"
        );
        Ok(report)
    }

    /// Runs a vendor sync: full upsert, no change detection.
    #[instrument(skip(self))]
    pub async fn run_vendor_sync(&self) -> Result<SyncRunReport, ServiceError> {
        let client = self.build_client().await?;
        let run = self.begin_run(SyncType::Vendors).await?;

        let incoming = match client.get_vendors().await {
            Ok(rows) => rows,
            Err(e) => {
                error!(error = %e, "Vendor sync failed before any write");
                let msg = e.to_string();
                self.finalize_run(&run, SyncStatus::Error, 0, 0, &[msg], json!({}))
                    .await?;
                return Err(e);
            }
        };

        let items_processed = incoming.len() as i32;
        let (items_updated, errors) = self.vendors.upsert_from_finale(&incoming).await;

        if let Err(e) = self.vendors.rebuild_snapshot().await {
            warn!(error = %e, "Failed to rebuild vendor snapshot after sync");
        }
        self.settings.touch_last_sync_time().await;

        let status = if !errors.is_empty() {
            SyncStatus::Partial
        } else {
            SyncStatus::Success
        };
        self.finalize_run(
            &run,
            status,
            items_processed,
            items_updated as i32,
            &errors,
            json!({}),
        )
        .await
    }

    /// Flips `running` rows older than the stuck threshold to `error`.
    /// Returns how many rows were swept. The status filter in the query makes
    /// the transition happen exactly once per row.
    #[instrument(skip(self))]
    pub async fn sweep_stuck(&self) -> Result<u64, ServiceError> {
        // The settings row wins over config so the threshold can be tuned live
        let timeout_minutes = match self.settings.get().await {
            Ok(row) => row.stuck_sync_timeout_minutes as i64,
            Err(_) => self.config.sync.stuck_timeout_minutes,
        };
        let cutoff = Utc::now().naive_utc() - chrono::Duration::minutes(timeout_minutes);

        let stuck = SyncLogEntity::find()
            .filter(sync_log::Column::Status.eq(SyncStatus::Running.to_string()))
            .filter(sync_log::Column::StartedAt.lt(cutoff))
            .all(&*self.db)
            .await?;

        let mut swept = 0u64;
        for row in stuck {
            let started_at = row.started_at;
            let id = row.id;
            let mut active: sync_log::ActiveModel = row.into();
            active.status = Set(SyncStatus::Error.to_string());
            active.running_marker = Set(None);
            active.errors = Set(Some(json!([format!(
                "Sync exceeded the stuck timeout of {} minutes",
                timeout_minutes
            )])));
            active.completed_at = Set(Some(Utc::now().naive_utc()));
            active.duration_ms = Set(Some(
                (Utc::now().naive_utc() - started_at).num_milliseconds(),
            ));
            active.update(&*self.db).await?;
            warn!(sync_id = %id, "Marked stuck sync as error");
            swept += 1;
        }
        Ok(swept)
    }

    /// Latest run per sync type plus whether one is currently in flight.
    pub async fn status(&self) -> Result<serde_json::Value, ServiceError> {
        let mut per_type = serde_json::Map::new();
        for sync_type in [SyncType::Inventory, SyncType::Vendors] {
            let latest = SyncLogEntity::find()
                .filter(sync_log::Column::SyncType.eq(sync_type.to_string()))
                .order_by_desc(sync_log::Column::StartedAt)
                .one(&*self.db)
                .await?;
            per_type.insert(sync_type.to_string(), json!(latest));
        }

        let running = SyncLogEntity::find()
            .filter(sync_log::Column::Status.eq(SyncStatus::Running.to_string()))
            .count(&*self.db)
            .await?;

        Ok(json!({
            "is_running": running > 0,
            "latest": per_type,
        }))
    }

    /// Paginated run history, newest first.
    pub async fn history(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<sync_log::Model>, u64), ServiceError> {
        let paginator = SyncLogEntity::find()
            .order_by_desc(sync_log::Column::StartedAt)
            .paginate(&*self.db, limit.max(1));
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows, total))
    }

    /// Aggregate run metrics over the most recent runs.
    pub async fn metrics(&self) -> Result<serde_json::Value, ServiceError> {
        let recent = SyncLogEntity::find()
            .order_by_desc(sync_log::Column::StartedAt)
            .limit(100)
            .all(&*self.db)
            .await?;

        let total = recent.len();
        let mut success = 0usize;
        let mut partial = 0usize;
        let mut failed = 0usize;
        let mut durations: Vec<i64> = Vec::new();
        for row in &recent {
            match row.status.as_str() {
                "success" => success += 1,
                "partial" => partial += 1,
                "error" => failed += 1,
                _ => {}
            }
            if let Some(d) = row.duration_ms {
                durations.push(d);
            }
        }
        let avg_duration_ms = if durations.is_empty() {
            None
        } else {
            Some(durations.iter().sum::<i64>() / durations.len() as i64)
        };

        Ok(json!({
            "window": total,
            "success": success,
            "partial": partial,
            "error": failed,
            "avg_duration_ms": avg_duration_ms,
        }))
    }

    /// Health summary: stuck sweep plus last-run recency.
    pub async fn health(&self) -> Result<serde_json::Value, ServiceError> {
        let swept = self.sweep_stuck().await?;
        let latest = SyncLogEntity::find()
            .order_by_desc(sync_log::Column::StartedAt)
            .one(&*self.db)
            .await?;

        let healthy = latest
            .as_ref()
            .map(|l| l.status != SyncStatus::Error.to_string())
            .unwrap_or(true);

        Ok(json!({
            "healthy": healthy,
            "stuck_swept": swept,
            "last_run": latest,
        }))
    }
}
