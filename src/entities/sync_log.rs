use sea_orm::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audit row for one sync run. `running_marker` mirrors `sync_type` while the
/// run is in flight and is cleared on completion; the unique index on it is
/// what rejects a second concurrent run of the same type.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sync_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sync_type: String,
    pub status: String,
    pub running_marker: Option<String>,
    pub items_processed: i32,
    pub items_updated: i32,
    pub duration_ms: Option<i64>,
    pub errors: Option<Json>,
    pub metadata: Option<Json>,
    pub started_at: DateTime,
    pub completed_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
