use sea_orm::prelude::*;
use serde::{Deserialize, Serialize};

/// Singleton settings row; `id` is always [`SETTINGS_ROW_ID`].
pub const SETTINGS_ROW_ID: i32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub finale_account_path: Option<String>,
    pub finale_api_key: Option<String>,
    #[serde(skip_serializing)]
    pub finale_api_secret: Option<String>,
    pub sync_enabled: bool,
    pub sync_frequency_minutes: i32,
    pub stuck_sync_timeout_minutes: i32,
    pub low_stock_alerts: bool,
    pub last_sync_time: Option<DateTime>,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
