use rust_decimal::Decimal;
use sea_orm::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One synced product row, keyed on sku. `content_hash` and `last_synced`
/// drive the smart-sync skip logic.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub sku: String,
    pub product_name: String,
    pub current_stock: i32,
    pub cost: Option<Decimal>,
    pub reorder_point: i32,
    pub vendor: Option<String>,
    pub location: Option<String>,
    pub sales_velocity: Decimal,
    pub content_hash: Option<String>,
    pub last_synced: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
