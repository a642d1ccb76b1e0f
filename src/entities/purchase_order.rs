use rust_decimal::Decimal;
use sea_orm::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Purchase order header. Line items are embedded as a JSON array rather
/// than a normalized table; see [`PurchaseOrderItem`].
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub order_number: String,
    pub vendor_id: Option<Uuid>,
    pub vendor_name: String,
    pub status: String,
    pub items: Json,
    pub total_amount: Decimal,
    pub expected_date: Option<Date>,
    pub notes: Option<String>,
    pub finale_order_id: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Shape of one element of the embedded `items` JSON array.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrderItem {
    pub sku: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_cost: Decimal,
}

impl PurchaseOrderItem {
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_cost
    }
}
