pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_inventory_items_table;
mod m20250301_000002_create_vendors_table;
mod m20250301_000003_create_purchase_orders_table;
mod m20250301_000004_create_sync_logs_table;
mod m20250301_000005_create_settings_table;
mod m20250301_000006_create_audit_logs_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_inventory_items_table::Migration),
            Box::new(m20250301_000002_create_vendors_table::Migration),
            Box::new(m20250301_000003_create_purchase_orders_table::Migration),
            Box::new(m20250301_000004_create_sync_logs_table::Migration),
            Box::new(m20250301_000005_create_settings_table::Migration),
            Box::new(m20250301_000006_create_audit_logs_table::Migration),
        ]
    }
}
