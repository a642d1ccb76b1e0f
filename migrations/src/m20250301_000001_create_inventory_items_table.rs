use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InventoryItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InventoryItems::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::Sku)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(InventoryItems::ProductName).string().not_null())
                    .col(
                        ColumnDef::new(InventoryItems::CurrentStock)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(InventoryItems::Cost).decimal().null())
                    .col(
                        ColumnDef::new(InventoryItems::ReorderPoint)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(InventoryItems::Vendor).string().null())
                    .col(ColumnDef::new(InventoryItems::Location).string().null())
                    .col(
                        ColumnDef::new(InventoryItems::SalesVelocity)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(InventoryItems::ContentHash).string().null())
                    .col(ColumnDef::new(InventoryItems::LastSynced).timestamp().null())
                    .col(ColumnDef::new(InventoryItems::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(InventoryItems::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Read paths filter on vendor and location
        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_items_vendor")
                    .table(InventoryItems::Table)
                    .col(InventoryItems::Vendor)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_items_location")
                    .table(InventoryItems::Table)
                    .col(InventoryItems::Location)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InventoryItems::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum InventoryItems {
    Table,
    Id,
    Sku,
    ProductName,
    CurrentStock,
    Cost,
    ReorderPoint,
    Vendor,
    Location,
    SalesVelocity,
    ContentHash,
    LastSynced,
    CreatedAt,
    UpdatedAt,
}
