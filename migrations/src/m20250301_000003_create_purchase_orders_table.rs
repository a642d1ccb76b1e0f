use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PurchaseOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PurchaseOrders::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::OrderNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(PurchaseOrders::VendorId).uuid().null())
                    .col(ColumnDef::new(PurchaseOrders::VendorName).string().not_null())
                    .col(
                        ColumnDef::new(PurchaseOrders::Status)
                            .string()
                            .not_null()
                            .default("draft"),
                    )
                    // Line items ride along as an embedded JSON array
                    .col(ColumnDef::new(PurchaseOrders::Items).json().not_null())
                    .col(
                        ColumnDef::new(PurchaseOrders::TotalAmount)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(PurchaseOrders::ExpectedDate).date().null())
                    .col(ColumnDef::new(PurchaseOrders::Notes).text().null())
                    .col(ColumnDef::new(PurchaseOrders::FinaleOrderId).string().null())
                    .col(ColumnDef::new(PurchaseOrders::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(PurchaseOrders::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_purchase_orders_status")
                    .table(PurchaseOrders::Table)
                    .col(PurchaseOrders::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PurchaseOrders::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PurchaseOrders {
    Table,
    Id,
    OrderNumber,
    VendorId,
    VendorName,
    Status,
    Items,
    TotalAmount,
    ExpectedDate,
    Notes,
    FinaleOrderId,
    CreatedAt,
    UpdatedAt,
}
