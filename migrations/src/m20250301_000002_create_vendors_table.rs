use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vendors::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Vendors::Id).uuid().primary_key().not_null())
                    .col(
                        ColumnDef::new(Vendors::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Vendors::ContactName).string().null())
                    .col(ColumnDef::new(Vendors::Email).string().null())
                    .col(ColumnDef::new(Vendors::Phone).string().null())
                    .col(ColumnDef::new(Vendors::Address).text().null())
                    .col(ColumnDef::new(Vendors::Notes).text().null())
                    .col(
                        ColumnDef::new(Vendors::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Vendors::FinaleVendorId).string().null())
                    .col(ColumnDef::new(Vendors::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Vendors::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vendors::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Vendors {
    Table,
    Id,
    Name,
    ContactName,
    Email,
    Phone,
    Address,
    Notes,
    Active,
    FinaleVendorId,
    CreatedAt,
    UpdatedAt,
}
