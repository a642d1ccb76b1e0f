use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Settings::Table)
                    .if_not_exists()
                    // Singleton row, id is always 1
                    .col(ColumnDef::new(Settings::Id).integer().primary_key().not_null())
                    .col(ColumnDef::new(Settings::FinaleAccountPath).string().null())
                    .col(ColumnDef::new(Settings::FinaleApiKey).string().null())
                    .col(ColumnDef::new(Settings::FinaleApiSecret).string().null())
                    .col(
                        ColumnDef::new(Settings::SyncEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Settings::SyncFrequencyMinutes)
                            .integer()
                            .not_null()
                            .default(60),
                    )
                    .col(
                        ColumnDef::new(Settings::StuckSyncTimeoutMinutes)
                            .integer()
                            .not_null()
                            .default(30),
                    )
                    .col(
                        ColumnDef::new(Settings::LowStockAlerts)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Settings::LastSyncTime).timestamp().null())
                    .col(ColumnDef::new(Settings::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Settings::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Settings {
    Table,
    Id,
    FinaleAccountPath,
    FinaleApiKey,
    FinaleApiSecret,
    SyncEnabled,
    SyncFrequencyMinutes,
    StuckSyncTimeoutMinutes,
    LowStockAlerts,
    LastSyncTime,
    UpdatedAt,
}
