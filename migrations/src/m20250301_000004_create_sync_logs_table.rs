use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SyncLogs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SyncLogs::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(SyncLogs::SyncType).string().not_null())
                    .col(
                        ColumnDef::new(SyncLogs::Status)
                            .string()
                            .not_null()
                            .default("running"),
                    )
                    // Holds the sync type while the run is in flight and NULL once it
                    // finishes; the unique index below is the concurrency guard, so a
                    // second trigger fails at insert time instead of racing a read.
                    .col(ColumnDef::new(SyncLogs::RunningMarker).string().null())
                    .col(
                        ColumnDef::new(SyncLogs::ItemsProcessed)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SyncLogs::ItemsUpdated)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(SyncLogs::DurationMs).big_integer().null())
                    .col(ColumnDef::new(SyncLogs::Errors).json().null())
                    .col(ColumnDef::new(SyncLogs::Metadata).json().null())
                    .col(ColumnDef::new(SyncLogs::StartedAt).timestamp().not_null())
                    .col(ColumnDef::new(SyncLogs::CompletedAt).timestamp().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_sync_logs_running_marker")
                    .table(SyncLogs::Table)
                    .col(SyncLogs::RunningMarker)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sync_logs_started_at")
                    .table(SyncLogs::Table)
                    .col(SyncLogs::StartedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SyncLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SyncLogs {
    Table,
    Id,
    SyncType,
    Status,
    RunningMarker,
    ItemsProcessed,
    ItemsUpdated,
    DurationMs,
    Errors,
    Metadata,
    StartedAt,
    CompletedAt,
}
