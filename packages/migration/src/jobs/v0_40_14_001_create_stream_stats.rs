use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::{ColumnDef, ForeignKeyAction, Index, Table};

use crate::VersionedMigration;

pub struct Migration;

#[derive(Iden)]
enum Attempts {
    Table,
    Id,
}

#[derive(Iden)]
enum StreamStats {
    Table,
    Id,
    AttemptId,
    StreamNamespace,
    StreamName,
    RecordsEmitted,
    BytesEmitted,
    EstimatedRecords,
    EstimatedBytes,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl VersionedMigration for Migration {
    fn version(&self) -> &str {
        "0.40.14.001"
    }

    fn description(&self) -> &str {
        "Create per-stream attempt statistics table"
    }

    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StreamStats::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(StreamStats::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(StreamStats::AttemptId).integer().not_null())
                    .col(ColumnDef::new(StreamStats::StreamNamespace).string().null())
                    .col(ColumnDef::new(StreamStats::StreamName).string().not_null())
                    .col(ColumnDef::new(StreamStats::RecordsEmitted).big_integer().null())
                    .col(ColumnDef::new(StreamStats::BytesEmitted).big_integer().null())
                    .col(ColumnDef::new(StreamStats::EstimatedRecords).big_integer().null())
                    .col(ColumnDef::new(StreamStats::EstimatedBytes).big_integer().null())
                    .col(
                        ColumnDef::new(StreamStats::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StreamStats::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stream_stats_attempt_id")
                            .from(StreamStats::Table, StreamStats::AttemptId)
                            .to(Attempts::Table, Attempts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stream_stats_attempt_stream")
                    .table(StreamStats::Table)
                    .col(StreamStats::AttemptId)
                    .col(StreamStats::StreamName)
                    .col(StreamStats::StreamNamespace)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
