use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::{ColumnDef, Index, Table};

use crate::VersionedMigration;

pub struct Migration;

#[derive(Iden)]
enum StreamReset {
    Table,
    Id,
    ConnectionId,
    StreamNamespace,
    StreamName,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl VersionedMigration for Migration {
    fn version(&self) -> &str {
        "0.40.3.001"
    }

    fn description(&self) -> &str {
        "Create stream reset table"
    }

    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StreamReset::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(StreamReset::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(StreamReset::ConnectionId).uuid().not_null())
                    .col(ColumnDef::new(StreamReset::StreamNamespace).string().null())
                    .col(ColumnDef::new(StreamReset::StreamName).string().not_null())
                    .col(
                        ColumnDef::new(StreamReset::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StreamReset::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // One pending reset per stream; namespace participates so same-named
        // streams in different namespaces stay distinct.
        manager
            .create_index(
                Index::create()
                    .name("idx_stream_reset_connection_stream")
                    .table(StreamReset::Table)
                    .col(StreamReset::ConnectionId)
                    .col(StreamReset::StreamName)
                    .col(StreamReset::StreamNamespace)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
