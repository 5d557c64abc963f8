use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::{ColumnDef, ForeignKeyAction, Index, Table};

use crate::VersionedMigration;

pub struct Migration;

#[derive(Iden)]
enum Connection {
    Table,
    Id,
}

#[derive(Iden)]
enum State {
    Table,
    Id,
    ConnectionId,
    StreamName,
    Namespace,
    State,
    #[iden = "type"]
    StateType,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl VersionedMigration for Migration {
    fn version(&self) -> &str {
        "0.35.15.001"
    }

    fn description(&self) -> &str {
        "Create per-stream connection state table"
    }

    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(State::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(State::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(State::ConnectionId).uuid().not_null())
                    .col(ColumnDef::new(State::StreamName).string().null())
                    .col(ColumnDef::new(State::Namespace).string().null())
                    .col(ColumnDef::new(State::State).text().null())
                    .col(
                        ColumnDef::new(State::StateType)
                            .string_len(16)
                            .not_null()
                            .default("LEGACY"),
                    )
                    .col(
                        ColumnDef::new(State::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(State::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_state_connection_id")
                            .from(State::Table, State::ConnectionId)
                            .to(Connection::Table, Connection::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_state_connection_stream")
                    .table(State::Table)
                    .col(State::ConnectionId)
                    .col(State::StreamName)
                    .col(State::Namespace)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
