use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::{ColumnDef, ForeignKeyAction, Index, Table};

use crate::VersionedMigration;

pub struct Migration;

#[derive(Iden)]
enum ActorDefinition {
    Table,
    Id,
    Name,
    DockerRepository,
    DockerImageTag,
    ActorType,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Actor {
    Table,
    Id,
    WorkspaceId,
    ActorDefinitionId,
    Name,
    Configuration,
    ActorType,
    Tombstone,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Connection {
    Table,
    Id,
    NamespaceDefinition,
    SourceId,
    DestinationId,
    Name,
    Catalog,
    Status,
    Schedule,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl VersionedMigration for Migration {
    fn version(&self) -> &str {
        "0.30.22.001"
    }

    fn description(&self) -> &str {
        "Create actor definition, actor and connection tables"
    }

    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ActorDefinition::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ActorDefinition::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ActorDefinition::Name).string().not_null())
                    .col(
                        ColumnDef::new(ActorDefinition::DockerRepository)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ActorDefinition::DockerImageTag).string().not_null())
                    .col(ColumnDef::new(ActorDefinition::ActorType).string_len(32).not_null())
                    .col(
                        ColumnDef::new(ActorDefinition::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActorDefinition::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Actor::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Actor::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Actor::WorkspaceId).uuid().not_null())
                    .col(ColumnDef::new(Actor::ActorDefinitionId).uuid().not_null())
                    .col(ColumnDef::new(Actor::Name).string().not_null())
                    .col(ColumnDef::new(Actor::Configuration).text().not_null())
                    .col(ColumnDef::new(Actor::ActorType).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Actor::Tombstone)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Actor::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Actor::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_actor_actor_definition_id")
                            .from(Actor::Table, Actor::ActorDefinitionId)
                            .to(ActorDefinition::Table, ActorDefinition::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_actor_workspace_id")
                    .table(Actor::Table)
                    .col(Actor::WorkspaceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Connection::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Connection::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Connection::NamespaceDefinition)
                            .string_len(32)
                            .not_null()
                            .default("source"),
                    )
                    .col(ColumnDef::new(Connection::SourceId).uuid().not_null())
                    .col(ColumnDef::new(Connection::DestinationId).uuid().not_null())
                    .col(ColumnDef::new(Connection::Name).string().not_null())
                    .col(ColumnDef::new(Connection::Catalog).text().not_null())
                    .col(ColumnDef::new(Connection::Status).string_len(32).null())
                    .col(ColumnDef::new(Connection::Schedule).text().null())
                    .col(
                        ColumnDef::new(Connection::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Connection::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_connection_source_id")
                            .from(Connection::Table, Connection::SourceId)
                            .to(Actor::Table, Actor::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_connection_destination_id")
                            .from(Connection::Table, Connection::DestinationId)
                            .to(Actor::Table, Actor::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
