use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::{ColumnDef, ForeignKeyAction, Index, Table};

use crate::VersionedMigration;

pub struct Migration;

#[derive(Iden)]
enum Jobs {
    Table,
    Id,
    ConfigType,
    Scope,
    Config,
    Status,
    StartedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Attempts {
    Table,
    Id,
    JobId,
    AttemptNumber,
    LogPath,
    Output,
    Status,
    CreatedAt,
    UpdatedAt,
    EndedAt,
}

#[async_trait::async_trait]
impl VersionedMigration for Migration {
    fn version(&self) -> &str {
        "0.29.15.001"
    }

    fn description(&self) -> &str {
        "Create jobs and attempts tables"
    }

    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Jobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Jobs::Id)
                            .integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(Jobs::ConfigType).string_len(32).not_null())
                    .col(ColumnDef::new(Jobs::Scope).string().not_null())
                    .col(ColumnDef::new(Jobs::Config).text().not_null())
                    .col(ColumnDef::new(Jobs::Status).string_len(32).not_null())
                    .col(ColumnDef::new(Jobs::StartedAt).timestamp_with_time_zone().null())
                    .col(
                        ColumnDef::new(Jobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Jobs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_jobs_scope")
                    .table(Jobs::Table)
                    .col(Jobs::Scope)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Attempts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Attempts::Id)
                            .integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(Attempts::JobId).integer().not_null())
                    .col(ColumnDef::new(Attempts::AttemptNumber).integer().not_null())
                    .col(ColumnDef::new(Attempts::LogPath).string().null())
                    .col(ColumnDef::new(Attempts::Output).text().null())
                    .col(ColumnDef::new(Attempts::Status).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Attempts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Attempts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Attempts::EndedAt).timestamp_with_time_zone().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attempts_job_id")
                            .from(Attempts::Table, Attempts::JobId)
                            .to(Jobs::Table, Jobs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_attempts_job_attempt_number")
                    .table(Attempts::Table)
                    .col(Attempts::JobId)
                    .col(Attempts::AttemptNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
