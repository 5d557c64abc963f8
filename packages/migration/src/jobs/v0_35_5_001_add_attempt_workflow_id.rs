use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::{ColumnDef, Table};

use crate::VersionedMigration;

pub struct Migration;

#[derive(Iden)]
enum Attempts {
    Table,
    TemporalWorkflowId,
}

#[async_trait::async_trait]
impl VersionedMigration for Migration {
    fn version(&self) -> &str {
        "0.35.5.001"
    }

    fn description(&self) -> &str {
        "Add temporal workflow id to attempts"
    }

    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Attempts::Table)
                    .add_column(
                        ColumnDef::new(Attempts::TemporalWorkflowId)
                            .string_len(256)
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }
}
