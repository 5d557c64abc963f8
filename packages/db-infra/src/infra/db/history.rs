use std::fmt;
use std::time::Duration;

use migration::{MigrationVersion, SchemaManager};
use sea_orm::sea_query::{Alias, ColumnDef, Expr, Func, Order, Query, Table};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, DeriveIden, QueryResult};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::config::db::LogicalDatabaseName;
use crate::error::DbInfraError;

#[derive(DeriveIden)]
enum HistoryColumn {
    InstalledRank,
    Version,
    Description,
    Type,
    Checksum,
    InstalledBy,
    InstalledOn,
    ExecutionTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Baseline,
    Migration,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Baseline => "BASELINE",
            RecordKind::Migration => "MIGRATION",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "BASELINE" => Some(RecordKind::Baseline),
            "MIGRATION" => Some(RecordKind::Migration),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the history table. Rows are never updated once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRecord {
    pub installed_rank: i32,
    pub version: MigrationVersion,
    pub description: String,
    pub kind: RecordKind,
    pub checksum: Option<i64>,
    pub installed_by: String,
    pub installed_on: OffsetDateTime,
    pub execution_time_ms: i64,
}

/// Values for a row about to be written.
#[derive(Debug, Clone)]
pub struct NewRecord<'a> {
    pub version: &'a MigrationVersion,
    /// Version text stored in the row, as the definition spells it.
    pub recorded_as: &'a str,
    pub description: &'a str,
    pub kind: RecordKind,
    pub checksum: Option<i64>,
    pub installed_by: &'a str,
    pub execution_time: Duration,
}

/// Access to the `airbyte_<name>_migrations` table of one logical database.
#[derive(Debug, Clone)]
pub struct MigrationHistory {
    table: String,
}

impl MigrationHistory {
    pub fn new(name: LogicalDatabaseName) -> Self {
        Self {
            table: name.migration_table(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn err(&self, source: DbErr) -> DbInfraError {
        DbInfraError::history(&self.table, source)
    }

    pub async fn exists(&self, conn: &DatabaseConnection) -> Result<bool, DbInfraError> {
        SchemaManager::new(conn)
            .has_table(&self.table)
            .await
            .map_err(|e| self.err(e))
    }

    pub async fn ensure_table<C: ConnectionTrait>(&self, conn: &C) -> Result<(), DbInfraError> {
        let stmt = Table::create()
            .table(Alias::new(&self.table))
            .if_not_exists()
            .col(
                ColumnDef::new(HistoryColumn::InstalledRank)
                    .integer()
                    .not_null()
                    .primary_key(),
            )
            .col(ColumnDef::new(HistoryColumn::Version).string_len(50).not_null())
            .col(ColumnDef::new(HistoryColumn::Description).string_len(200).not_null())
            .col(ColumnDef::new(HistoryColumn::Type).string_len(20).not_null())
            .col(ColumnDef::new(HistoryColumn::Checksum).big_integer().null())
            .col(ColumnDef::new(HistoryColumn::InstalledBy).string_len(100).not_null())
            .col(ColumnDef::new(HistoryColumn::InstalledOn).string_len(40).not_null())
            .col(ColumnDef::new(HistoryColumn::ExecutionTime).big_integer().not_null())
            .to_owned();

        let backend = conn.get_database_backend();
        conn.execute(backend.build(&stmt))
            .await
            .map_err(|e| self.err(e))?;
        Ok(())
    }

    /// All rows in insertion order; empty when the table does not exist.
    pub async fn load(&self, conn: &DatabaseConnection) -> Result<Vec<MigrationRecord>, DbInfraError> {
        if !self.exists(conn).await? {
            return Ok(Vec::new());
        }

        let stmt = Query::select()
            .columns([
                HistoryColumn::InstalledRank,
                HistoryColumn::Version,
                HistoryColumn::Description,
                HistoryColumn::Type,
                HistoryColumn::Checksum,
                HistoryColumn::InstalledBy,
                HistoryColumn::InstalledOn,
                HistoryColumn::ExecutionTime,
            ])
            .from(Alias::new(&self.table))
            .order_by(HistoryColumn::InstalledRank, Order::Asc)
            .to_owned();

        let backend = conn.get_database_backend();
        let rows = conn
            .query_all(backend.build(&stmt))
            .await
            .map_err(|e| self.err(e))?;

        rows.iter().map(|row| self.decode(row)).collect()
    }

    /// Highest recorded version, read straight from the table.
    pub async fn latest_version(
        &self,
        conn: &DatabaseConnection,
    ) -> Result<Option<MigrationVersion>, DbInfraError> {
        Ok(self
            .load(conn)
            .await?
            .into_iter()
            .map(|record| record.version)
            .max())
    }

    pub async fn insert<C: ConnectionTrait>(
        &self,
        conn: &C,
        record: NewRecord<'_>,
    ) -> Result<MigrationRecord, DbInfraError> {
        self.try_insert(conn, record).await.map_err(|e| self.err(e))
    }

    /// Like [`insert`](Self::insert), leaving error classification to the caller.
    pub(crate) async fn try_insert<C: ConnectionTrait>(
        &self,
        conn: &C,
        record: NewRecord<'_>,
    ) -> Result<MigrationRecord, DbErr> {
        let backend = conn.get_database_backend();

        let max_rank = Query::select()
            .expr_as(
                Func::max(Expr::col(HistoryColumn::InstalledRank)),
                Alias::new("max_rank"),
            )
            .from(Alias::new(&self.table))
            .to_owned();
        let installed_rank = conn
            .query_one(backend.build(&max_rank))
            .await?
            .map(|row| row.try_get::<Option<i32>>("", "max_rank"))
            .transpose()?
            .flatten()
            .unwrap_or(0)
            + 1;

        let installed_on = OffsetDateTime::now_utc()
            .replace_nanosecond(0)
            .map_err(|e| DbErr::Custom(format!("invalid installation timestamp: {e}")))?;
        let installed_on_text = installed_on
            .format(&Rfc3339)
            .map_err(|e| DbErr::Custom(format!("timestamp formatting failed: {e}")))?;
        let execution_time_ms = i64::try_from(record.execution_time.as_millis()).unwrap_or(i64::MAX);

        let stmt = Query::insert()
            .into_table(Alias::new(&self.table))
            .columns([
                HistoryColumn::InstalledRank,
                HistoryColumn::Version,
                HistoryColumn::Description,
                HistoryColumn::Type,
                HistoryColumn::Checksum,
                HistoryColumn::InstalledBy,
                HistoryColumn::InstalledOn,
                HistoryColumn::ExecutionTime,
            ])
            .values_panic([
                installed_rank.into(),
                record.recorded_as.into(),
                record.description.into(),
                record.kind.as_str().into(),
                record.checksum.into(),
                record.installed_by.into(),
                installed_on_text.into(),
                execution_time_ms.into(),
            ])
            .to_owned();

        conn.execute(backend.build(&stmt)).await?;

        Ok(MigrationRecord {
            installed_rank,
            version: record.version.clone(),
            description: record.description.to_string(),
            kind: record.kind,
            checksum: record.checksum,
            installed_by: record.installed_by.to_string(),
            installed_on,
            execution_time_ms,
        })
    }

    fn decode(&self, row: &QueryResult) -> Result<MigrationRecord, DbInfraError> {
        let column_err = |e: DbErr| self.err(e);

        let raw_version: String = row.try_get("", "version").map_err(column_err)?;
        let version = MigrationVersion::parse(&raw_version).map_err(|e| {
            DbInfraError::InvalidMigrationVersion {
                raw: e.raw,
                reason: format!("recorded in {}: {}", self.table, e.reason),
            }
        })?;

        let raw_kind: String = row.try_get("", "type").map_err(column_err)?;
        let kind = RecordKind::parse(&raw_kind).ok_or_else(|| {
            self.err(DbErr::Custom(format!("unknown record type '{raw_kind}'")))
        })?;

        let raw_installed_on: String = row.try_get("", "installed_on").map_err(column_err)?;
        let installed_on = OffsetDateTime::parse(&raw_installed_on, &Rfc3339).map_err(|e| {
            self.err(DbErr::Custom(format!(
                "unreadable installed_on '{raw_installed_on}': {e}"
            )))
        })?;

        Ok(MigrationRecord {
            installed_rank: row.try_get("", "installed_rank").map_err(column_err)?,
            version,
            description: row.try_get("", "description").map_err(column_err)?,
            kind,
            checksum: row.try_get("", "checksum").map_err(column_err)?,
            installed_by: row.try_get("", "installed_by").map_err(column_err)?,
            installed_on,
            execution_time_ms: row.try_get("", "execution_time").map_err(column_err)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Statement;

    use super::*;

    async fn memory_db() -> DatabaseConnection {
        worker_test_support::db::memory_connection().await
    }

    fn v(raw: &str) -> MigrationVersion {
        MigrationVersion::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn missing_table_reads_as_empty() {
        let conn = memory_db().await;
        let history = MigrationHistory::new(LogicalDatabaseName::Jobs);

        assert!(!history.exists(&conn).await.unwrap());
        assert!(history.load(&conn).await.unwrap().is_empty());
        assert_eq!(history.latest_version(&conn).await.unwrap(), None);
    }

    #[tokio::test]
    async fn ensure_table_is_idempotent() {
        let conn = memory_db().await;
        let history = MigrationHistory::new(LogicalDatabaseName::Configs);

        history.ensure_table(&conn).await.unwrap();
        history.ensure_table(&conn).await.unwrap();

        assert_eq!(history.table(), "airbyte_configs_migrations");
        assert!(history.exists(&conn).await.unwrap());
        assert!(history.load(&conn).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn insert_assigns_ranks_and_round_trips_rows() {
        let conn = memory_db().await;
        let history = MigrationHistory::new(LogicalDatabaseName::Jobs);
        history.ensure_table(&conn).await.unwrap();

        let baseline = v("0.29.15.001");
        let first = history
            .insert(
                &conn,
                NewRecord {
                    version: &baseline,
                    recorded_as: "0.29.15.001",
                    description: "Baseline from file-based migration v1",
                    kind: RecordKind::Baseline,
                    checksum: None,
                    installed_by: "WorkerApp",
                    execution_time: Duration::ZERO,
                },
            )
            .await
            .unwrap();
        let next = v("0.35.5.001");
        let second = history
            .insert(
                &conn,
                NewRecord {
                    version: &next,
                    recorded_as: "0.35.5.001",
                    description: "add attempt workflow id",
                    kind: RecordKind::Migration,
                    checksum: Some(42),
                    installed_by: "WorkerApp",
                    execution_time: Duration::from_millis(17),
                },
            )
            .await
            .unwrap();

        assert_eq!(first.installed_rank, 1);
        assert_eq!(second.installed_rank, 2);

        let loaded = history.load(&conn).await.unwrap();
        assert_eq!(loaded, vec![first, second]);
        assert_eq!(loaded[1].execution_time_ms, 17);
        assert_eq!(history.latest_version(&conn).await.unwrap(), Some(next));

        let stored: Vec<String> = conn
            .query_all(Statement::from_string(
                conn.get_database_backend(),
                "SELECT version FROM airbyte_jobs_migrations ORDER BY installed_rank",
            ))
            .await
            .unwrap()
            .iter()
            .map(|row| row.try_get("", "version").unwrap())
            .collect();
        assert_eq!(stored, ["0.29.15.001", "0.35.5.001"]);
    }

    #[tokio::test]
    async fn latest_version_is_the_highest_not_the_last_inserted() {
        let conn = memory_db().await;
        let history = MigrationHistory::new(LogicalDatabaseName::Jobs);
        history.ensure_table(&conn).await.unwrap();

        for raw in ["2", "10", "3"] {
            let version = v(raw);
            history
                .insert(
                    &conn,
                    NewRecord {
                        version: &version,
                        recorded_as: raw,
                        description: "step",
                        kind: RecordKind::Migration,
                        checksum: None,
                        installed_by: "test",
                        execution_time: Duration::ZERO,
                    },
                )
                .await
                .unwrap();
        }

        assert_eq!(history.latest_version(&conn).await.unwrap(), Some(v("10")));
    }
}
