use std::time::Instant;

use migration::{MigrationVersion, VersionedMigration};
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::db::{ConnectionDescriptor, DatabaseSettings, DbKind, LogicalDatabaseName};
use crate::error::{BootstrapError, BootstrapStage, DbInfraError};
use crate::infra::db::availability::{probe, AvailabilityCheckResult, ProbeSettings};
use crate::infra::db::connection;
use crate::infra::db::diagnostics::bootstrap_counters;
use crate::infra::db::history::MigrationHistory;
use crate::infra::db::runner::{ApplyMigrations, MigrationOutcome, MigrationRunner};
use crate::infra::db::version_gate::enforce_minimum_version;

/// A connection handle bound to one logical database.
#[derive(Debug, Clone)]
pub struct LogicalDatabase {
    name: LogicalDatabaseName,
    kind: DbKind,
    conn: DatabaseConnection,
}

impl LogicalDatabase {
    pub async fn connect(
        name: LogicalDatabaseName,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Self, DbInfraError> {
        let (conn, kind) = connection::connect(name, descriptor).await?;
        Ok(Self { name, kind, conn })
    }

    pub fn name(&self) -> LogicalDatabaseName {
        self.name
    }

    pub fn kind(&self) -> DbKind {
        self.kind
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    pub fn migration_table(&self) -> String {
        self.name.migration_table()
    }
}

/// A database that has been migrated, passed the version gate and answered
/// the availability probe. Only [`bootstrap_database`] and
/// [`bootstrap_connected`] produce one.
#[derive(Debug, Clone)]
pub struct ReadyDatabase {
    database: LogicalDatabase,
    schema_version: MigrationVersion,
    migration: MigrationOutcome,
    availability: AvailabilityCheckResult,
}

impl ReadyDatabase {
    pub fn name(&self) -> LogicalDatabaseName {
        self.database.name
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.database.conn
    }

    pub fn database(&self) -> &LogicalDatabase {
        &self.database
    }

    /// Version verified by the gate.
    pub fn schema_version(&self) -> &MigrationVersion {
        &self.schema_version
    }

    pub fn migration_outcome(&self) -> &MigrationOutcome {
        &self.migration
    }

    pub fn availability(&self) -> &AvailabilityCheckResult {
        &self.availability
    }
}

/// Run the full pipeline for one logical database: connection, migration,
/// version gate, then availability.
///
/// Reachability is awaited within the initialization timeout before the
/// runner starts; a server that never answers fails as
/// [`DbInfraError::DatabaseUnavailable`] at the availability stage.
pub async fn bootstrap_database(
    settings: &DatabaseSettings,
    migrations: &[Box<dyn VersionedMigration>],
    cancel: &CancellationToken,
) -> Result<ReadyDatabase, BootstrapError> {
    info!(
        "bootstrap=start database={} table={} min_version={} baseline={}",
        settings.name,
        settings.migration_table(),
        settings.minimum_migration_version,
        settings.baseline_version
    );

    let database = LogicalDatabase::connect(settings.name, &settings.connection)
        .await
        .map_err(|e| fail(settings.name, BootstrapStage::Connection, e))?;

    let runner = MigrationRunner::from_settings(settings);
    bootstrap_connected(database, settings, &runner, migrations, cancel).await
}

/// Pipeline for an already connected database, with a caller-chosen runner.
pub async fn bootstrap_connected<A>(
    database: LogicalDatabase,
    settings: &DatabaseSettings,
    runner: &A,
    migrations: &[Box<dyn VersionedMigration>],
    cancel: &CancellationToken,
) -> Result<ReadyDatabase, BootstrapError>
where
    A: ApplyMigrations + ?Sized,
{
    let name = settings.name;
    let start = Instant::now();

    if database.name() != name {
        return Err(fail(
            name,
            BootstrapStage::Connection,
            DbInfraError::MismatchedHandle {
                expected: name,
                actual: database.name(),
            },
        ));
    }

    let probe_settings = ProbeSettings::new(settings.initialization_timeout);

    // The pool is lazy: wait out a server that is still starting before the
    // runner touches the history table.
    probe(name, database.connection(), &probe_settings, cancel)
        .await
        .into_result()
        .map_err(|e| fail(name, BootstrapStage::Availability, e))?;

    let migration = runner
        .apply_pending_migrations(database.connection(), migrations)
        .await
        .map_err(|e| fail(name, BootstrapStage::Migration, e))?;

    let schema_version = enforce_minimum_version(
        database.connection(),
        &MigrationHistory::new(name),
        &settings.minimum_migration_version,
    )
    .await
    .map_err(|e| fail(name, BootstrapStage::VersionGate, e))?;

    let availability = probe(name, database.connection(), &probe_settings, cancel)
        .await
        .into_result()
        .map_err(|e| fail(name, BootstrapStage::Availability, e))?;

    bootstrap_counters::pipeline_ready();
    info!(
        "bootstrap=ready database={} schema_version={} applied={} elapsed_ms={}",
        name,
        schema_version,
        migration.applied.len(),
        start.elapsed().as_millis()
    );

    Ok(ReadyDatabase {
        database,
        schema_version,
        migration,
        availability,
    })
}

fn fail(database: LogicalDatabaseName, stage: BootstrapStage, source: DbInfraError) -> BootstrapError {
    error!("bootstrap=failed database={} stage={} err={}", database, stage, source);
    BootstrapError::new(database, stage, source)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use worker_test_support::fixtures::numbered_migrations;

    use super::*;

    fn v(raw: &str) -> MigrationVersion {
        MigrationVersion::parse(raw).unwrap()
    }

    fn settings(name: LogicalDatabaseName, url: &str, minimum: &str) -> DatabaseSettings {
        DatabaseSettings::new(name, ConnectionDescriptor::new(url), v(minimum))
            .with_baseline_version(v("0"))
            .with_initialization_timeout(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn empty_database_reaches_ready() {
        let settings = settings(LogicalDatabaseName::Configs, "sqlite::memory:", "3");
        let ready = bootstrap_database(&settings, &numbered_migrations(5), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(ready.name(), LogicalDatabaseName::Configs);
        assert_eq!(ready.schema_version(), &v("5"));
        assert_eq!(ready.migration_outcome().baselined, Some(v("0")));
        assert_eq!(ready.migration_outcome().applied.len(), 5);
        assert!(ready.availability().is_available());
        assert_eq!(ready.database().kind(), DbKind::SqliteMemory);
    }

    #[tokio::test]
    async fn malformed_url_fails_at_connection() {
        let settings = settings(LogicalDatabaseName::Jobs, "mysql://nope/db", "1");
        let err = bootstrap_database(&settings, &numbered_migrations(1), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.database, LogicalDatabaseName::Jobs);
        assert_eq!(err.stage, BootstrapStage::Connection);
        assert!(matches!(err.source, DbInfraError::Connection { .. }));
    }

    #[tokio::test]
    async fn minimum_above_known_migrations_fails_at_gate() {
        let settings = settings(LogicalDatabaseName::Jobs, "sqlite::memory:", "7");
        let err = bootstrap_database(&settings, &numbered_migrations(5), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.stage, BootstrapStage::VersionGate);
        match err.source {
            DbInfraError::IncompatibleSchemaVersion { current, required } => {
                assert_eq!(current, Some(v("5")));
                assert_eq!(required, v("7"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    struct RefusingRunner;

    #[async_trait]
    impl ApplyMigrations for RefusingRunner {
        async fn apply_pending_migrations(
            &self,
            _conn: &DatabaseConnection,
            _migrations: &[Box<dyn VersionedMigration>],
        ) -> Result<MigrationOutcome, DbInfraError> {
            Err(DbInfraError::DuplicateMigration { version: v("1") })
        }
    }

    #[tokio::test]
    async fn runner_failure_stops_before_the_gate() {
        let settings = settings(LogicalDatabaseName::Configs, "sqlite::memory:", "1");
        let database = LogicalDatabase::connect(settings.name, &settings.connection)
            .await
            .unwrap();

        let err = bootstrap_connected(
            database.clone(),
            &settings,
            &RefusingRunner,
            &numbered_migrations(1),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.stage, BootstrapStage::Migration);
        assert!(!MigrationHistory::new(LogicalDatabaseName::Configs)
            .exists(database.connection())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn handle_for_the_other_database_is_rejected() {
        let settings = settings(LogicalDatabaseName::Configs, "sqlite::memory:", "1");
        let jobs = LogicalDatabase::connect(LogicalDatabaseName::Jobs, &settings.connection)
            .await
            .unwrap();

        let err = bootstrap_connected(
            jobs,
            &settings,
            &MigrationRunner::from_settings(&settings),
            &numbered_migrations(1),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err.source,
            DbInfraError::MismatchedHandle {
                expected: LogicalDatabaseName::Configs,
                actual: LogicalDatabaseName::Jobs
            }
        ));
    }

    #[tokio::test]
    async fn cancelled_probe_fails_at_availability() {
        let settings = settings(LogicalDatabaseName::Jobs, "sqlite::memory:", "1");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = bootstrap_database(&settings, &numbered_migrations(2), &cancel)
            .await
            .unwrap_err();

        assert_eq!(err.stage, BootstrapStage::Availability);
        assert!(matches!(err.source, DbInfraError::Cancelled { .. }));
    }

    #[tokio::test]
    async fn unreachable_server_is_waited_out_before_migrating() {
        let mut settings = settings(
            LogicalDatabaseName::Jobs,
            "postgresql://worker:pw@127.0.0.1:1/jobs",
            "1",
        )
        .with_initialization_timeout(Duration::from_millis(800));
        settings.connection.pool.acquire_timeout = Duration::from_millis(200);

        let started = Instant::now();
        let err = bootstrap_database(&settings, &numbered_migrations(1), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(started.elapsed() >= Duration::from_millis(800));
        assert_eq!(err.database, LogicalDatabaseName::Jobs);
        assert_eq!(err.stage, BootstrapStage::Availability);
        match err.source {
            DbInfraError::DatabaseUnavailable { elapsed, .. } => {
                assert!(elapsed >= Duration::from_millis(800), "{elapsed:?}");
            }
            other => panic!("expected DatabaseUnavailable, got {other:?}"),
        }
    }
}
