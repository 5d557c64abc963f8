use std::collections::{HashMap, HashSet};
use std::time::Instant;

use async_trait::async_trait;
use migration::{MigrationVersion, SchemaManager, VersionedMigration};
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{error, info, trace};

use crate::config::db::{DatabaseSettings, LogicalDatabaseName};
use crate::error::DbInfraError;
use crate::infra::db::diagnostics::bootstrap_counters;
use crate::infra::db::history::{MigrationHistory, MigrationRecord, NewRecord, RecordKind};

pub const BASELINE_DESCRIPTION: &str = "Baseline from file-based migration v1";

/// What a runner invocation changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOutcome {
    /// Set when this run wrote the baseline row.
    pub baselined: Option<MigrationVersion>,
    /// Versions applied by this run, ascending.
    pub applied: Vec<MigrationVersion>,
    pub latest: Option<MigrationVersion>,
}

impl MigrationOutcome {
    pub fn is_noop(&self) -> bool {
        self.baselined.is_none() && self.applied.is_empty()
    }
}

/// Executes pending migrations against one logical database.
#[async_trait]
pub trait ApplyMigrations: Send + Sync {
    async fn apply_pending_migrations(
        &self,
        conn: &DatabaseConnection,
        migrations: &[Box<dyn VersionedMigration>],
    ) -> Result<MigrationOutcome, DbInfraError>;
}

/// A definition with its parsed version.
pub struct PlannedMigration<'a> {
    pub version: MigrationVersion,
    pub migration: &'a dyn VersionedMigration,
}

/// Parse every version, reject duplicates and sort ascending.
pub fn plan(
    migrations: &[Box<dyn VersionedMigration>],
) -> Result<Vec<PlannedMigration<'_>>, DbInfraError> {
    let mut seen = HashSet::new();
    let mut planned = Vec::with_capacity(migrations.len());

    for migration in migrations {
        let version = MigrationVersion::parse(migration.version()).map_err(|e| {
            DbInfraError::InvalidMigrationVersion {
                raw: e.raw,
                reason: e.reason.to_string(),
            }
        })?;
        if !seen.insert(version.clone()) {
            return Err(DbInfraError::DuplicateMigration { version });
        }
        planned.push(PlannedMigration {
            version,
            migration: migration.as_ref(),
        });
    }

    planned.sort_by(|a, b| a.version.cmp(&b.version));
    Ok(planned)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    Baseline,
    Applied,
    /// Applied, but the recorded checksum differs from the definition.
    Modified,
    Pending,
    /// At or below the current version and never recorded.
    Ignored,
    /// Recorded but unknown to this build.
    Future,
}

impl MigrationState {
    pub fn as_str(self) -> &'static str {
        match self {
            MigrationState::Baseline => "baseline",
            MigrationState::Applied => "applied",
            MigrationState::Modified => "modified",
            MigrationState::Pending => "pending",
            MigrationState::Ignored => "ignored",
            MigrationState::Future => "future",
        }
    }
}

/// One line of a history report.
#[derive(Debug, Clone)]
pub struct MigrationInfo {
    pub version: MigrationVersion,
    pub description: String,
    pub state: MigrationState,
    pub record: Option<MigrationRecord>,
}

/// Flyway-style runner with baseline semantics.
#[derive(Debug, Clone)]
pub struct MigrationRunner {
    name: LogicalDatabaseName,
    history: MigrationHistory,
    baseline_version: MigrationVersion,
    installed_by: String,
}

impl MigrationRunner {
    pub fn new(
        name: LogicalDatabaseName,
        baseline_version: MigrationVersion,
        installed_by: impl Into<String>,
    ) -> Self {
        Self {
            name,
            history: MigrationHistory::new(name),
            baseline_version,
            installed_by: installed_by.into(),
        }
    }

    pub fn from_settings(settings: &DatabaseSettings) -> Self {
        Self::new(
            settings.name,
            settings.baseline_version.clone(),
            settings.installed_by.clone(),
        )
    }

    pub fn history(&self) -> &MigrationHistory {
        &self.history
    }

    /// Compare recorded history with the known definitions without changing anything.
    pub async fn info(
        &self,
        conn: &DatabaseConnection,
        migrations: &[Box<dyn VersionedMigration>],
    ) -> Result<Vec<MigrationInfo>, DbInfraError> {
        let planned = plan(migrations)?;
        let records = self.history.load(conn).await?;
        let latest = records.iter().map(|r| r.version.clone()).max();

        let mut by_version: HashMap<MigrationVersion, MigrationRecord> = records
            .iter()
            .filter(|r| r.kind == RecordKind::Migration)
            .map(|r| (r.version.clone(), r.clone()))
            .collect();

        let mut report: Vec<MigrationInfo> = records
            .iter()
            .filter(|r| r.kind == RecordKind::Baseline)
            .map(|r| MigrationInfo {
                version: r.version.clone(),
                description: r.description.clone(),
                state: MigrationState::Baseline,
                record: Some(r.clone()),
            })
            .collect();

        for PlannedMigration { version, migration } in planned {
            let record = by_version.remove(&version);
            let state = match &record {
                Some(r) if r.checksum.is_some() && r.checksum != migration.checksum() => {
                    MigrationState::Modified
                }
                Some(_) => MigrationState::Applied,
                None if latest.as_ref().is_some_and(|l| version <= *l) => MigrationState::Ignored,
                None => MigrationState::Pending,
            };
            report.push(MigrationInfo {
                version,
                description: migration.description().to_string(),
                state,
                record,
            });
        }

        report.extend(by_version.into_values().map(|r| MigrationInfo {
            version: r.version.clone(),
            description: r.description.clone(),
            state: MigrationState::Future,
            record: Some(r),
        }));
        report.sort_by(|a, b| a.version.cmp(&b.version));
        Ok(report)
    }

    async fn write_baseline(&self, conn: &DatabaseConnection) -> Result<(), DbInfraError> {
        let recorded_as = self.baseline_version.to_string();
        self.history
            .insert(
                conn,
                NewRecord {
                    version: &self.baseline_version,
                    recorded_as: &recorded_as,
                    description: BASELINE_DESCRIPTION,
                    kind: RecordKind::Baseline,
                    checksum: None,
                    installed_by: &self.installed_by,
                    execution_time: std::time::Duration::ZERO,
                },
            )
            .await?;
        bootstrap_counters::baseline_inserted();
        info!(
            "migrate=baseline database={} table={} version={}",
            self.name,
            self.history.table(),
            self.baseline_version
        );
        Ok(())
    }

    async fn apply_one(
        &self,
        conn: &DatabaseConnection,
        planned: &PlannedMigration<'_>,
    ) -> Result<(), DbInfraError> {
        let PlannedMigration { version, migration } = planned;
        let apply_err = |source| DbInfraError::MigrationApply {
            version: version.clone(),
            description: migration.description().to_string(),
            source,
        };

        let start = Instant::now();
        let txn = conn.begin().await.map_err(apply_err)?;

        // Dropping `txn` on an early return rolls back both the schema change and the row.
        migration
            .up(&SchemaManager::new(&txn))
            .await
            .map_err(apply_err)?;
        self.history
            .try_insert(
                &txn,
                NewRecord {
                    version,
                    recorded_as: migration.version(),
                    description: migration.description(),
                    kind: RecordKind::Migration,
                    checksum: migration.checksum(),
                    installed_by: &self.installed_by,
                    execution_time: start.elapsed(),
                },
            )
            .await
            .map_err(apply_err)?;
        txn.commit().await.map_err(apply_err)?;

        trace!(
            database = %self.name,
            version = %version,
            elapsed_ms = start.elapsed().as_millis(),
            "migration applied"
        );
        Ok(())
    }
}

#[async_trait]
impl ApplyMigrations for MigrationRunner {
    async fn apply_pending_migrations(
        &self,
        conn: &DatabaseConnection,
        migrations: &[Box<dyn VersionedMigration>],
    ) -> Result<MigrationOutcome, DbInfraError> {
        let planned = plan(migrations)?;

        info!(
            "migrate=start database={} table={} known={}",
            self.name,
            self.history.table(),
            planned.len()
        );

        self.history.ensure_table(conn).await?;
        let records = self.history.load(conn).await?;

        let (baselined, mut latest) = if records.is_empty() {
            self.write_baseline(conn).await?;
            (
                Some(self.baseline_version.clone()),
                Some(self.baseline_version.clone()),
            )
        } else {
            (None, records.into_iter().map(|r| r.version).max())
        };

        let floor = latest.clone();
        let mut applied = Vec::new();
        for step in planned
            .iter()
            .filter(|step| floor.as_ref().map_or(true, |l| step.version > *l))
        {
            if let Err(e) = self.apply_one(conn, step).await {
                bootstrap_counters::migration_failed();
                error!(
                    database = %self.name,
                    version = %step.version,
                    description = step.migration.description(),
                    error = %e,
                    "migration failed; remaining migrations skipped"
                );
                return Err(e);
            }
            bootstrap_counters::migration_applied();
            applied.push(step.version.clone());
            latest = Some(step.version.clone());
        }

        info!(
            "migrate=done database={} applied={} latest={}",
            self.name,
            applied.len(),
            latest
                .as_ref()
                .map_or_else(|| "none".to_string(), ToString::to_string)
        );

        Ok(MigrationOutcome {
            baselined,
            applied,
            latest,
        })
    }
}
