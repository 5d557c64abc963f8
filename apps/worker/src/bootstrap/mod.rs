//! Startup sequence: both database pipelines, then repository assembly.

use db_infra::infra::db::bootstrap_counters;
use db_infra::{bootstrap_database, DbInfraError, LogicalDatabaseName, ReadyDatabase};
use migration::MigrationSet;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::WorkerMode;
use crate::error::AppError;
use crate::repos::Repositories;

pub use crate::config::DatabaseConfigs;

/// Migration definitions for each logical database.
pub struct MigrationSources {
    pub configs: MigrationSet,
    pub jobs: MigrationSet,
}

impl MigrationSources {
    /// The sets compiled into this build.
    pub fn shipped() -> Self {
        Self {
            configs: migration::configs::migrations(),
            jobs: migration::jobs::migrations(),
        }
    }
}

/// Pipelines that finished every stage, one per logical database.
#[derive(Debug, Clone, Default)]
pub struct ReadyDatabases {
    ready: Vec<ReadyDatabase>,
}

impl ReadyDatabases {
    pub fn new(ready: impl IntoIterator<Item = ReadyDatabase>) -> Self {
        Self {
            ready: ready.into_iter().collect(),
        }
    }

    pub fn get(&self, name: LogicalDatabaseName) -> Result<&ReadyDatabase, DbInfraError> {
        self.ready
            .iter()
            .find(|db| db.name() == name)
            .ok_or(DbInfraError::MissingHandle { database: name })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReadyDatabase> {
        self.ready.iter()
    }
}

/// What the worker holds after startup.
#[derive(Debug, Clone)]
pub enum Persistence {
    ControlPlane {
        databases: ReadyDatabases,
        repositories: Repositories,
    },
    DataPlane,
}

impl Persistence {
    pub fn repositories(&self) -> Option<&Repositories> {
        match self {
            Persistence::ControlPlane { repositories, .. } => Some(repositories),
            Persistence::DataPlane => None,
        }
    }

    pub fn databases(&self) -> Option<&ReadyDatabases> {
        match self {
            Persistence::ControlPlane { databases, .. } => Some(databases),
            Persistence::DataPlane => None,
        }
    }
}

/// Bring up the worker's persistence.
///
/// The configs and jobs pipelines run concurrently; the first failure aborts
/// the whole bootstrap and no repository is built.
pub async fn bootstrap(
    mode: WorkerMode,
    databases: Option<&DatabaseConfigs>,
    sources: &MigrationSources,
    cancel: &CancellationToken,
) -> Result<Persistence, AppError> {
    if mode == WorkerMode::DataPlane {
        info!("bootstrap=skipped mode={}", mode);
        return Ok(Persistence::DataPlane);
    }

    let databases = databases.ok_or_else(|| {
        AppError::config(format!("{mode} mode requires settings for both databases"))
    })?;

    info!("bootstrap=start mode={}", mode);
    let result = tokio::try_join!(
        bootstrap_database(&databases.configs, &sources.configs, cancel),
        bootstrap_database(&databases.jobs, &sources.jobs, cancel),
    );
    bootstrap_counters::log_snapshot("worker_bootstrap");
    let (configs, jobs) = result?;

    let databases = ReadyDatabases::new([configs, jobs]);
    let repositories = Repositories::assemble(&databases)?;

    info!("bootstrap=done mode={}", mode);
    Ok(Persistence::ControlPlane {
        databases,
        repositories,
    })
}
