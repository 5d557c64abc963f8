//! Repository assembly over ready database handles.
//!
//! Wiring is fixed: the configuration repository, state persistence and
//! stream-reset persistence use the configs database; job persistence uses
//! the jobs database.

use db_infra::{
    BootstrapError, BootstrapStage, DbInfraError, LogicalDatabaseName, ReadyDatabase,
};
use sea_orm::DatabaseConnection;
use tracing::debug;

use crate::bootstrap::ReadyDatabases;

pub mod config_repository;
pub mod job_persistence;
pub mod state_persistence;
pub mod stream_reset_persistence;

pub use config_repository::ConfigRepository;
pub use job_persistence::JobPersistence;
pub use state_persistence::StatePersistence;
pub use stream_reset_persistence::StreamResetPersistence;

/// Take the connection of a ready database, refusing one bound elsewhere.
pub(crate) fn bind(
    ready: &ReadyDatabase,
    expected: LogicalDatabaseName,
) -> Result<DatabaseConnection, DbInfraError> {
    if ready.name() != expected {
        return Err(DbInfraError::MismatchedHandle {
            expected,
            actual: ready.name(),
        });
    }
    Ok(ready.connection().clone())
}

#[derive(Debug, Clone)]
pub struct Repositories {
    pub config: ConfigRepository,
    pub state: StatePersistence,
    pub stream_reset: StreamResetPersistence,
    pub jobs: JobPersistence,
}

impl Repositories {
    pub fn assemble(ready: &ReadyDatabases) -> Result<Self, BootstrapError> {
        let assembly = |database: LogicalDatabaseName| {
            move |e: DbInfraError| BootstrapError::new(database, BootstrapStage::Assembly, e)
        };
        let configs = ready
            .get(LogicalDatabaseName::Configs)
            .map_err(assembly(LogicalDatabaseName::Configs))?;
        let jobs = ready
            .get(LogicalDatabaseName::Jobs)
            .map_err(assembly(LogicalDatabaseName::Jobs))?;

        let repositories = Self {
            config: ConfigRepository::new(configs).map_err(assembly(LogicalDatabaseName::Configs))?,
            state: StatePersistence::new(configs).map_err(assembly(LogicalDatabaseName::Configs))?,
            stream_reset: StreamResetPersistence::new(configs)
                .map_err(assembly(LogicalDatabaseName::Configs))?,
            jobs: JobPersistence::new(jobs).map_err(assembly(LogicalDatabaseName::Jobs))?,
        };
        debug!(
            configs_version = %configs.schema_version(),
            jobs_version = %jobs.schema_version(),
            "repositories assembled"
        );
        Ok(repositories)
    }
}
