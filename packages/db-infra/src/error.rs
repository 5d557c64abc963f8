use std::fmt;
use std::time::Duration;

use migration::MigrationVersion;
use sea_orm::DbErr;
use thiserror::Error;

use crate::config::db::LogicalDatabaseName;

#[derive(Debug, Error)]
pub enum DbInfraError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Connection error: {message}")]
    Connection { message: String },

    #[error("invalid migration version '{raw}': {reason}")]
    InvalidMigrationVersion { raw: String, reason: String },

    #[error("duplicate migration version {version}")]
    DuplicateMigration { version: MigrationVersion },

    #[error("migration history table '{table}' could not be accessed: {source}")]
    MigrationHistory {
        table: String,
        #[source]
        source: DbErr,
    },

    #[error("migration {version} ({description}) failed: {source}")]
    MigrationApply {
        version: MigrationVersion,
        description: String,
        #[source]
        source: DbErr,
    },

    #[error(
        "incompatible schema version: current={}, required={required}",
        .current.as_ref().map_or_else(|| "none".to_string(), ToString::to_string)
    )]
    IncompatibleSchemaVersion {
        current: Option<MigrationVersion>,
        required: MigrationVersion,
    },

    #[error("database unavailable after {}ms: {last_error}", .elapsed.as_millis())]
    DatabaseUnavailable {
        elapsed: Duration,
        last_error: String,
    },

    #[error("cancelled after {}ms", .elapsed.as_millis())]
    Cancelled { elapsed: Duration },

    #[error("no ready handle for the {database} database")]
    MissingHandle { database: LogicalDatabaseName },

    #[error("handle for the {actual} database supplied where {expected} was required")]
    MismatchedHandle {
        expected: LogicalDatabaseName,
        actual: LogicalDatabaseName,
    },
}

impl DbInfraError {
    pub(crate) fn history(table: &str, source: DbErr) -> Self {
        DbInfraError::MigrationHistory {
            table: table.to_string(),
            source,
        }
    }
}

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BootstrapStage {
    Connection,
    Migration,
    VersionGate,
    Availability,
    Assembly,
}

impl BootstrapStage {
    pub fn as_str(self) -> &'static str {
        match self {
            BootstrapStage::Connection => "connection",
            BootstrapStage::Migration => "migration",
            BootstrapStage::VersionGate => "version_gate",
            BootstrapStage::Availability => "availability",
            BootstrapStage::Assembly => "assembly",
        }
    }
}

impl fmt::Display for BootstrapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pipeline failure tagged with the database and stage it came from.
#[derive(Debug, Error)]
#[error("bootstrap of the {database} database failed at stage {stage}: {source}")]
pub struct BootstrapError {
    pub database: LogicalDatabaseName,
    pub stage: BootstrapStage,
    #[source]
    pub source: DbInfraError,
}

impl BootstrapError {
    pub fn new(database: LogicalDatabaseName, stage: BootstrapStage, source: DbInfraError) -> Self {
        Self {
            database,
            stage,
            source,
        }
    }
}
