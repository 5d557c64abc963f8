//! Database bootstrap infrastructure for the worker's logical databases.
//! Used by the worker startup sequence and the migration CLI.

pub mod config;
pub mod error;
pub mod infra;

pub use config::db;
pub use config::db::{ConnectionDescriptor, DatabaseSettings, LogicalDatabaseName};
pub use error::{BootstrapError, BootstrapStage, DbInfraError};
pub use infra::db::{bootstrap_connected, bootstrap_database, LogicalDatabase, ReadyDatabase};
