pub mod availability;
pub mod connection;
pub mod core;
pub mod diagnostics;
pub mod history;
pub mod runner;
pub mod version_gate;

pub use availability::{probe, AvailabilityCheckResult, LivenessCheck, ProbeOutcome, ProbeSettings};
pub use connection::sanitize_db_url;
pub use self::core::{bootstrap_connected, bootstrap_database, LogicalDatabase, ReadyDatabase};
pub use diagnostics::bootstrap_counters;
pub use history::{MigrationHistory, MigrationRecord, RecordKind};
pub use runner::{
    ApplyMigrations, MigrationInfo, MigrationOutcome, MigrationRunner, MigrationState,
    BASELINE_DESCRIPTION,
};
pub use version_gate::{check_version, enforce_minimum_version};
