pub mod bootstrap;
pub mod config;
pub mod error;
pub mod repos;
pub mod routes;
pub mod state;

// Re-exports for public API
pub use bootstrap::{bootstrap, MigrationSources, Persistence, ReadyDatabases};
pub use config::{DatabaseConfigs, WorkerConfig, WorkerMode};
pub use error::AppError;
pub use state::app_state::AppState;
