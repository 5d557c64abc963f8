//! Worker test support utilities
//!
//! Shared by the db-infra unit tests and the worker integration tests:
//! logging initialisation, SQLite connections and scripted migration sets.

pub mod db;
pub mod fixtures;
pub mod logging;
