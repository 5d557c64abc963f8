pub use sea_orm::{ConnectionTrait, DatabaseConnection};
pub use sea_orm_migration::prelude::*;
use xxhash_rust::xxh3::xxh3_64;

pub mod configs;
pub mod jobs;
mod version;

pub use version::{MigrationVersion, ParseVersionError};

/// A single forward-only schema change for one logical database.
///
/// The runner applies `up` inside a transaction together with the history row,
/// so an implementation must not commit on its own.
#[async_trait::async_trait]
pub trait VersionedMigration: Send + Sync {
    /// Raw version token, parsed by the runner (see [`MigrationVersion`]).
    fn version(&self) -> &str;

    fn description(&self) -> &str;

    /// Checksum of the migration content, recorded in the history table.
    fn checksum(&self) -> Option<i64> {
        None
    }

    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr>;
}

/// Ordered migration set for one logical database.
pub type MigrationSet = Vec<Box<dyn VersionedMigration>>;

/// Migration expressed as raw SQL statements, executed in order.
#[derive(Debug, Clone)]
pub struct SqlMigration {
    version: String,
    description: String,
    statements: Vec<String>,
}

impl SqlMigration {
    pub fn new<I, S>(version: impl Into<String>, description: impl Into<String>, statements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            version: version.into(),
            description: description.into(),
            statements: statements.into_iter().map(Into::into).collect(),
        }
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }
}

#[async_trait::async_trait]
impl VersionedMigration for SqlMigration {
    fn version(&self) -> &str {
        &self.version
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn checksum(&self) -> Option<i64> {
        Some(xxh3_64(self.statements.join("\n").as_bytes()) as i64)
    }

    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();
        for statement in &self.statements {
            tracing::trace!(version = %self.version, "executing migration statement");
            conn.execute_unprepared(statement).await?;
        }
        Ok(())
    }
}
