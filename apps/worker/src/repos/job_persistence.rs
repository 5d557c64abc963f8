use db_infra::{DbInfraError, LogicalDatabaseName, ReadyDatabase};
use sea_orm::DatabaseConnection;

/// Jobs, attempts and their statistics.
#[derive(Debug, Clone)]
pub struct JobPersistence {
    conn: DatabaseConnection,
}

impl JobPersistence {
    pub const DATABASE: LogicalDatabaseName = LogicalDatabaseName::Jobs;

    pub fn new(ready: &ReadyDatabase) -> Result<Self, DbInfraError> {
        Ok(Self {
            conn: super::bind(ready, Self::DATABASE)?,
        })
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }
}
