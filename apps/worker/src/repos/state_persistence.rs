use db_infra::{DbInfraError, LogicalDatabaseName, ReadyDatabase};
use sea_orm::DatabaseConnection;

/// Per-connection sync state.
#[derive(Debug, Clone)]
pub struct StatePersistence {
    conn: DatabaseConnection,
}

impl StatePersistence {
    pub const DATABASE: LogicalDatabaseName = LogicalDatabaseName::Configs;

    pub fn new(ready: &ReadyDatabase) -> Result<Self, DbInfraError> {
        Ok(Self {
            conn: super::bind(ready, Self::DATABASE)?,
        })
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }
}
