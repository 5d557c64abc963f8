use db_infra::{DbInfraError, LogicalDatabaseName, ReadyDatabase};
use sea_orm::DatabaseConnection;

/// Configuration store: actor definitions, actors and connections.
#[derive(Debug, Clone)]
pub struct ConfigRepository {
    conn: DatabaseConnection,
}

impl ConfigRepository {
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
