use db_infra::{DbInfraError, LogicalDatabaseName, ReadyDatabase};
use sea_orm::DatabaseConnection;

#[derive(Debug, Clone)]
pub struct StreamResetPersistence {
    conn: DatabaseConnection,
}

impl StreamResetPersistence {
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
