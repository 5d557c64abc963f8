use std::path::{Path, PathBuf};

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tempfile::TempDir;

/// Single-connection in-memory SQLite database.
pub async fn memory_connection() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.min_connections(1).max_connections(1).sqlx_logging(false);
    Database::connect(opt)
        .await
        .expect("in-memory sqlite connection")
}

/// A SQLite database file that outlives individual connections, removed on drop.
pub struct TempSqlite {
    _dir: TempDir,
    path: PathBuf,
}

impl TempSqlite {
    pub fn new(name: &str) -> Self {
        let dir = tempfile::tempdir().expect("temp dir for sqlite database");
        let path = dir.path().join(format!("{name}.db"));
        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// URL that creates the file on first connect.
    pub fn url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.path.display())
    }

    pub async fn connect(&self) -> DatabaseConnection {
        let mut opt = ConnectOptions::new(self.url());
        opt.max_connections(1).sqlx_logging(false);
        Database::connect(opt).await.expect("file sqlite connection")
    }
}
