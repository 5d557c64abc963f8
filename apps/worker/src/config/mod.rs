//! Worker configuration resolved from name→value pairs.

use std::env;
use std::fmt;
use std::str::FromStr;

use db_infra::{DatabaseSettings, LogicalDatabaseName};

use crate::error::AppError;

const DEFAULT_HTTP_HOST: &str = "0.0.0.0";
const DEFAULT_HTTP_PORT: u16 = 9000;

/// Deployment role. Only the control plane owns the databases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerMode {
    ControlPlane,
    DataPlane,
}

impl WorkerMode {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkerMode::ControlPlane => "CONTROL_PLANE",
            WorkerMode::DataPlane => "DATA_PLANE",
        }
    }
}

impl fmt::Display for WorkerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkerMode {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CONTROL_PLANE" => Ok(WorkerMode::ControlPlane),
            "DATA_PLANE" => Ok(WorkerMode::DataPlane),
            other => Err(AppError::config(format!(
                "WORKER_PLANE must be CONTROL_PLANE or DATA_PLANE, got '{other}'"
            ))),
        }
    }
}

/// Settings for both logical databases.
#[derive(Debug, Clone)]
pub struct DatabaseConfigs {
    pub configs: DatabaseSettings,
    pub jobs: DatabaseSettings,
}

impl DatabaseConfigs {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            configs: DatabaseSettings::from_lookup(LogicalDatabaseName::Configs, &lookup)?,
            jobs: DatabaseSettings::from_lookup(LogicalDatabaseName::Jobs, &lookup)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub mode: WorkerMode,
    pub http: HttpSettings,
    /// Present only in control-plane mode.
    pub databases: Option<DatabaseConfigs>,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Data-plane mode reads no database keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mode = match get("WORKER_PLANE") {
            Some(raw) => raw.parse()?,
            None => WorkerMode::ControlPlane,
        };

        let host = get("WORKER_HTTP_HOST").unwrap_or_else(|| DEFAULT_HTTP_HOST.to_string());
        let port = match get("WORKER_HTTP_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                AppError::config(format!("WORKER_HTTP_PORT must be a valid port number, got '{raw}'"))
            })?,
            None => DEFAULT_HTTP_PORT,
        };

        let databases = match mode {
            WorkerMode::ControlPlane => Some(DatabaseConfigs::from_lookup(&lookup)?),
            WorkerMode::DataPlane => None,
        };

        Ok(Self {
            mode,
            http: HttpSettings { host, port },
            databases,
        })
    }
}
