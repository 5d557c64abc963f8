#![allow(dead_code)]

use std::time::Duration;

use db_infra::{ConnectionDescriptor, DatabaseSettings, LogicalDatabaseName};
use migration::{MigrationSet, MigrationVersion};
use worker::{DatabaseConfigs, MigrationSources};
use worker_test_support::fixtures::numbered_migrations;

// Logging is auto-installed for every test binary that includes this module
#[ctor::ctor]
fn init_logging() {
    worker_test_support::logging::init();
}

pub fn v(raw: &str) -> MigrationVersion {
    MigrationVersion::parse(raw).expect("valid version literal")
}

/// Settings with baseline `0` and a short availability budget.
pub fn settings(name: LogicalDatabaseName, url: &str, minimum: &str) -> DatabaseSettings {
    DatabaseSettings::new(name, ConnectionDescriptor::new(url), v(minimum))
        .with_baseline_version(v("0"))
        .with_initialization_timeout(Duration::from_secs(5))
}

pub fn databases(configs_url: &str, jobs_url: &str, minimum: &str) -> DatabaseConfigs {
    DatabaseConfigs {
        configs: settings(LogicalDatabaseName::Configs, configs_url, minimum),
        jobs: settings(LogicalDatabaseName::Jobs, jobs_url, minimum),
    }
}

pub fn numbered_sources(count: u32) -> MigrationSources {
    MigrationSources {
        configs: numbered_migrations(count),
        jobs: numbered_migrations(count),
    }
}

pub fn sources(configs: MigrationSet, jobs: MigrationSet) -> MigrationSources {
    MigrationSources { configs, jobs }
}
