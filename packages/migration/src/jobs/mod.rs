//! Migrations for the jobs database (`airbyte_jobs_migrations`).

use crate::MigrationSet;

mod v0_29_15_001_create_jobs_and_attempts;
mod v0_35_5_001_add_attempt_workflow_id;
mod v0_40_14_001_create_stream_stats;

pub fn migrations() -> MigrationSet {
    vec![
        Box::new(v0_29_15_001_create_jobs_and_attempts::Migration),
        Box::new(v0_35_5_001_add_attempt_workflow_id::Migration),
        Box::new(v0_40_14_001_create_stream_stats::Migration),
    ]
}
