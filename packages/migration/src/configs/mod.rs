//! Migrations for the configs database (`airbyte_configs_migrations`).

use crate::MigrationSet;

mod v0_30_22_001_create_actor_tables;
mod v0_35_15_001_create_state_table;
mod v0_40_3_001_create_stream_reset_table;

pub fn migrations() -> MigrationSet {
    vec![
        Box::new(v0_30_22_001_create_actor_tables::Migration),
        Box::new(v0_35_15_001_create_state_table::Migration),
        Box::new(v0_40_3_001_create_stream_reset_table::Migration),
    ]
}
