use migration::{SqlMigration, VersionedMigration};

/// Migrations `1..=count`, each creating an empty table `step_<n>`.
pub fn numbered_migrations(count: u32) -> Vec<Box<dyn VersionedMigration>> {
    (1..=count)
        .map(|n| {
            Box::new(SqlMigration::new(
                n.to_string(),
                format!("create step_{n}"),
                [format!("CREATE TABLE step_{n} (id INTEGER PRIMARY KEY)")],
            )) as Box<dyn VersionedMigration>
        })
        .collect()
}

/// Creates `table`, then fails on its second statement.
pub fn failing_migration(version: &str, table: &str) -> SqlMigration {
    SqlMigration::new(
        version,
        format!("create {table} and fail"),
        [
            format!("CREATE TABLE {table} (id INTEGER PRIMARY KEY)"),
            "INSERT INTO table_that_does_not_exist (id) VALUES (1)".to_string(),
        ],
    )
}
