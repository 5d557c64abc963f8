use migration::MigrationVersion;
use sea_orm::DatabaseConnection;
use tracing::{error, info};

use crate::error::DbInfraError;
use crate::infra::db::diagnostics::bootstrap_counters;
use crate::infra::db::history::MigrationHistory;

/// Passes iff `current >= minimum`, returning the verified version.
/// No recorded version never passes.
pub fn check_version<'a>(
    current: Option<&'a MigrationVersion>,
    minimum: &MigrationVersion,
) -> Result<&'a MigrationVersion, DbInfraError> {
    match current {
        Some(current) if current >= minimum => Ok(current),
        _ => Err(DbInfraError::IncompatibleSchemaVersion {
            current: current.cloned(),
            required: minimum.clone(),
        }),
    }
}

/// Read the applied version from the history table and hold it against `minimum`.
///
/// The version is read back from the database rather than taken from the
/// runner, so a schema moved by another deployment is caught here as well.
pub async fn enforce_minimum_version(
    conn: &DatabaseConnection,
    history: &MigrationHistory,
    minimum: &MigrationVersion,
) -> Result<MigrationVersion, DbInfraError> {
    let current = history.latest_version(conn).await?;

    match check_version(current.as_ref(), minimum) {
        Ok(verified) => {
            info!(
                "gate=pass table={} current={} required={}",
                history.table(),
                verified,
                minimum
            );
            Ok(verified.clone())
        }
        Err(e) => {
            bootstrap_counters::gate_rejected();
            error!("gate=reject table={} err={}", history.table(), e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use proptest::prelude::*;

    use super::*;
    use crate::config::db::LogicalDatabaseName;
    use crate::infra::db::history::{NewRecord, RecordKind};

    fn v(raw: &str) -> MigrationVersion {
        MigrationVersion::parse(raw).unwrap()
    }

    #[test]
    fn equal_versions_pass() {
        assert!(check_version(Some(&v("5")), &v("5")).is_ok());
        assert!(check_version(Some(&v("0.40.23.002")), &v("0_40_23_002")).is_ok());
        assert!(check_version(Some(&v("1.0")), &v("1")).is_ok());
    }

    #[test]
    fn older_schema_fails_with_both_versions() {
        match check_version(Some(&v("4")), &v("5")) {
            Err(DbInfraError::IncompatibleSchemaVersion { current, required }) => {
                assert_eq!(current, Some(v("4")));
                assert_eq!(required, v("5"));
            }
            other => panic!("expected incompatible version, got {other:?}"),
        }
    }

    #[test]
    fn missing_version_fails_closed() {
        assert!(matches!(
            check_version(None, &v("0")),
            Err(DbInfraError::IncompatibleSchemaVersion { current: None, .. })
        ));
    }

    proptest! {
        #[test]
        fn fails_iff_current_below_minimum(current in 0u64..50, minimum in 0u64..50) {
            let (current_v, minimum_v) = (v(&current.to_string()), v(&minimum.to_string()));
            let rejected = check_version(Some(&current_v), &minimum_v).is_err();
            prop_assert_eq!(rejected, current < minimum);
        }
    }

    #[tokio::test]
    async fn reads_version_from_the_database() {
        let conn = worker_test_support::db::memory_connection().await;
        let history = MigrationHistory::new(LogicalDatabaseName::Configs);

        let err = enforce_minimum_version(&conn, &history, &v("1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbInfraError::IncompatibleSchemaVersion { current: None, .. }
        ));

        history.ensure_table(&conn).await.unwrap();
        let recorded = v("4");
        history
            .insert(
                &conn,
                NewRecord {
                    version: &recorded,
                    description: "applied elsewhere",
                    recorded_as: "4",
                    kind: RecordKind::Migration,
                    checksum: None,
                    installed_by: "another-deployment",
                    execution_time: Duration::ZERO,
                },
            )
            .await
            .unwrap();

        assert_eq!(
            enforce_minimum_version(&conn, &history, &v("4")).await.unwrap(),
            v("4")
        );
        assert!(enforce_minimum_version(&conn, &history, &v("5"))
            .await
            .is_err());
    }
}
