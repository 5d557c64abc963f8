use actix_web::{web, HttpResponse};
use db_infra::infra::db::LivenessCheck;
use db_infra::ReadyDatabase;
use serde::Serialize;
use time::OffsetDateTime;

use crate::error::AppError;
use crate::state::app_state::AppState;

#[derive(Debug, Serialize)]
struct DatabaseHealth {
    name: &'static str,
    migration_table: String,
    schema_version: String,
    /// Result of the startup availability probe.
    available: bool,
    startup_elapsed_ms: u128,
    startup_attempts: u32,
    /// Result of a liveness query made for this request.
    db: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    db_error: Option<String>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    mode: &'static str,
    app_version: &'static str,
    databases: Vec<DatabaseHealth>,
    time: String,
}

async fn database_health(ready: &ReadyDatabase) -> DatabaseHealth {
    let availability = ready.availability();
    let (db, db_error) = match ready.connection().check().await {
        Ok(()) => ("ok", None),
        Err(e) => ("error", Some(format!("DB query failed: {e}"))),
    };

    DatabaseHealth {
        name: ready.name().as_str(),
        migration_table: ready.database().migration_table(),
        schema_version: ready.schema_version().to_string(),
        available: availability.is_available(),
        startup_elapsed_ms: availability.elapsed.as_millis(),
        startup_attempts: availability.attempts,
        db,
        db_error,
    }
}

async fn health(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let time = OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string());

    let mut databases = Vec::new();
    if let Some(ready) = app_state.persistence().databases() {
        for db in ready.iter() {
            databases.push(database_health(db).await);
        }
    }

    let healthy = databases.iter().all(|d| d.db_error.is_none());
    let body = HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        mode: app_state.mode.as_str(),
        app_version: env!("CARGO_PKG_VERSION"),
        databases,
        time,
    };

    if healthy {
        Ok(HttpResponse::Ok().json(body))
    } else {
        Ok(HttpResponse::ServiceUnavailable().json(body))
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health));
}
