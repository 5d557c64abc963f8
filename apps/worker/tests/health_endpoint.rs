mod common;

use actix_web::{test, web, App};
use common::{databases, numbered_sources};
use tokio_util::sync::CancellationToken;
use worker::{bootstrap, routes, AppState, Persistence, WorkerMode};
use worker_test_support::db::TempSqlite;

#[actix_web::test]
async fn data_plane_reports_no_databases() -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::new(WorkerMode::DataPlane, Persistence::DataPlane);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["mode"], "DATA_PLANE");
    assert_eq!(body["databases"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[actix_web::test]
async fn control_plane_reports_both_databases() -> Result<(), Box<dyn std::error::Error>> {
    let configs = TempSqlite::new("configs");
    let jobs = TempSqlite::new("jobs");
    let persistence = bootstrap(
        WorkerMode::ControlPlane,
        Some(&databases(&configs.url(), &jobs.url(), "2")),
        &numbered_sources(2),
        &CancellationToken::new(),
    )
    .await?;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(AppState::new(
                WorkerMode::ControlPlane,
                persistence,
            )))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["mode"], "CONTROL_PLANE");

    let reported = body["databases"].as_array().cloned().unwrap_or_default();
    assert_eq!(reported.len(), 2);
    assert_eq!(reported[0]["name"], "configs");
    assert_eq!(reported[0]["migration_table"], "airbyte_configs_migrations");
    assert_eq!(reported[1]["name"], "jobs");
    assert_eq!(reported[1]["migration_table"], "airbyte_jobs_migrations");
    for db in &reported {
        assert_eq!(db["schema_version"], "2");
        assert_eq!(db["available"], true);
        assert_eq!(db["db"], "ok");
        assert!(db.get("db_error").is_none());
    }
    Ok(())
}
