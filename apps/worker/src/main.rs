use actix_web::{web, App, HttpServer};
use tokio_util::sync::CancellationToken;
use worker::{bootstrap, routes, AppState, MigrationSources, WorkerConfig};

mod telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    let config = match WorkerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Invalid worker configuration: {e}");
            std::process::exit(1);
        }
    };

    // Ctrl-C during startup abandons any availability probe still waiting.
    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal.cancel();
        }
    });

    let persistence = match bootstrap(
        config.mode,
        config.databases.as_ref(),
        &MigrationSources::shipped(),
        &shutdown,
    )
    .await
    {
        Ok(persistence) => persistence,
        Err(e) => {
            eprintln!("❌ Worker bootstrap failed: {e}");
            std::process::exit(1);
        }
    };

    println!(
        "🚀 Worker ({}) serving health on http://{}:{}",
        config.mode, config.http.host, config.http.port
    );

    let data = web::Data::new(AppState::new(config.mode, persistence));

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((config.http.host.as_str(), config.http.port))?
    .run()
    .await
}
