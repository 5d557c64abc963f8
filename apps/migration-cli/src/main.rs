use clap::{Parser, Subcommand, ValueEnum};
use db_infra::infra::db::{enforce_minimum_version, ApplyMigrations, MigrationRunner};
use db_infra::{DatabaseSettings, DbInfraError, LogicalDatabase, LogicalDatabaseName};
use migration::MigrationSet;

#[derive(Clone, Copy, ValueEnum)]
enum Db {
    Configs,
    Jobs,
}

impl Db {
    fn name(self) -> LogicalDatabaseName {
        match self {
            Db::Configs => LogicalDatabaseName::Configs,
            Db::Jobs => LogicalDatabaseName::Jobs,
        }
    }

    fn migrations(self) -> MigrationSet {
        match self {
            Db::Configs => migration::configs::migrations(),
            Db::Jobs => migration::jobs::migrations(),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Show every known migration next to the recorded history
    Info,
    /// Baseline if needed, then apply pending migrations
    Migrate,
    /// Fail unless the schema is at or above the configured minimum
    Check,
}

#[derive(Parser)]
#[command(name = "migration-cli")]
#[command(about = "Schema migration tool for the configs and jobs databases")]
struct Args {
    /// Logical database to operate on
    #[arg(short, long, value_enum)]
    database: Db,

    #[command(subcommand)]
    command: Command,
}

async fn run(args: Args) -> Result<(), DbInfraError> {
    let settings = DatabaseSettings::from_env(args.database.name())?;
    let database = LogicalDatabase::connect(settings.name, &settings.connection).await?;
    let runner = MigrationRunner::from_settings(&settings);
    let migrations = args.database.migrations();

    match args.command {
        Command::Info => {
            println!("{}", database.migration_table());
            for entry in runner.info(database.connection(), &migrations).await? {
                let installed_on = entry
                    .record
                    .as_ref()
                    .map(|r| r.installed_on.to_string())
                    .unwrap_or_default();
                println!(
                    "{:<16} {:<9} {:<48} {}",
                    entry.version.to_string(),
                    entry.state.as_str(),
                    entry.description,
                    installed_on
                );
            }
        }
        Command::Migrate => {
            let outcome = runner
                .apply_pending_migrations(database.connection(), &migrations)
                .await?;
            if let Some(baseline) = &outcome.baselined {
                println!("Baselined at {baseline}");
            }
            if outcome.applied.is_empty() {
                println!("Schema is up to date");
            }
            for version in &outcome.applied {
                println!("Applied {version}");
            }
        }
        Command::Check => {
            let current = enforce_minimum_version(
                database.connection(),
                runner.history(),
                &settings.minimum_migration_version,
            )
            .await?;
            println!(
                "Schema version {current} satisfies minimum {}",
                settings.minimum_migration_version
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .with_env_filter("db_infra=info,sqlx=warn")
        .init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
}
