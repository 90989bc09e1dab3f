use std::path::Path;

use clap::Parser;
use engine::{Budget, Gateway, JsonFileGateway, MemoryGateway, SqliteGateway};
use migration::{Migrator, MigratorTrait};
use settings::StorageKind;

mod cli;
mod error;
mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = cli::Cli::parse();
    let settings = settings::Settings::new(&cli.overrides())?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "budgetly={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let debounce = settings.persistence.debounce();
    match settings.storage.kind {
        StorageKind::Memory => {
            tracing::info!("using in-memory storage, nothing will be kept");
            run(MemoryGateway::new(), debounce, cli.command).await?;
        }
        StorageKind::Json => {
            tracing::debug!(dir = %settings.storage.dir, "using json storage");
            run(JsonFileGateway::new(&settings.storage.dir), debounce, cli.command).await?;
        }
        StorageKind::Sqlite => {
            tracing::debug!(path = %settings.storage.path, "using sqlite storage");
            let db = parse_database(&settings.storage.path).await?;
            run(SqliteGateway::new(db), debounce, cli.command).await?;
        }
    }

    Ok(())
}

async fn run<G: Gateway>(
    gateway: G,
    debounce: std::time::Duration,
    command: cli::Command,
) -> error::Result<()> {
    let mut budget = Budget::builder().debounce(debounce).open(gateway).await?;
    let today = chrono::Local::now().date_naive();

    // Pending saves are flushed even when the command itself failed.
    let outcome = cli::execute(&mut budget, command, today);
    let flushed = budget.close().await;

    for line in outcome? {
        println!("{line}");
    }
    flushed?;
    Ok(())
}

async fn parse_database(path: &str) -> error::Result<sea_orm::DatabaseConnection> {
    let url = if path == ":memory:" {
        String::from("sqlite::memory:")
    } else {
        if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        format!("sqlite:{path}?mode=rwc")
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
