//! Database migration runner for Leavedesk.
//!
//! Usage:
//!   migrator up      - Run all pending migrations
//!   migrator down    - Rollback last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations
//!
//! The database URL and logging come from `AppConfig` (`LEAVEDESK__DATABASE__URL`).

use anyhow::{Context, bail};
use leavedesk_db::migration::Migrator;
use leavedesk_shared::AppConfig;
use leavedesk_shared::telemetry::init_tracing;
use sea_orm_migration::prelude::*;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Up,
    Down,
    Status,
    Fresh,
}

impl Command {
    fn parse(arg: Option<&str>) -> anyhow::Result<Self> {
        match arg.unwrap_or("up") {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "status" => Ok(Self::Status),
            "fresh" => Ok(Self::Fresh),
            other => bail!("unknown command `{other}`; expected up, down, status or fresh"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let command = Command::parse(std::env::args().nth(1).as_deref())?;
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    let db = leavedesk_db::connect_with(&config.database)
        .await
        .context("failed to connect to database")?;

    info!(?command, "running migrations");
    match command {
        Command::Up => Migrator::up(&db, None).await?,
        Command::Down => Migrator::down(&db, Some(1)).await?,
        Command::Status => Migrator::status(&db).await?,
        Command::Fresh => Migrator::fresh(&db).await?,
    }
    info!(?command, "migrations finished");
    Ok(())
}
