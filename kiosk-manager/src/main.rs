//! kioskctl: operator CLI for kiosk catalog positions
//!
//! # Usage
//!
//! ```bash
//! kioskctl db migrate
//! kioskctl db status
//! kioskctl db init
//! kioskctl list ads
//! kioskctl verify floor_plans
//! kioskctl compact ads
//! ```
//!
//! # Environment Variables
//!
//! - `KIOSK_ENV`: Environment (test, development, production)
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `KIOSK_DB_MAX_CONNECTIONS`: Pool size (default: 5)
//! - `KIOSK_LOCK_TIMEOUT_MS`: Collection lock wait limit (default: 5000)

mod db;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use kiosk_domain::Collection;
use kiosk_manager::{CollectionManager, Config};
use kiosk_store::PgCollectionStore;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const USAGE: &str = "Usage: kioskctl <db <migrate|status|init> | list|verify|compact <collection>>";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("kioskctl=info".parse()?)
                .add_directive("kiosk_manager=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).ok_or_else(|| anyhow!(USAGE))?;

    // Load configuration
    let config = Config::from_env()?;
    let url = config
        .database
        .url
        .as_deref()
        .ok_or_else(|| anyhow!("DATABASE_URL environment variable is required"))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        max_connections = config.database.max_connections,
        lock_timeout_ms = config.database.lock_timeout.as_millis() as u64,
        "kioskctl"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(url)
        .await?;

    if command == "db" {
        return db::run_db_command(&pool, &args).await;
    }

    let collection: Collection = args
        .get(2)
        .ok_or_else(|| anyhow!(USAGE))?
        .parse()?;
    let store = PgCollectionStore::new(pool).with_lock_timeout(config.database.lock_timeout);
    let manager = CollectionManager::new(Arc::new(store));

    match command.as_str() {
        "list" => {
            for entity in manager.list(collection).await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    entity.position,
                    entity.id,
                    entity.name,
                    entity.asset.as_deref().unwrap_or("-")
                );
            }
        },
        "verify" => {
            let report = manager.verify(collection).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.is_dense() {
                return Err(anyhow!("{} positions are not dense", collection));
            }
        },
        "compact" => {
            let report = manager.compact(collection).await?;
            if report.is_dense() {
                info!(%collection, size = report.size, "Nothing to compact");
            } else {
                warn!(
                    %collection,
                    missing = ?report.missing,
                    duplicated = ?report.duplicated,
                    out_of_range = ?report.out_of_range,
                    "Positions renumbered"
                );
            }
        },
        other => {
            return Err(anyhow!("Unknown command: {}. {}", other, USAGE));
        },
    }

    Ok(())
}
