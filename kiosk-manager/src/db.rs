//! Database CLI subcommands for kioskctl.
//!
//! Provides `db migrate`, `db status`, and `db init` commands.

use anyhow::{anyhow, Result};
use sqlx::PgPool;
use tracing::info;

use kiosk_db::{init_collections, migrate, status};

/// Run database CLI subcommands.
///
/// Supported commands:
/// - `kioskctl db migrate` - Run pending migrations
/// - `kioskctl db status` - Check migration status
/// - `kioskctl db init` - Register collection lock rows and report sizes
pub async fn run_db_command(pool: &PgPool, args: &[String]) -> Result<()> {
    let command = args
        .get(2)
        .ok_or_else(|| anyhow!("Usage: kioskctl db <migrate|status|init>"))?;

    match command.as_str() {
        "migrate" => {
            migrate(pool).await?;
        },
        "status" => {
            let report = status(pool).await?;
            if !report.is_ready() {
                return Err(anyhow!(
                    "Database not ready (schema version {:?}, unseeded collections {:?})",
                    report.schema_version,
                    report.unseeded()
                ));
            }
        },
        "init" => {
            for summary in init_collections(pool).await? {
                info!(
                    collection = %summary.collection,
                    members = summary.members,
                    "Collection ready"
                );
            }
        },
        other => {
            return Err(anyhow!("Unknown db command: {}. Use migrate, status, or init", other));
        },
    }

    Ok(())
}
