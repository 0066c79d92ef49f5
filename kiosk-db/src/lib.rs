//! Database lifecycle management for the kiosk catalog.
//!
//! Provides migration running, status checking, and collection seeding.

mod init;

pub use init::{init_collections, CollectionSummary};

use kiosk_domain::Collection;
use sqlx::{PgPool, Row};
use tracing::{info, warn};

/// Result type for DB operations.
pub type Result<T> = std::result::Result<T, anyhow::Error>;

/// Run all pending migrations.
///
/// Uses sqlx migrations from the workspace `migrations` directory.
/// Idempotent: safe to run multiple times.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    info!("Running database migrations...");

    sqlx::migrate!("../migrations").run(pool).await?;

    info!("Migrations completed successfully");
    Ok(())
}

/// Migration and collection state of the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbStatus {
    /// Highest successfully applied migration, `None` before `migrate`
    pub schema_version: Option<i64>,
    /// Migrations recorded as failed
    pub failed_migrations: Vec<i64>,
    /// Per-collection lock row and size, empty before `migrate`
    pub collections: Vec<CollectionStatus>,
}

/// Lock row presence and size of one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionStatus {
    /// Collection identity
    pub collection: Collection,
    /// Whether the row locked by every write transaction exists
    pub lock_row: bool,
    /// Number of members
    pub members: i64,
}

impl DbStatus {
    /// Collections whose lock row is missing (writes to them fail until
    /// `init_collections` runs).
    pub fn unseeded(&self) -> Vec<Collection> {
        self.collections
            .iter()
            .filter(|c| !c.lock_row)
            .map(|c| c.collection)
            .collect()
    }

    /// Schema applied, no failed migration, every collection lockable
    pub fn is_ready(&self) -> bool {
        self.schema_version.is_some()
            && self.failed_migrations.is_empty()
            && self.collections.len() == Collection::ALL.len()
            && self.unseeded().is_empty()
    }
}

/// Check connectivity, applied migrations and collection lock rows.
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    sqlx::query("SELECT 1").execute(pool).await?;
    info!("Database connectivity: OK");

    let migrations = sqlx::query("SELECT version, success FROM _sqlx_migrations ORDER BY version")
        .fetch_all(pool)
        .await;

    let migrations = match migrations {
        Ok(rows) => rows,
        // Table does not exist before the first migrate
        Err(e) if e.to_string().contains("_sqlx_migrations") => {
            warn!("Migration table not found (run `kioskctl db migrate` first)");
            return Ok(DbStatus {
                schema_version: None,
                failed_migrations: Vec::new(),
                collections: Vec::new(),
            });
        },
        Err(e) => return Err(e.into()),
    };

    let mut schema_version = None;
    let mut failed_migrations = Vec::new();
    for row in migrations {
        let version: i64 = row.try_get("version")?;
        let success: bool = row.try_get("success")?;
        if success {
            schema_version = Some(version);
        } else {
            failed_migrations.push(version);
        }
    }

    let mut collections = Vec::with_capacity(Collection::ALL.len());
    if schema_version.is_some() {
        for collection in Collection::ALL {
            let row = sqlx::query(
                r#"
                SELECT
                    EXISTS (SELECT 1 FROM collection_locks WHERE collection = $1) AS lock_row,
                    (SELECT COUNT(*) FROM positioned_entities WHERE collection = $1) AS members
                "#,
            )
            .bind(collection.as_str())
            .fetch_one(pool)
            .await?;

            collections.push(CollectionStatus {
                collection,
                lock_row: row.try_get("lock_row")?,
                members: row.try_get("members")?,
            });
        }
    }

    let status = DbStatus {
        schema_version,
        failed_migrations,
        collections,
    };

    info!(schema_version = ?status.schema_version, "Schema version");
    if !status.failed_migrations.is_empty() {
        warn!(failed = ?status.failed_migrations, "Failed migrations recorded");
    }
    for c in &status.collections {
        if c.lock_row {
            info!(collection = %c.collection, members = c.members, "Collection ready");
        } else {
            warn!(
                collection = %c.collection,
                "Collection lock row missing (run `kioskctl db init`)"
            );
        }
    }

    Ok(status)
}
