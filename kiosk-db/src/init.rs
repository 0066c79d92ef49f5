//! Collection seeding for the kiosk catalog.
//!
//! Ensures every collection has its lock row and reports its size.

use kiosk_domain::Collection;
use sqlx::PgPool;
use tracing::info;

use super::Result;

/// Size of one collection after initialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSummary {
    /// Collection identity
    pub collection: Collection,
    /// Number of members
    pub members: i64,
}

/// Initialize the lock rows every collection transaction selects `FOR UPDATE`.
///
/// Uses INSERT ... ON CONFLICT DO NOTHING for idempotency.
pub async fn init_collections(pool: &PgPool) -> Result<Vec<CollectionSummary>> {
    let mut tx = pool.begin().await?;
    let mut summaries = Vec::with_capacity(Collection::ALL.len());

    for collection in Collection::ALL {
        let inserted = sqlx::query(
            "INSERT INTO collection_locks (collection) VALUES ($1) \
             ON CONFLICT (collection) DO NOTHING",
        )
        .bind(collection.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let members: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM positioned_entities WHERE collection = $1")
                .bind(collection.as_str())
                .fetch_one(&mut *tx)
                .await?;

        if inserted > 0 {
            info!(%collection, "Collection lock row created");
        }
        info!(%collection, members, "Collection ready");
        summaries.push(CollectionSummary { collection, members });
    }

    tx.commit().await?;

    info!("Collections initialized successfully");
    Ok(summaries)
}
