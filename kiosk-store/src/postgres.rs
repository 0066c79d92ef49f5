//! PostgreSQL position store.
//!
//! This module provides:
//! - `PgCollectionStore` implementing `CollectionStore` over a `PgPool`
//! - `PgCollectionTx`, a `sqlx::Transaction` holding the collection lock
//!
//! The collection lock is a `SELECT ... FOR UPDATE` on the collection's row
//! in `collection_locks`, taken before any size or position is read.
//! `UNIQUE (collection, position)` is deferred to commit so range shifts may
//! pass through transient duplicates.
//!
//! This module uses dynamic queries (sqlx::query) instead of compile-time
//! checked macros (sqlx::query!) to allow compilation without DATABASE_URL.

use crate::error::StoreError;
use crate::repository::{CollectionStore, CollectionTx};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kiosk_domain::{Collection, Entity, EntityId, Position};
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

const SELECT_ENTITY: &str = r#"
    SELECT id, collection, position, name, asset, attributes, created_at, updated_at
    FROM positioned_entities
"#;

/// PostgreSQL adapter for the positioned_entities table.
#[derive(Clone)]
pub struct PgCollectionStore {
    /// PostgreSQL connection pool
    pool: PgPool,
    /// Upper bound on waiting for a collection lock
    lock_timeout: Option<Duration>,
}

impl PgCollectionStore {
    /// Create a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            lock_timeout: None,
        }
    }

    /// Fail `begin` with `StoreError::LockTimeout` after waiting this long.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    /// Get a reference to the underlying pool (for testing).
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Helper function to parse a row from positioned_entities.
fn parse_entity_row(row: &sqlx::postgres::PgRow) -> Result<Entity, StoreError> {
    let collection: String = row.try_get("collection")?;
    let position: i32 = row.try_get("position")?;
    let attributes: sqlx::types::Json<serde_json::Value> = row.try_get("attributes")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    Ok(Entity {
        id: row.try_get("id")?,
        collection: collection.parse().map_err(|e| {
            StoreError::Deserialization(format!("Invalid collection {}: {}", collection, e))
        })?,
        position: Position::try_from(position).map_err(|e| {
            StoreError::Deserialization(format!("Invalid position {}: {}", position, e))
        })?,
        name: row.try_get("name")?,
        asset: row.try_get("asset")?,
        attributes: attributes.0,
        created_at,
        updated_at,
    })
}

// =============================================================================
// Transaction
// =============================================================================

/// Transaction holding one collection's lock until commit or drop.
///
/// `sqlx::Transaction` rolls back when dropped without commit.
pub struct PgCollectionTx {
    collection: Collection,
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CollectionTx for PgCollectionTx {
    fn collection(&self) -> Collection {
        self.collection
    }

    async fn count(&mut self) -> Result<usize, StoreError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM positioned_entities WHERE collection = $1")
                .bind(self.collection.as_str())
                .fetch_one(&mut *self.tx)
                .await?;

        usize::try_from(count)
            .map_err(|_| StoreError::Deserialization(format!("Invalid count: {}", count)))
    }

    async fn find_by_id(&mut self, id: EntityId) -> Result<Option<Entity>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_ENTITY} WHERE collection = $1 AND id = $2"))
            .bind(self.collection.as_str())
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.as_ref().map(parse_entity_row).transpose()
    }

    async fn members(&mut self) -> Result<Vec<Entity>, StoreError> {
        let rows = sqlx::query(&format!(
            "{SELECT_ENTITY} WHERE collection = $1 ORDER BY position ASC, created_at ASC, id ASC"
        ))
        .bind(self.collection.as_str())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter().map(parse_entity_row).collect()
    }

    async fn shift_positions(
        &mut self,
        from: Position,
        to: Option<Position>,
        delta: i32,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE positioned_entities
            SET position = position + $2, updated_at = NOW()
            WHERE collection = $1
              AND position >= $3
              AND ($4::INTEGER IS NULL OR position <= $4)
            "#,
        )
        .bind(self.collection.as_str())
        .bind(delta)
        .bind(from.as_i32())
        .bind(to.map(|p| p.as_i32()))
        .execute(&mut *self.tx)
        .await?;

        debug!(
            collection = %self.collection,
            from = %from,
            to = ?to.map(|p| p.value()),
            delta,
            rows = result.rows_affected(),
            "Positions shifted"
        );
        Ok(result.rows_affected())
    }

    async fn insert(&mut self, entity: &Entity) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO positioned_entities (
                id, collection, position, name, asset, attributes, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entity.id)
        .bind(self.collection.as_str())
        .bind(entity.position.as_i32())
        .bind(&entity.name)
        .bind(&entity.asset)
        .bind(sqlx::types::Json(&entity.attributes))
        .bind(entity.created_at)
        .bind(entity.updated_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn update(&mut self, entity: &Entity) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE positioned_entities
            SET position = $3, name = $4, asset = $5, attributes = $6, updated_at = $7
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(self.collection.as_str())
        .bind(entity.id)
        .bind(entity.position.as_i32())
        .bind(&entity.name)
        .bind(&entity.asset)
        .bind(sqlx::types::Json(&entity.attributes))
        .bind(entity.updated_at)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("entity", entity.id.to_string()));
        }
        Ok(())
    }

    async fn set_position(&mut self, id: EntityId, position: Position) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE positioned_entities
            SET position = $3, updated_at = NOW()
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(self.collection.as_str())
        .bind(id)
        .bind(position.as_i32())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("entity", id.to_string()));
        }
        Ok(())
    }

    async fn delete(&mut self, id: EntityId) -> Result<(), StoreError> {
        let result =
            sqlx::query("DELETE FROM positioned_entities WHERE collection = $1 AND id = $2")
                .bind(self.collection.as_str())
                .bind(id)
                .execute(&mut *self.tx)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("entity", id.to_string()));
        }
        Ok(())
    }

    async fn assign_positions(
        &mut self,
        assignments: &[(EntityId, Position)],
    ) -> Result<(), StoreError> {
        let ids: Vec<Uuid> = assignments.iter().map(|(id, _)| *id).collect();
        let positions: Vec<i32> = assignments.iter().map(|(_, p)| p.as_i32()).collect();

        let result = sqlx::query(
            r#"
            UPDATE positioned_entities AS e
            SET position = v.position, updated_at = NOW()
            FROM UNNEST($2::UUID[], $3::INTEGER[]) AS v(id, position)
            WHERE e.collection = $1 AND e.id = v.id
            "#,
        )
        .bind(self.collection.as_str())
        .bind(&ids)
        .bind(&positions)
        .execute(&mut *self.tx)
        .await?;

        let expected = assignments.len() as u64;
        if result.rows_affected() != expected {
            let missing = expected - result.rows_affected();
            return Err(StoreError::not_found(
                "entity",
                format!("{} of {} ids", missing, expected),
            ));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

// =============================================================================
// Store Implementation
// =============================================================================

#[async_trait]
impl CollectionStore for PgCollectionStore {
    async fn begin(&self, collection: Collection) -> Result<Box<dyn CollectionTx>, StoreError> {
        let mut tx = self.pool.begin().await?;

        if let Some(timeout) = self.lock_timeout {
            // SET does not take bind parameters
            sqlx::query(&format!("SET LOCAL lock_timeout = '{}ms'", timeout.as_millis()))
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            "INSERT INTO collection_locks (collection) VALUES ($1) \
             ON CONFLICT (collection) DO NOTHING",
        )
        .bind(collection.as_str())
        .execute(&mut *tx)
        .await?;

        sqlx::query("SELECT collection FROM collection_locks WHERE collection = $1 FOR UPDATE")
            .bind(collection.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| match StoreError::from(e) {
                StoreError::LockTimeout(_) => StoreError::LockTimeout(collection.to_string()),
                other => other,
            })?;

        debug!(%collection, "Collection lock acquired");
        Ok(Box::new(PgCollectionTx { collection, tx }))
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Entity>, StoreError> {
        let query = format!(
            "{SELECT_ENTITY} WHERE collection = $1 ORDER BY position ASC, created_at ASC, id ASC"
        );
        let rows = sqlx::query(&query)
            .bind(collection.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to list {}: {}", collection, e)))?;

        rows.iter().map(parse_entity_row).collect()
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: EntityId,
    ) -> Result<Option<Entity>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_ENTITY} WHERE collection = $1 AND id = $2"))
            .bind(collection.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(parse_entity_row).transpose()
    }
}
