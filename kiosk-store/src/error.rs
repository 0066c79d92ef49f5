//! Storage layer errors

use thiserror::Error;

/// Errors that can occur in the storage layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        /// Type of entity
        entity_type: String,
        /// Entity ID
        id: String,
    },

    /// Uniqueness violation (name or position within a collection)
    #[error("Duplicate {entity_type}: {id}")]
    Duplicate {
        /// Which unique field collided
        entity_type: String,
        /// Colliding value
        id: String,
    },

    /// Collection lock could not be acquired in time
    #[error("Timed out waiting for lock on collection {0}")]
    LockTimeout(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Deserialization error (reading a row)
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Domain error passthrough
    #[error("Domain error: {0}")]
    Domain(#[from] kiosk_domain::DomainError),
}

impl StoreError {
    /// Create a not found error
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Create a duplicate error
    pub fn duplicate(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Duplicate {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}

/// Field named by a unique constraint on `positioned_entities`.
///
/// Matched on the `<table>_<columns>_key` suffix: the table name itself
/// contains "position".
#[cfg_attr(not(feature = "postgres"), allow(dead_code))]
fn duplicate_field(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some(c) if c.ends_with("_position_key") => "position",
        Some(c) if c.ends_with("_name_key") => "name",
        _ => "unknown",
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::not_found("row", "unknown"),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                // unique_violation
                Some("23505") => StoreError::duplicate(
                    duplicate_field(db_err.constraint()),
                    db_err.message().to_string(),
                ),
                // lock_not_available
                Some("55P03") => StoreError::LockTimeout(db_err.message().to_string()),
                _ => StoreError::Database(db_err.to_string()),
            },
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Connection(err.to_string())
            },
            _ => StoreError::Database(err.to_string()),
        }
    }
}
