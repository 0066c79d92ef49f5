//! Manager error types.

use kiosk_domain::{Collection, DomainError, EntityId};
use kiosk_engine::PolicyError;
use kiosk_store::StoreError;
use thiserror::Error;

/// Manager-level errors.
///
/// Every error is returned after the enclosing transaction has rolled back.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// Referenced entity is not a member of the collection
    #[error("Entity {id} not found in {collection}")]
    NotFound { collection: Collection, id: String },

    /// Uniqueness violation on the primary write
    #[error("Conflict: duplicate {field} {value}")]
    Conflict { field: String, value: String },

    /// Policy refused the request (bounds, reorder permutation)
    #[error("Validation error: {0}")]
    Validation(#[from] PolicyError),

    /// Caller input rejected before reaching the policy
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] DomainError),

    /// Store error
    #[error("Store error: {0}")]
    Store(StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse error class for callers mapping to transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    Internal,
}

impl ManagerError {
    pub(crate) fn not_found(collection: Collection, id: EntityId) -> Self {
        Self::NotFound {
            collection,
            id: id.to_string(),
        }
    }

    /// Map a store error raised while working on `collection`
    pub(crate) fn from_store(collection: Collection, err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id, .. } => Self::NotFound { collection, id },
            StoreError::Duplicate { entity_type, id } => Self::Conflict {
                field: entity_type,
                value: id,
            },
            StoreError::Domain(e) => Self::InvalidInput(e),
            other => Self::Store(other),
        }
    }

    /// Coarse class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ManagerError::NotFound { .. } => ErrorKind::NotFound,
            ManagerError::Conflict { .. } => ErrorKind::Conflict,
            ManagerError::Validation(_) | ManagerError::InvalidInput(_) => ErrorKind::Validation,
            ManagerError::Store(_) | ManagerError::Config(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;
