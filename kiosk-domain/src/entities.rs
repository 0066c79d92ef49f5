//! Domain Entities for the Kiosk Catalog
//!
//! A positioned entity is any catalog row (ad, floor plan) that carries a
//! dense `position` within its collection.

use crate::value_objects::{Collection, DomainError, Position};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a positioned entity
pub type EntityId = Uuid;

// =============================================================================
// Entity
// =============================================================================

/// A row of a collection, ordered by `position`.
///
/// `position` is only ever written by the ordered collection manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Immutable identifier assigned at creation
    pub id: EntityId,
    /// Collection this entity belongs to
    pub collection: Collection,
    /// Rank within the collection
    pub position: Position,
    /// Unique (per collection) display name
    pub name: String,
    /// Reference to an uploaded file owned by the upload service
    pub asset: Option<String>,
    /// Caller-owned fields, stored verbatim
    pub attributes: serde_json::Value,

    // Audit
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time (including position shifts)
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    /// Build a new entity from caller fields at the given position
    pub fn new(collection: Collection, fields: EntityFields, position: Position) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            collection,
            position,
            name: fields.name,
            asset: fields.asset,
            attributes: fields.attributes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply field changes, returning the asset that was replaced (if any)
    pub fn apply(&mut self, changes: &EntityChanges) -> Option<String> {
        if let Some(name) = &changes.name {
            self.name = name.clone();
        }
        if let Some(attributes) = &changes.attributes {
            self.attributes = attributes.clone();
        }
        let replaced = match &changes.asset {
            Some(asset) if self.asset.as_ref() != asset.as_ref() => {
                std::mem::replace(&mut self.asset, asset.clone())
            },
            _ => None,
        };
        self.updated_at = Utc::now();
        replaced
    }
}

// =============================================================================
// Entity Fields
// =============================================================================

/// Caller-supplied fields for a new entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityFields {
    /// Display name, unique within the collection
    pub name: String,
    /// Uploaded file reference
    #[serde(default)]
    pub asset: Option<String>,
    /// Opaque caller fields
    #[serde(default = "empty_attributes")]
    pub attributes: serde_json::Value,
}

impl EntityFields {
    /// Fields with only a name
    ///
    /// # Errors
    /// Returns `DomainError::InvalidName` if the name is blank
    pub fn named(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::InvalidName("name must not be blank".to_string()));
        }
        Ok(Self {
            name,
            asset: None,
            attributes: empty_attributes(),
        })
    }

    /// Attach an uploaded file reference
    pub fn with_asset(mut self, asset: impl Into<String>) -> Self {
        self.asset = Some(asset.into());
        self
    }

    /// Attach caller attributes
    pub fn with_attributes(mut self, attributes: serde_json::Value) -> Self {
        self.attributes = attributes;
        self
    }
}

fn empty_attributes() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

// =============================================================================
// Entity Changes
// =============================================================================

/// Partial update of an existing entity.
///
/// `asset: Some(None)` clears the asset, `asset: None` leaves it untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityChanges {
    /// New name
    pub name: Option<String>,
    /// New asset reference
    pub asset: Option<Option<String>>,
    /// Replacement attributes
    pub attributes: Option<serde_json::Value>,
    /// New position, moved within the same transaction
    pub position: Option<Position>,
}

impl EntityChanges {
    /// Whether any stored field (other than position) changes
    pub fn touches_fields(&self) -> bool {
        self.name.is_some() || self.asset.is_some() || self.attributes.is_some()
    }
}

// =============================================================================
// Tests
// =============================================================================
