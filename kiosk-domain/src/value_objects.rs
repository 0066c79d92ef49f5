//! Value Objects for the Kiosk Catalog Domain
//!
//! Immutable, validated domain primitives.
//! All value objects enforce invariants at construction time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Domain errors for value object validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Position must be a non-negative integer that fits the position column
    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    /// Collection key does not name a known catalog
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    /// Entity name must be non-empty
    #[error("Invalid name: {0}")]
    InvalidName(String),
}

// =============================================================================
// Position
// =============================================================================

/// Zero-based rank of an entity within its collection.
///
/// # Invariants
/// - Must be >= 0
/// - Must fit a PostgreSQL `INTEGER` column (<= i32::MAX)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
pub struct Position(u32);

impl Position {
    /// The origin every collection's dense sequence starts at.
    pub const ORIGIN: Position = Position(0);

    /// Largest representable position.
    pub const MAX: Position = Position(i32::MAX as u32);

    /// Create a new Position with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPosition` if value exceeds `Position::MAX`
    pub fn new(value: u32) -> Result<Self, DomainError> {
        if value > Self::MAX.0 {
            return Err(DomainError::InvalidPosition(format!(
                "{} exceeds maximum {}",
                value,
                Self::MAX.0
            )));
        }
        Ok(Self(value))
    }

    /// Get the underlying value
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Value as a zero-based index
    pub fn as_index(&self) -> usize {
        self.0 as usize
    }

    /// Value as stored in the database
    pub fn as_i32(&self) -> i32 {
        // Bounded by Position::MAX at construction
        self.0 as i32
    }

    /// Position directly after this one, `None` at [`Position::MAX`]
    pub fn next(&self) -> Option<Position> {
        (self.0 < Self::MAX.0).then(|| Position(self.0 + 1))
    }

    /// Position directly before this one, `None` at the origin
    pub fn prev(&self) -> Option<Position> {
        self.0.checked_sub(1).map(Position)
    }

    /// Position for a collection size or index
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPosition` if the index cannot be stored
    pub fn from_index(index: usize) -> Result<Self, DomainError> {
        let value = u32::try_from(index)
            .map_err(|_| DomainError::InvalidPosition(format!("index {} out of range", index)))?;
        Self::new(value)
    }
}

impl TryFrom<i64> for Position {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value < 0 {
            return Err(DomainError::InvalidPosition(format!(
                "{} is negative, positions start at 0",
                value
            )));
        }
        let value = u32::try_from(value)
            .map_err(|_| DomainError::InvalidPosition(format!("{} out of range", value)))?;
        Self::new(value)
    }
}

impl TryFrom<i32> for Position {
    type Error = DomainError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(value))
    }
}

impl From<Position> for i64 {
    fn from(position: Position) -> Self {
        i64::from(position.0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Collection
// =============================================================================

/// Independent ordering domain.
///
/// Each collection owns its own dense position sequence starting at
/// `Position::ORIGIN`. There is no ordering across collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Advertisements shown on kiosks
    Ads,
    /// Floor plans of places
    FloorPlans,
}

impl Collection {
    /// Every collection, in storage key order
    pub const ALL: [Collection; 2] = [Collection::Ads, Collection::FloorPlans];

    /// Stable storage key
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Ads => "ads",
            Collection::FloorPlans => "floor_plans",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ads" | "ad" => Ok(Collection::Ads),
            "floor_plans" | "floor-plans" | "floorplans" => Ok(Collection::FloorPlans),
            other => Err(DomainError::UnknownCollection(other.to_string())),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
