//! Policy errors

use kiosk_domain::{EntityId, Position};
use thiserror::Error;

/// Reasons the policy refuses to produce a plan.
///
/// Every variant is detected before any write happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// Requested position is outside the valid range for the operation
    #[error("Position {requested} out of range: expected 0..={max}")]
    PositionOutOfRange {
        /// Position the caller asked for
        requested: Position,
        /// Largest accepted position
        max: Position,
    },

    /// Move requested on an empty collection
    #[error("Collection is empty")]
    EmptyCollection,

    /// Current position of the target lies outside the collection
    #[error("Current position {current} is not within a collection of size {size}")]
    CorruptPosition {
        /// Position read from the store
        current: Position,
        /// Collection size read from the store
        size: usize,
    },

    /// Reorder list length differs from the collection size
    #[error("Reorder list has {given} ids, collection has {expected} members")]
    ReorderLengthMismatch {
        /// Number of ids supplied
        given: usize,
        /// Collection size
        expected: usize,
    },

    /// Reorder list names the same id twice
    #[error("Reorder list contains {0} more than once")]
    ReorderDuplicate(EntityId),

    /// Reorder list names an id that is not a member
    #[error("Reorder list contains {0} which is not a member of the collection")]
    ReorderUnknown(EntityId),

    /// Collection size exceeds the position column
    #[error("Collection too large: {0} members")]
    CollectionTooLarge(usize),
}
