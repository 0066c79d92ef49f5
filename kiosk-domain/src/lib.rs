//! Kiosk Catalog Domain Layer
//!
//! Pure domain types with zero I/O dependencies.
//! Contains the positioned entity, the collection identity and the
//! validated position value object.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules
pub mod entities;
pub mod value_objects;

// Re-export commonly used types
pub use entities::{Entity, EntityChanges, EntityFields, EntityId};
pub use value_objects::{Collection, DomainError, Position};
