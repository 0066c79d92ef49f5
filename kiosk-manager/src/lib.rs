//! Kiosk Catalog Manager Library
//!
//! Keeps every collection's `position` values dense (`0..N`, no gaps, no
//! duplicates) across create, move, update, delete and reorder.
//!
//! # Architecture
//!
//! ```text
//! caller → CollectionManager → kiosk-engine (plan)
//!                ↓
//!          CollectionStore::begin → CollectionTx (collection lock held)
//!                ↓
//!          commit → AssetCleanup (best effort)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kiosk_domain::{Collection, EntityFields, Position};
//! use kiosk_manager::CollectionManager;
//! use kiosk_store::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let manager = CollectionManager::new(Arc::new(MemoryStore::new()));
//!
//!     let a = manager.create(Collection::Ads, EntityFields::named("A")?, None).await?;
//!     let b = manager
//!         .create(Collection::Ads, EntityFields::named("B")?, Some(Position::ORIGIN))
//!         .await?;
//!
//!     let ads = manager.list(Collection::Ads).await?;
//!     assert_eq!(ads[0].id, b.id);
//!     assert_eq!(ads[1].id, a.id);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod cleanup;
pub mod config;
pub mod error;
pub mod manager;

// Re-exports for convenience
pub use cleanup::{AssetCleanup, NoopCleanup, RecordingCleanup};
pub use config::{Config, DatabaseConfig, Environment};
pub use error::{ErrorKind, ManagerError, ManagerResult};
pub use manager::CollectionManager;
