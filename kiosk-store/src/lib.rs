//! Kiosk Catalog Storage Layer
//!
//! Position store accessor for ordered collections.
//!
//! # Architecture
//!
//! - **Repository traits**: Define the storage interface (ports)
//! - **In-memory store**: Fast implementation for testing
//! - **PostgreSQL store**: Production implementation (feature `postgres`)
//!
//! # Usage
//!
//! ```rust
//! use kiosk_store::{CollectionStore, CollectionTx, MemoryStore};
//! use kiosk_domain::{Collection, Entity, EntityFields, Position};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = MemoryStore::new();
//!
//!     // Insert inside a collection transaction
//!     let mut tx = store.begin(Collection::Ads).await.unwrap();
//!     let fields = EntityFields::named("Spring sale").unwrap();
//!     tx.insert(&Entity::new(Collection::Ads, fields, Position::ORIGIN)).await.unwrap();
//!     tx.commit().await.unwrap();
//!
//!     let ads = store.list(Collection::Ads).await.unwrap();
//!     println!("Ads: {}", ads.len());
//! }
//! ```

#![warn(clippy::all)]

// Modules
mod error;
mod memory;
#[cfg(feature = "postgres")]
mod postgres;
mod repository;

// Re-exports
pub use error::StoreError;
pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::{PgCollectionStore, PgCollectionTx};
pub use repository::{CollectionStore, CollectionTx};
