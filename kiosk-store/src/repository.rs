//! Repository trait definitions (Ports)
//!
//! These traits define the position store accessor used by the ordered
//! collection manager. Implementations can be PostgreSQL, in-memory, or mock
//! for testing.
//!
//! Every write goes through a [`CollectionTx`], which holds the collection's
//! exclusive lock for its whole lifetime. Dropping a transaction without
//! calling [`CollectionTx::commit`] discards every write made through it.

use crate::error::StoreError;
use async_trait::async_trait;
use kiosk_domain::{Collection, Entity, EntityId, Position};

/// Transactional handle scoped to one collection.
#[async_trait]
pub trait CollectionTx: Send {
    /// Collection this transaction is locked on
    fn collection(&self) -> Collection;

    /// Number of members
    async fn count(&mut self) -> Result<usize, StoreError>;

    /// Find a member by ID
    async fn find_by_id(&mut self, id: EntityId) -> Result<Option<Entity>, StoreError>;

    /// Every member, ascending by position (ties by creation time)
    async fn members(&mut self) -> Result<Vec<Entity>, StoreError>;

    /// Add `delta` to the position of every member with
    /// `from <= position` and, when `to` is set, `position <= to`.
    ///
    /// Returns the number of members shifted.
    async fn shift_positions(
        &mut self,
        from: Position,
        to: Option<Position>,
        delta: i32,
    ) -> Result<u64, StoreError>;

    /// Insert a new member
    async fn insert(&mut self, entity: &Entity) -> Result<(), StoreError>;

    /// Overwrite a member's fields and position
    async fn update(&mut self, entity: &Entity) -> Result<(), StoreError>;

    /// Set a single member's position
    async fn set_position(&mut self, id: EntityId, position: Position) -> Result<(), StoreError>;

    /// Remove a member
    async fn delete(&mut self, id: EntityId) -> Result<(), StoreError>;

    /// Write `(id, position)` for a batch of members in one statement
    async fn assign_positions(
        &mut self,
        assignments: &[(EntityId, Position)],
    ) -> Result<(), StoreError>;

    /// Make every write visible atomically
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Discard every write
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Store of positioned entities, partitioned by collection.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Begin a transaction holding the collection's exclusive lock.
    ///
    /// Waits while another transaction holds the same collection.
    /// Transactions on different collections never wait on each other.
    async fn begin(&self, collection: Collection) -> Result<Box<dyn CollectionTx>, StoreError>;

    /// All members, ascending by position
    async fn list(&self, collection: Collection) -> Result<Vec<Entity>, StoreError>;

    /// Find a member by ID
    async fn find_by_id(
        &self,
        collection: Collection,
        id: EntityId,
    ) -> Result<Option<Entity>, StoreError>;
}
