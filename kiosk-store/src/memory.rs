//! In-memory store implementation
//!
//! Used for testing and development without a database.
//! Each collection sits behind its own async mutex; a transaction owns the
//! guard for its lifetime and works on a staged copy, swapped in on commit.

use crate::error::StoreError;
use crate::repository::{CollectionStore, CollectionTx};
use async_trait::async_trait;
use chrono::Utc;
use kiosk_domain::{Collection, Entity, EntityId, Position};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// In-memory store for testing
pub struct MemoryStore {
    ads: Arc<Mutex<Vec<Entity>>>,
    floor_plans: Arc<Mutex<Vec<Entity>>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self {
            ads: Arc::new(Mutex::new(Vec::new())),
            floor_plans: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn slot(&self, collection: Collection) -> &Arc<Mutex<Vec<Entity>>> {
        match collection {
            Collection::Ads => &self.ads,
            Collection::FloorPlans => &self.floor_plans,
        }
    }

    /// Get the number of committed members of a collection
    pub async fn len(&self, collection: Collection) -> usize {
        self.slot(collection).lock().await.len()
    }

    /// Clear all data (useful for test setup)
    pub async fn clear(&self) {
        for collection in Collection::ALL {
            self.slot(collection).lock().await.clear();
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// Transaction over one collection.
///
/// Holds the collection's mutex until dropped.
struct MemoryTx {
    collection: Collection,
    committed: OwnedMutexGuard<Vec<Entity>>,
    staged: Vec<Entity>,
}

impl MemoryTx {
    fn member_mut(&mut self, id: EntityId) -> Result<&mut Entity, StoreError> {
        self.staged
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| StoreError::not_found("entity", id.to_string()))
    }

    fn check_name_free(&self, name: &str, except: Option<EntityId>) -> Result<(), StoreError> {
        let taken = self.staged.iter().any(|e| e.name == name && Some(e.id) != except);
        if taken {
            return Err(StoreError::duplicate("name", name));
        }
        Ok(())
    }

    /// Deferred uniqueness check on position, run at commit
    fn check_positions_unique(&self) -> Result<(), StoreError> {
        let mut seen = HashSet::with_capacity(self.staged.len());
        for entity in &self.staged {
            if !seen.insert(entity.position) {
                return Err(StoreError::duplicate("position", entity.position.to_string()));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CollectionTx for MemoryTx {
    fn collection(&self) -> Collection {
        self.collection
    }

    async fn count(&mut self) -> Result<usize, StoreError> {
        Ok(self.staged.len())
    }

    async fn find_by_id(&mut self, id: EntityId) -> Result<Option<Entity>, StoreError> {
        Ok(self.staged.iter().find(|e| e.id == id).cloned())
    }

    async fn members(&mut self) -> Result<Vec<Entity>, StoreError> {
        let mut members = self.staged.clone();
        members.sort_by_key(|e| (e.position, e.created_at));
        Ok(members)
    }

    async fn shift_positions(
        &mut self,
        from: Position,
        to: Option<Position>,
        delta: i32,
    ) -> Result<u64, StoreError> {
        let now = Utc::now();
        let mut shifted = 0;
        for entity in self.staged.iter_mut() {
            let p = entity.position;
            if p < from || to.is_some_and(|to| p > to) {
                continue;
            }
            entity.position = Position::try_from(i64::from(p) + i64::from(delta))?;
            entity.updated_at = now;
            shifted += 1;
        }
        Ok(shifted)
    }

    async fn insert(&mut self, entity: &Entity) -> Result<(), StoreError> {
        if self.staged.iter().any(|e| e.id == entity.id) {
            return Err(StoreError::duplicate("entity", entity.id.to_string()));
        }
        self.check_name_free(&entity.name, None)?;
        self.staged.push(entity.clone());
        Ok(())
    }

    async fn update(&mut self, entity: &Entity) -> Result<(), StoreError> {
        self.check_name_free(&entity.name, Some(entity.id))?;
        let member = self.member_mut(entity.id)?;
        *member = entity.clone();
        Ok(())
    }

    async fn set_position(&mut self, id: EntityId, position: Position) -> Result<(), StoreError> {
        let member = self.member_mut(id)?;
        member.position = position;
        member.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&mut self, id: EntityId) -> Result<(), StoreError> {
        let index = self
            .staged
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| StoreError::not_found("entity", id.to_string()))?;
        self.staged.remove(index);
        Ok(())
    }

    async fn assign_positions(
        &mut self,
        assignments: &[(EntityId, Position)],
    ) -> Result<(), StoreError> {
        let now = Utc::now();
        for (id, position) in assignments {
            let member = self.member_mut(*id)?;
            member.position = *position;
            member.updated_at = now;
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.check_positions_unique()?;
        let MemoryTx {
            mut committed,
            staged,
            ..
        } = *self;
        *committed = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        // Dropping the guard releases the lock; staged writes are discarded
        Ok(())
    }
}

// =============================================================================
// Store Implementation
// =============================================================================

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn begin(&self, collection: Collection) -> Result<Box<dyn CollectionTx>, StoreError> {
        let committed = Arc::clone(self.slot(collection)).lock_owned().await;
        let staged = committed.clone();
        Ok(Box::new(MemoryTx {
            collection,
            committed,
            staged,
        }))
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Entity>, StoreError> {
        let mut members = self.slot(collection).lock().await.clone();
        members.sort_by_key(|e| (e.position, e.created_at));
        Ok(members)
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: EntityId,
    ) -> Result<Option<Entity>, StoreError> {
        let members = self.slot(collection).lock().await;
        Ok(members.iter().find(|e| e.id == id).cloned())
    }
}

// =============================================================================
// Tests
// =============================================================================
