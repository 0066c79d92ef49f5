//! Collection Manager: orchestrates one positional change end to end.
//!
//! Every mutating operation follows the same sequence inside a single
//! transaction holding the collection lock:
//!
//! ```text
//! begin(collection) → load state → plan (kiosk-engine) → shift range
//!                   → primary write → commit
//!                                        ↓
//!                              AssetCleanup (best effort)
//! ```
//!
//! Any error between `begin` and `commit` rolls the transaction back before
//! it is returned. Dropping the operation's future drops the transaction,
//! which also rolls back.

use std::sync::Arc;

use tracing::{debug, info, warn};

use kiosk_domain::{Collection, Entity, EntityChanges, EntityFields, EntityId, Position};
use kiosk_engine::{
    check_density, plan_create, plan_delete, plan_move, plan_reorder, DensityReport, Shift,
};
use kiosk_store::{CollectionStore, CollectionTx, StoreError};

use crate::cleanup::{AssetCleanup, NoopCleanup};
use crate::error::{ManagerError, ManagerResult};

// =============================================================================
// Collection Manager
// =============================================================================

/// Ordered collection manager.
pub struct CollectionManager<S: CollectionStore + 'static> {
    /// Position store
    store: Arc<S>,
    /// Releases orphaned assets after commit
    cleanup: Arc<dyn AssetCleanup>,
}

impl<S: CollectionStore + 'static> CollectionManager<S> {
    /// Create a manager without asset cleanup.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            cleanup: Arc::new(NoopCleanup),
        }
    }

    /// Create a manager releasing orphaned assets through `cleanup`.
    pub fn with_cleanup(store: Arc<S>, cleanup: Arc<dyn AssetCleanup>) -> Self {
        Self { store, cleanup }
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create a member, appending when `requested` is `None`.
    ///
    /// Members at or after `requested` move up by one.
    pub async fn create(
        &self,
        collection: Collection,
        fields: EntityFields,
        requested: Option<Position>,
    ) -> ManagerResult<Entity> {
        let mut tx = self.begin(collection).await?;
        let result = create_in(tx.as_mut(), fields, requested).await;
        let entity = finish(collection, tx, result).await?;

        info!(
            %collection,
            entity_id = %entity.id,
            position = %entity.position,
            "Member created"
        );

        Ok(entity)
    }

    /// Move a member to `position`, shifting the members in between.
    pub async fn move_to(
        &self,
        collection: Collection,
        id: EntityId,
        position: Position,
    ) -> ManagerResult<Entity> {
        let mut tx = self.begin(collection).await?;
        let result = move_in(tx.as_mut(), id, position).await;
        let (entity, from) = finish(collection, tx, result).await?;

        info!(
            %collection,
            entity_id = %id,
            %from,
            to = %entity.position,
            "Member moved"
        );

        Ok(entity)
    }

    /// Update a member's fields and, when `changes.position` is set, move it
    /// within the same transaction.
    pub async fn update(
        &self,
        collection: Collection,
        id: EntityId,
        changes: EntityChanges,
    ) -> ManagerResult<Entity> {
        let mut tx = self.begin(collection).await?;
        let result = update_in(tx.as_mut(), id, &changes).await;
        let (entity, replaced) = finish(collection, tx, result).await?;

        info!(
            %collection,
            entity_id = %id,
            position = %entity.position,
            asset_replaced = replaced.is_some(),
            "Member updated"
        );

        if let Some(asset) = replaced {
            self.release_asset(collection, &asset).await;
        }

        Ok(entity)
    }

    /// Delete a member; every member after it moves down by one.
    pub async fn delete(&self, collection: Collection, id: EntityId) -> ManagerResult<()> {
        let mut tx = self.begin(collection).await?;
        let result = delete_in(tx.as_mut(), id).await;
        let entity = finish(collection, tx, result).await?;

        info!(
            %collection,
            entity_id = %id,
            position = %entity.position,
            "Member deleted"
        );

        if let Some(asset) = entity.asset.as_deref() {
            self.release_asset(collection, asset).await;
        }

        Ok(())
    }

    /// Rewrite every position so that `ordered[i]` lands at `i`.
    ///
    /// `ordered` must name every member exactly once.
    pub async fn reorder(&self, collection: Collection, ordered: &[EntityId]) -> ManagerResult<()> {
        let mut tx = self.begin(collection).await?;
        let result = reorder_in(tx.as_mut(), ordered).await;
        finish(collection, tx, result).await?;

        info!(%collection, members = ordered.len(), "Collection reordered");

        Ok(())
    }

    /// Renumber the collection `0..N` in its current order.
    ///
    /// Repairs gaps or duplicates left by writes that bypassed the manager.
    /// Returns the density report taken before repair.
    pub async fn compact(&self, collection: Collection) -> ManagerResult<DensityReport> {
        let mut tx = self.begin(collection).await?;
        let result = compact_in(tx.as_mut()).await;
        let report = finish(collection, tx, result).await?;

        if report.is_dense() {
            debug!(%collection, size = report.size, "Collection already dense");
        } else {
            info!(
                %collection,
                size = report.size,
                missing = report.missing.len(),
                duplicated = report.duplicated.len(),
                "Collection compacted"
            );
        }

        Ok(report)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get a member by ID.
    pub async fn get(&self, collection: Collection, id: EntityId) -> ManagerResult<Entity> {
        self.store
            .find_by_id(collection, id)
            .await
            .map_err(store_err(collection))?
            .ok_or_else(|| ManagerError::not_found(collection, id))
    }

    /// All members, ascending by position.
    pub async fn list(&self, collection: Collection) -> ManagerResult<Vec<Entity>> {
        self.store.list(collection).await.map_err(store_err(collection))
    }

    /// Audit the collection's positions without modifying them.
    pub async fn verify(&self, collection: Collection) -> ManagerResult<DensityReport> {
        let members = self.list(collection).await?;
        let report = check_density(members.iter().map(|e| e.position));

        if !report.is_dense() {
            warn!(
                %collection,
                size = report.size,
                missing = ?report.missing,
                duplicated = ?report.duplicated,
                "Collection positions are not dense"
            );
        }

        Ok(report)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn begin(&self, collection: Collection) -> ManagerResult<Box<dyn CollectionTx>> {
        self.store.begin(collection).await.map_err(store_err(collection))
    }

    async fn release_asset(&self, collection: Collection, asset: &str) {
        if let Err(e) = self.cleanup.release(collection, asset).await {
            warn!(%collection, asset, error = %e, "Asset cleanup failed");
        }
    }
}

fn store_err(collection: Collection) -> impl Fn(StoreError) -> ManagerError {
    move |e| ManagerError::from_store(collection, e)
}

/// Commit on success, roll back on failure.
async fn finish<T>(
    collection: Collection,
    tx: Box<dyn CollectionTx>,
    result: ManagerResult<T>,
) -> ManagerResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await.map_err(store_err(collection))?;
            Ok(value)
        },
        Err(err) => {
            debug!(%collection, error = %err, "Rolling back");
            if let Err(rollback_err) = tx.rollback().await {
                // The dropped transaction is discarded by the store regardless
                warn!(%collection, error = %rollback_err, "Rollback failed");
            }
            Err(err)
        },
    }
}

async fn apply_shift(tx: &mut dyn CollectionTx, shift: Option<Shift>) -> ManagerResult<()> {
    let Some(shift) = shift else {
        return Ok(());
    };
    let collection = tx.collection();
    let shifted = tx
        .shift_positions(shift.from, shift.to, shift.direction.delta())
        .await
        .map_err(store_err(collection))?;
    debug!(%collection, ?shift, shifted, "Range shifted");
    Ok(())
}

async fn load(tx: &mut dyn CollectionTx, id: EntityId) -> ManagerResult<Entity> {
    let collection = tx.collection();
    tx.find_by_id(id)
        .await
        .map_err(store_err(collection))?
        .ok_or_else(|| ManagerError::not_found(collection, id))
}

async fn size(tx: &mut dyn CollectionTx) -> ManagerResult<usize> {
    let collection = tx.collection();
    tx.count().await.map_err(store_err(collection))
}

async fn create_in(
    tx: &mut dyn CollectionTx,
    fields: EntityFields,
    requested: Option<Position>,
) -> ManagerResult<Entity> {
    let collection = tx.collection();
    let plan = plan_create(size(tx).await?, requested)?;
    apply_shift(tx, plan.shift).await?;

    let entity = Entity::new(collection, fields, plan.position);
    tx.insert(&entity).await.map_err(store_err(collection))?;
    Ok(entity)
}

/// Returns the moved entity and its previous position.
async fn move_in(
    tx: &mut dyn CollectionTx,
    id: EntityId,
    position: Position,
) -> ManagerResult<(Entity, Position)> {
    let collection = tx.collection();
    let mut entity = load(tx, id).await?;
    let plan = plan_move(size(tx).await?, entity.position, position)?;
    if plan.is_noop() {
        return Ok((entity, plan.from));
    }

    apply_shift(tx, plan.shift).await?;
    tx.set_position(id, plan.to).await.map_err(store_err(collection))?;
    entity.position = plan.to;
    Ok((entity, plan.from))
}

/// Returns the updated entity and the asset it no longer references.
async fn update_in(
    tx: &mut dyn CollectionTx,
    id: EntityId,
    changes: &EntityChanges,
) -> ManagerResult<(Entity, Option<String>)> {
    let collection = tx.collection();
    if !changes.touches_fields() {
        return match changes.position {
            Some(position) => move_in(tx, id, position).await.map(|(e, _)| (e, None)),
            None => load(tx, id).await.map(|e| (e, None)),
        };
    }
    let mut entity = load(tx, id).await?;

    // Validate before any write
    let plan = match changes.position {
        Some(position) => Some(plan_move(size(tx).await?, entity.position, position)?),
        None => None,
    };
    if let Some(name) = &changes.name {
        EntityFields::named(name.as_str())?;
    }

    let replaced = entity.apply(changes);
    if let Some(plan) = plan {
        apply_shift(tx, plan.shift).await?;
        entity.position = plan.to;
    }
    tx.update(&entity).await.map_err(store_err(collection))?;
    Ok((entity, replaced))
}

/// Returns the deleted entity.
async fn delete_in(tx: &mut dyn CollectionTx, id: EntityId) -> ManagerResult<Entity> {
    let collection = tx.collection();
    let entity = load(tx, id).await?;
    let plan = plan_delete(size(tx).await?, entity.position)?;

    // Shifted members pass through the deleted member's position until the
    // delete below; uniqueness is only checked at commit.
    apply_shift(tx, plan.shift).await?;
    tx.delete(id).await.map_err(store_err(collection))?;
    Ok(entity)
}

async fn reorder_in(tx: &mut dyn CollectionTx, ordered: &[EntityId]) -> ManagerResult<()> {
    let collection = tx.collection();
    let members: Vec<EntityId> = tx
        .members()
        .await
        .map_err(store_err(collection))?
        .into_iter()
        .map(|e| e.id)
        .collect();
    let plan = plan_reorder(&members, ordered)?;
    tx.assign_positions(&plan.assignments)
        .await
        .map_err(store_err(collection))?;
    Ok(())
}

async fn compact_in(tx: &mut dyn CollectionTx) -> ManagerResult<DensityReport> {
    let collection = tx.collection();
    let members = tx.members().await.map_err(store_err(collection))?;
    let report = check_density(members.iter().map(|e| e.position));
    if report.is_dense() {
        return Ok(report);
    }

    let ordered: Vec<EntityId> = members.iter().map(|e| e.id).collect();
    let plan = plan_reorder(&ordered, &ordered)?;
    tx.assign_positions(&plan.assignments)
        .await
        .map_err(store_err(collection))?;
    Ok(report)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanup::RecordingCleanup;
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use kiosk_engine::PolicyError;
    use kiosk_store::MemoryStore;
    use kiosk_testkit::{assert_dense, fields, names_in_order, pos};
    use serde_json::json;

    const ADS: Collection = Collection::Ads;

    fn create_test_manager() -> CollectionManager<MemoryStore> {
        CollectionManager::new(Arc::new(MemoryStore::new()))
    }

    async fn seed(manager: &CollectionManager<MemoryStore>, names: &[&str]) -> Vec<Entity> {
        let mut created = Vec::new();
        for name in names {
            created.push(manager.create(ADS, fields(name), None).await.unwrap());
        }
        created
    }

    async fn order(manager: &CollectionManager<MemoryStore>) -> Vec<String> {
        let members = manager.list(ADS).await.unwrap();
        assert_dense(&members);
        names_in_order(&members)
    }

    fn id_of(members: &[Entity], name: &str) -> EntityId {
        members.iter().find(|e| e.name == name).map(|e| e.id).unwrap()
    }

    struct FailingCleanup;

    #[async_trait]
    impl AssetCleanup for FailingCleanup {
        async fn release(&self, _collection: Collection, asset: &str) -> anyhow::Result<()> {
            anyhow::bail!("storage unavailable for {asset}")
        }
    }

    #[tokio::test]
    async fn test_append_is_stable() {
        let manager = create_test_manager();
        let seeded = seed(&manager, &["A", "B"]).await;

        let c = manager.create(ADS, fields("C"), None).await.unwrap();

        assert_eq!(c.position, pos(2));
        let members = manager.list(ADS).await.unwrap();
        assert_eq!(members[0].id, seeded[0].id);
        assert_eq!(members[0].position, pos(0));
        assert_eq!(members[1].position, pos(1));
        assert_eq!(order(&manager).await, ["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_create_at_position_shifts_tail() {
        let manager = create_test_manager();
        seed(&manager, &["A", "B", "C"]).await;

        let d = manager.create(ADS, fields("D"), Some(pos(1))).await.unwrap();

        assert_eq!(d.position, pos(1));
        assert_eq!(order(&manager).await, ["A", "D", "B", "C"]);
    }

    #[tokio::test]
    async fn test_create_at_size_appends() {
        let manager = create_test_manager();
        seed(&manager, &["A", "B"]).await;

        manager.create(ADS, fields("C"), Some(pos(2))).await.unwrap();

        assert_eq!(order(&manager).await, ["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_create_past_end_rejected() {
        let manager = create_test_manager();
        seed(&manager, &["A", "B"]).await;

        let err = manager.create(ADS, fields("C"), Some(pos(3))).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(matches!(
            err,
            ManagerError::Validation(PolicyError::PositionOutOfRange { .. })
        ));
        assert_eq!(order(&manager).await, ["A", "B"]);
    }

    #[tokio::test]
    async fn test_move_down_and_up() {
        let manager = create_test_manager();
        seed(&manager, &["A", "B", "C"]).await;
        manager.create(ADS, fields("D"), Some(pos(1))).await.unwrap();
        let members = manager.list(ADS).await.unwrap();

        let b = manager.move_to(ADS, id_of(&members, "B"), pos(0)).await.unwrap();
        assert_eq!(b.position, pos(0));
        assert_eq!(order(&manager).await, ["B", "A", "D", "C"]);

        let a = manager.move_to(ADS, id_of(&members, "A"), pos(3)).await.unwrap();
        assert_eq!(a.position, pos(3));
        assert_eq!(order(&manager).await, ["B", "D", "C", "A"]);
    }

    #[tokio::test]
    async fn test_move_to_current_position_is_noop() {
        let manager = create_test_manager();
        let seeded = seed(&manager, &["A", "B", "C"]).await;
        let before = manager.list(ADS).await.unwrap();

        let b = manager.move_to(ADS, seeded[1].id, pos(1)).await.unwrap();

        assert_eq!(b.position, pos(1));
        assert_eq!(manager.list(ADS).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_move_out_of_range_rejected() {
        let manager = create_test_manager();
        let seeded = seed(&manager, &["A", "B", "C"]).await;
        let before = manager.list(ADS).await.unwrap();

        let err = manager.move_to(ADS, seeded[0].id, pos(3)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(manager.list(ADS).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_move_unknown_is_not_found() {
        let manager = create_test_manager();
        seed(&manager, &["A"]).await;

        let err = manager.move_to(ADS, uuid::Uuid::now_v7(), pos(0)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_closes_gap() {
        let manager = create_test_manager();
        let seeded = seed(&manager, &["B", "D", "C", "A"]).await;

        manager.delete(ADS, seeded[1].id).await.unwrap();

        assert_eq!(order(&manager).await, ["B", "C", "A"]);
        let err = manager.get(ADS, seeded[1].id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_last_member() {
        let manager = create_test_manager();
        let seeded = seed(&manager, &["A", "B"]).await;

        manager.delete(ADS, seeded[1].id).await.unwrap();
        manager.delete(ADS, seeded[0].id).await.unwrap();

        assert!(manager.list(ADS).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_unknown_is_not_found() {
        let manager = create_test_manager();
        seed(&manager, &["A"]).await;

        let err = manager.delete(ADS, uuid::Uuid::now_v7()).await.unwrap_err();

        assert!(matches!(err, ManagerError::NotFound { collection: Collection::Ads, .. }));
        assert_eq!(order(&manager).await, ["A"]);
    }

    #[tokio::test]
    async fn test_reorder_and_inverse() {
        let manager = create_test_manager();
        let seeded = seed(&manager, &["B", "C", "A"]).await;
        let original: Vec<EntityId> = seeded.iter().map(|e| e.id).collect();
        let (b, c, a) = (original[0], original[1], original[2]);

        manager.reorder(ADS, &[a, c, b]).await.unwrap();
        assert_eq!(order(&manager).await, ["A", "C", "B"]);

        manager.reorder(ADS, &original).await.unwrap();
        assert_eq!(order(&manager).await, ["B", "C", "A"]);
    }

    #[tokio::test]
    async fn test_partial_reorder_rejected() {
        let manager = create_test_manager();
        let seeded = seed(&manager, &["A", "B", "C"]).await;
        let before = manager.list(ADS).await.unwrap();

        let err = manager
            .reorder(ADS, &[seeded[2].id, seeded[0].id])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ManagerError::Validation(PolicyError::ReorderLengthMismatch { given: 2, expected: 3 })
        ));
        assert_eq!(manager.list(ADS).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_reorder_with_foreign_id_rejected() {
        let manager = create_test_manager();
        let seeded = seed(&manager, &["A", "B"]).await;
        let other = manager
            .create(Collection::FloorPlans, fields("Lobby"), None)
            .await
            .unwrap();

        let err = manager.reorder(ADS, &[seeded[0].id, other.id]).await.unwrap_err();

        assert!(matches!(
            err,
            ManagerError::Validation(PolicyError::ReorderUnknown(id)) if id == other.id
        ));
        assert_eq!(order(&manager).await, ["A", "B"]);
    }

    #[tokio::test]
    async fn test_duplicate_name_rolls_back_shift() {
        let manager = create_test_manager();
        seed(&manager, &["A", "B", "C"]).await;
        let before = manager.list(ADS).await.unwrap();

        // Shift of [0, ∞) runs before the insert fails
        let err = manager.create(ADS, fields("B"), Some(pos(0))).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(matches!(err, ManagerError::Conflict { ref field, .. } if field == "name"));
        assert_eq!(manager.list(ADS).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_update_fields_and_position_together() {
        let manager = create_test_manager();
        let seeded = seed(&manager, &["A", "B", "C"]).await;

        let changes = EntityChanges {
            name: Some("Z".to_string()),
            attributes: Some(json!({"caption": "last"})),
            position: Some(pos(2)),
            ..Default::default()
        };
        let updated = manager.update(ADS, seeded[0].id, changes).await.unwrap();

        assert_eq!(updated.name, "Z");
        assert_eq!(updated.position, pos(2));
        assert_eq!(order(&manager).await, ["B", "C", "Z"]);
        let stored = manager.get(ADS, seeded[0].id).await.unwrap();
        assert_eq!(stored.attributes, json!({"caption": "last"}));
    }

    #[tokio::test]
    async fn test_update_without_field_changes() {
        let manager = create_test_manager();
        let seeded = seed(&manager, &["A", "B", "C"]).await;
        let before = manager.list(ADS).await.unwrap();

        let unchanged = manager
            .update(ADS, seeded[1].id, EntityChanges::default())
            .await
            .unwrap();
        assert_eq!(unchanged, before[1]);
        assert_eq!(manager.list(ADS).await.unwrap(), before);

        let position_only = EntityChanges {
            position: Some(pos(0)),
            ..Default::default()
        };
        let moved = manager.update(ADS, seeded[2].id, position_only).await.unwrap();
        assert_eq!(moved.position, pos(0));
        assert_eq!(moved.name, "C");
        assert_eq!(order(&manager).await, ["C", "A", "B"]);
    }

    #[tokio::test]
    async fn test_create_keeps_attributes() {
        let manager = create_test_manager();

        let created = manager
            .create(
                Collection::FloorPlans,
                fields("Level 2").with_attributes(json!({"floor": 2, "wing": "east"})),
                None,
            )
            .await
            .unwrap();

        let stored = manager.get(Collection::FloorPlans, created.id).await.unwrap();
        assert_eq!(stored.attributes, json!({"floor": 2, "wing": "east"}));
        assert!(stored.asset.is_none());
    }

    #[tokio::test]
    async fn test_update_rejected_leaves_fields_untouched() {
        let manager = create_test_manager();
        let seeded = seed(&manager, &["A", "B"]).await;
        let before = manager.list(ADS).await.unwrap();

        let changes = EntityChanges {
            name: Some("B".to_string()),
            position: Some(pos(1)),
            ..Default::default()
        };
        let err = manager.update(ADS, seeded[0].id, changes).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(manager.list(ADS).await.unwrap(), before);

        let blank = EntityChanges {
            name: Some("  ".to_string()),
            ..Default::default()
        };
        let err = manager.update(ADS, seeded[0].id, blank).await.unwrap_err();
        assert!(matches!(err, ManagerError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_replaced_and_deleted_assets_released() {
        let store = Arc::new(MemoryStore::new());
        let cleanup = RecordingCleanup::new();
        let manager = CollectionManager::with_cleanup(store, Arc::new(cleanup.clone()));

        let entity = manager
            .create(ADS, fields("A").with_asset("ads/a-v1.png"), None)
            .await
            .unwrap();
        let changes = EntityChanges {
            asset: Some(Some("ads/a-v2.png".to_string())),
            ..Default::default()
        };
        manager.update(ADS, entity.id, changes).await.unwrap();
        manager.delete(ADS, entity.id).await.unwrap();

        assert_eq!(
            cleanup.released().await,
            vec![
                (ADS, "ads/a-v1.png".to_string()),
                (ADS, "ads/a-v2.png".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_cleanup_failure_keeps_commit() {
        let store = Arc::new(MemoryStore::new());
        let manager = CollectionManager::with_cleanup(store.clone(), Arc::new(FailingCleanup));

        let a = manager
            .create(ADS, fields("A").with_asset("ads/a.png"), None)
            .await
            .unwrap();
        manager.create(ADS, fields("B"), None).await.unwrap();

        manager.delete(ADS, a.id).await.unwrap();

        assert_eq!(store.len(ADS).await, 1);
        assert_eq!(order(&manager).await, ["B"]);
    }

    #[tokio::test]
    async fn test_collections_are_independent() {
        let manager = create_test_manager();
        seed(&manager, &["A", "B"]).await;

        let lobby = manager
            .create(Collection::FloorPlans, fields("Lobby"), None)
            .await
            .unwrap();
        manager
            .create(Collection::FloorPlans, fields("A"), Some(pos(0)))
            .await
            .unwrap();

        assert_eq!(lobby.position, pos(0));
        assert_eq!(order(&manager).await, ["A", "B"]);
        let plans = manager.list(Collection::FloorPlans).await.unwrap();
        assert_eq!(names_in_order(&plans), ["A", "Lobby"]);
        assert_dense(&plans);
    }

    #[tokio::test]
    async fn test_concurrent_creates_stay_dense() {
        let manager = Arc::new(create_test_manager());

        let mut handles = Vec::new();
        for i in 0..16 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                let requested = if i % 2 == 0 { Some(pos(0)) } else { None };
                manager.create(ADS, fields(&format!("ad-{i}")), requested).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let members = manager.list(ADS).await.unwrap();
        assert_eq!(members.len(), 16);
        assert_dense(&members);
    }

    #[tokio::test]
    async fn test_verify_and_compact_repair_gaps() {
        let store = Arc::new(MemoryStore::new());
        let manager = CollectionManager::new(store.clone());
        seed(&manager, &["A", "B", "C"]).await;

        // Write a gap directly through the store
        let mut tx = store.begin(ADS).await.unwrap();
        let members = tx.members().await.unwrap();
        tx.set_position(members[2].id, pos(7)).await.unwrap();
        tx.commit().await.unwrap();

        let report = manager.verify(ADS).await.unwrap();
        assert!(!report.is_dense());
        assert_eq!(report.missing, vec![pos(2)]);

        let repaired = manager.compact(ADS).await.unwrap();
        assert_eq!(repaired, report);
        assert!(manager.verify(ADS).await.unwrap().is_dense());
        assert_eq!(order(&manager).await, ["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_compact_dense_collection_is_noop() {
        let manager = create_test_manager();
        seed(&manager, &["A", "B"]).await;
        let before = manager.list(ADS).await.unwrap();

        let report = manager.compact(ADS).await.unwrap();

        assert!(report.is_dense());
        assert_eq!(manager.list(ADS).await.unwrap(), before);
    }
}
