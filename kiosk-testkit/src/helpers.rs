//! Fixture and assertion helpers.

use anyhow::Result;

use kiosk_domain::{Collection, Entity, EntityFields, Position};
use kiosk_engine::check_density;
use kiosk_store::CollectionStore;

/// Fields with only a name.
///
/// Panics on a blank name.
pub fn fields(name: &str) -> EntityFields {
    EntityFields::named(name).unwrap()
}

/// Position from a literal.
pub fn pos(value: u32) -> Position {
    Position::new(value).unwrap()
}

/// Member names in the order given (callers pass `list` output).
pub fn names_in_order(members: &[Entity]) -> Vec<String> {
    members.iter().map(|e| e.name.clone()).collect()
}

/// Assert positions are exactly `0..members.len()`.
pub fn assert_dense(members: &[Entity]) {
    let report = check_density(members.iter().map(|e| e.position));
    assert!(report.is_dense(), "positions not dense: {:?}", report);
}

/// Append one member per name directly through the store, bypassing the
/// manager. Positions continue from the collection's current size.
pub async fn seed_collection<S>(
    store: &S,
    collection: Collection,
    names: &[&str],
) -> Result<Vec<Entity>>
where
    S: CollectionStore + ?Sized,
{
    let mut tx = store.begin(collection).await?;
    let start = tx.count().await?;

    let mut seeded = Vec::with_capacity(names.len());
    for (offset, name) in names.iter().enumerate() {
        let entity = Entity::new(
            collection,
            EntityFields::named(*name)?,
            Position::from_index(start + offset)?,
        );
        tx.insert(&entity).await?;
        seeded.push(entity);
    }

    tx.commit().await?;
    Ok(seeded)
}
