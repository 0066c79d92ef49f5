//! Position assignment policy
//!
//! Given a collection summary (size, current position of the target),
//! decides where a member goes and which other members shift.
//! All bounds are checked here, before the manager issues any write.

use std::collections::HashSet;

use kiosk_domain::{EntityId, Position};
use tracing::debug;

use crate::error::PolicyError;
use crate::plan::{CreatePlan, DeletePlan, Direction, MovePlan, ReorderPlan, Shift};

/// Collection size as a position (the append slot)
fn end_of(size: usize) -> Result<Position, PolicyError> {
    Position::from_index(size).map_err(|_| PolicyError::CollectionTooLarge(size))
}

/// Last occupied position of a non-empty collection
fn last_of(size: usize) -> Result<Position, PolicyError> {
    match size.checked_sub(1) {
        Some(last) => Position::from_index(last).map_err(|_| PolicyError::CollectionTooLarge(size)),
        None => Err(PolicyError::EmptyCollection),
    }
}

/// Plan an insert into a collection of `size` members.
///
/// Without a requested position the member is appended at `size`.
/// A requested position must satisfy `0 <= p <= size`; members at `p` and
/// beyond shift up by one.
pub fn plan_create(size: usize, requested: Option<Position>) -> Result<CreatePlan, PolicyError> {
    let end = end_of(size)?;

    let plan = match requested {
        None => CreatePlan {
            position: end,
            shift: None,
        },
        Some(p) if p > end => {
            return Err(PolicyError::PositionOutOfRange {
                requested: p,
                max: end,
            });
        },
        Some(p) if p == end => CreatePlan {
            position: end,
            shift: None,
        },
        Some(p) => CreatePlan {
            position: p,
            shift: Some(Shift {
                from: p,
                to: None,
                direction: Direction::Up,
            }),
        },
    };

    debug!(size, position = %plan.position, append = plan.is_append(), "Create planned");
    Ok(plan)
}

/// Plan moving the member at `current` to `requested`.
///
/// `requested` must satisfy `0 <= p <= size - 1`. Moving to the current
/// position yields an empty plan.
pub fn plan_move(
    size: usize,
    current: Position,
    requested: Position,
) -> Result<MovePlan, PolicyError> {
    let last = last_of(size)?;

    if current > last {
        return Err(PolicyError::CorruptPosition { current, size });
    }
    if requested > last {
        return Err(PolicyError::PositionOutOfRange {
            requested,
            max: last,
        });
    }

    let shift = if requested < current {
        // [p, c) up
        current.prev().map(|before| Shift {
            from: requested,
            to: Some(before),
            direction: Direction::Up,
        })
    } else if requested > current {
        // (c, p] down
        current.next().map(|after| Shift {
            from: after,
            to: Some(requested),
            direction: Direction::Down,
        })
    } else {
        None
    };

    let plan = MovePlan {
        from: current,
        to: requested,
        shift,
    };
    debug!(size, from = %plan.from, to = %plan.to, noop = plan.is_noop(), "Move planned");
    Ok(plan)
}

/// Plan removing the member at `position` and compacting the gap.
pub fn plan_delete(size: usize, position: Position) -> Result<DeletePlan, PolicyError> {
    let last = match last_of(size) {
        Ok(last) => last,
        Err(PolicyError::EmptyCollection) => {
            return Err(PolicyError::CorruptPosition {
                current: position,
                size,
            });
        },
        Err(e) => return Err(e),
    };

    if position > last {
        return Err(PolicyError::CorruptPosition {
            current: position,
            size,
        });
    }

    let shift = position
        .next()
        .filter(|_| position < last)
        .map(|after| Shift {
            from: after,
            to: None,
            direction: Direction::Down,
        });

    debug!(size, position = %position, compacts = shift.is_some(), "Delete planned");
    Ok(DeletePlan { position, shift })
}

/// Plan a full rewrite of positions from a caller-supplied ordering.
///
/// `ordered` must be a permutation of `members`: every member exactly once,
/// nothing else.
pub fn plan_reorder(
    members: &[EntityId],
    ordered: &[EntityId],
) -> Result<ReorderPlan, PolicyError> {
    let member_set: HashSet<EntityId> = members.iter().copied().collect();
    let mut seen = HashSet::with_capacity(ordered.len());

    for id in ordered {
        if !member_set.contains(id) {
            return Err(PolicyError::ReorderUnknown(*id));
        }
        if !seen.insert(*id) {
            return Err(PolicyError::ReorderDuplicate(*id));
        }
    }

    if ordered.len() != member_set.len() {
        return Err(PolicyError::ReorderLengthMismatch {
            given: ordered.len(),
            expected: member_set.len(),
        });
    }

    let assignments = ordered
        .iter()
        .enumerate()
        .map(|(index, id)| {
            Position::from_index(index)
                .map(|p| (*id, p))
                .map_err(|_| PolicyError::CollectionTooLarge(ordered.len()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(size = assignments.len(), "Reorder planned");
    Ok(ReorderPlan { assignments })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn pos(v: u32) -> Position {
        Position::new(v).unwrap()
    }

    /// Apply a plan to a position list the way the store would
    fn shifted(positions: &[u32], shift: Option<Shift>) -> Vec<u32> {
        positions
            .iter()
            .map(|p| shift.map_or(pos(*p), |s| s.apply(pos(*p))).value())
            .collect()
    }

    // Create

    #[test]
    fn test_create_appends_without_request() {
        let plan = plan_create(3, None).unwrap();
        assert_eq!(plan.position, pos(3));
        assert!(plan.is_append());
    }

    #[test]
    fn test_create_into_empty_collection() {
        let plan = plan_create(0, None).unwrap();
        assert_eq!(plan.position, Position::ORIGIN);
        assert!(plan_create(0, Some(pos(0))).unwrap().is_append());
    }

    #[test]
    fn test_create_at_end_is_append() {
        let plan = plan_create(3, Some(pos(3))).unwrap();
        assert_eq!(plan.position, pos(3));
        assert!(plan.shift.is_none());
    }

    #[test]
    fn test_create_in_middle_shifts_tail_up() {
        // [A:0, B:1, C:2] + D@1
        let plan = plan_create(3, Some(pos(1))).unwrap();
        assert_eq!(plan.position, pos(1));
        assert_eq!(shifted(&[0, 1, 2], plan.shift), vec![0, 2, 3]);
    }

    #[test]
    fn test_create_beyond_end_rejected() {
        let err = plan_create(3, Some(pos(4))).unwrap_err();
        assert_eq!(
            err,
            PolicyError::PositionOutOfRange {
                requested: pos(4),
                max: pos(3)
            }
        );
    }

    // Move

    #[test]
    fn test_move_down_shifts_range_up() {
        // [A:0, D:1, B:2, C:3], B → 0
        let plan = plan_move(4, pos(2), pos(0)).unwrap();
        let shift = plan.shift.unwrap();
        assert_eq!(shift.from, pos(0));
        assert_eq!(shift.to, Some(pos(1)));
        assert_eq!(shift.direction, Direction::Up);
        // A, D, C after shift; B placed at 0 separately
        assert_eq!(shifted(&[0, 1, 3], plan.shift), vec![1, 2, 3]);
    }

    #[test]
    fn test_move_up_shifts_range_down() {
        // [B:0, A:1, D:2, C:3], A → 3
        let plan = plan_move(4, pos(1), pos(3)).unwrap();
        let shift = plan.shift.unwrap();
        assert_eq!(shift.from, pos(2));
        assert_eq!(shift.to, Some(pos(3)));
        assert_eq!(shift.direction, Direction::Down);
        // B, D, C after shift; A placed at 3 separately
        assert_eq!(shifted(&[0, 2, 3], plan.shift), vec![0, 1, 2]);
    }

    #[test]
    fn test_move_to_current_is_noop() {
        let plan = plan_move(4, pos(2), pos(2)).unwrap();
        assert!(plan.is_noop());
        assert!(plan.shift.is_none());
    }

    #[test]
    fn test_move_beyond_last_rejected() {
        let err = plan_move(4, pos(1), pos(4)).unwrap_err();
        assert_eq!(
            err,
            PolicyError::PositionOutOfRange {
                requested: pos(4),
                max: pos(3)
            }
        );
    }

    #[test]
    fn test_move_in_empty_collection_rejected() {
        assert_eq!(plan_move(0, pos(0), pos(0)).unwrap_err(), PolicyError::EmptyCollection);
    }

    #[test]
    fn test_move_from_corrupt_position_rejected() {
        assert!(matches!(
            plan_move(2, pos(5), pos(0)),
            Err(PolicyError::CorruptPosition { .. })
        ));
    }

    // Delete

    #[test]
    fn test_delete_compacts_tail() {
        // [B:0, D:1, C:2, A:3], delete D
        let plan = plan_delete(4, pos(1)).unwrap();
        assert_eq!(shifted(&[0, 2, 3], plan.shift), vec![0, 1, 2]);
    }

    #[test]
    fn test_delete_last_needs_no_shift() {
        let plan = plan_delete(4, pos(3)).unwrap();
        assert!(plan.shift.is_none());
    }

    #[test]
    fn test_delete_outside_collection_rejected() {
        assert!(plan_delete(0, pos(0)).is_err());
        assert!(plan_delete(2, pos(2)).is_err());
    }

    // Reorder

    #[test]
    fn test_reorder_assigns_index() {
        let (a, b, c) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let plan = plan_reorder(&[b, c, a], &[a, c, b]).unwrap();

        assert_eq!(plan.position_of(a), Some(pos(0)));
        assert_eq!(plan.position_of(c), Some(pos(1)));
        assert_eq!(plan.position_of(b), Some(pos(2)));
    }

    #[test]
    fn test_reorder_rejects_partial_list() {
        let (a, b, c) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let err = plan_reorder(&[a, b, c], &[a, b]).unwrap_err();
        assert_eq!(
            err,
            PolicyError::ReorderLengthMismatch {
                given: 2,
                expected: 3
            }
        );
    }

    #[test]
    fn test_reorder_rejects_duplicates() {
        let (a, b, c) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let err = plan_reorder(&[a, b, c], &[a, b, a]).unwrap_err();
        assert_eq!(err, PolicyError::ReorderDuplicate(a));
    }

    #[test]
    fn test_reorder_rejects_unknown_id() {
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        let stranger = Uuid::now_v7();
        let err = plan_reorder(&[a, b], &[a, stranger]).unwrap_err();
        assert_eq!(err, PolicyError::ReorderUnknown(stranger));
    }

    #[test]
    fn test_reorder_empty_collection() {
        let plan = plan_reorder(&[], &[]).unwrap();
        assert!(plan.assignments.is_empty());
    }
}
