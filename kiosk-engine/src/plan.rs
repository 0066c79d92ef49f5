//! Shift plan types
//!
//! One plan type per operation, carrying only what that operation needs.

use kiosk_domain::{EntityId, Position};
use serde::{Deserialize, Serialize};

// =============================================================================
// Shift
// =============================================================================

/// Direction of a range shift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// `position + 1`
    Up,
    /// `position - 1`
    Down,
}

impl Direction {
    /// Signed delta applied to every position in range
    pub fn delta(&self) -> i32 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
        }
    }
}

/// Range-scoped position adjustment.
///
/// Applies to every member with `from <= position` and, when `to` is set,
/// `position <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    /// Inclusive lower bound
    pub from: Position,
    /// Inclusive upper bound, `None` for open-ended
    pub to: Option<Position>,
    /// Which way positions move
    pub direction: Direction,
}

impl Shift {
    /// Whether `position` falls inside the shifted range
    pub fn contains(&self, position: Position) -> bool {
        position >= self.from && self.to.map_or(true, |to| position <= to)
    }

    /// Position after the shift (unchanged when out of range)
    pub fn apply(&self, position: Position) -> Position {
        if !self.contains(position) {
            return position;
        }
        match self.direction {
            // Collection sizes fit in Position::MAX, so Up shifts stay in range
            Direction::Up => position.next().unwrap_or(position),
            // contains() guarantees position >= from, and Down shifts never start at 0
            Direction::Down => position.prev().unwrap_or(position),
        }
    }
}

// =============================================================================
// Plans
// =============================================================================

/// Plan for inserting a new member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatePlan {
    /// Position assigned to the new member
    pub position: Position,
    /// Members to move out of the way, `None` when appending
    pub shift: Option<Shift>,
}

impl CreatePlan {
    /// Whether the new member goes at the end
    pub fn is_append(&self) -> bool {
        self.shift.is_none()
    }
}

/// Plan for moving an existing member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovePlan {
    /// Position the member currently holds
    pub from: Position,
    /// Position the member ends up at
    pub to: Position,
    /// Members displaced by the move
    pub shift: Option<Shift>,
}

impl MovePlan {
    /// Move to the current position
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// Plan for removing a member and compacting the gap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletePlan {
    /// Position freed by the removal
    pub position: Position,
    /// Members after the gap, `None` when removing the last member
    pub shift: Option<Shift>,
}

/// Plan for rewriting every position of a collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderPlan {
    /// `(id, position)` for every member, in position order
    pub assignments: Vec<(EntityId, Position)>,
}

impl ReorderPlan {
    /// Position assigned to `id`
    pub fn position_of(&self, id: EntityId) -> Option<Position> {
        self.assignments.iter().find(|(member, _)| *member == id).map(|(_, p)| *p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(v: u32) -> Position {
        Position::new(v).unwrap()
    }

    #[test]
    fn test_shift_bounded_range() {
        let shift = Shift {
            from: pos(1),
            to: Some(pos(3)),
            direction: Direction::Down,
        };

        assert!(!shift.contains(pos(0)));
        assert!(shift.contains(pos(1)));
        assert!(shift.contains(pos(3)));
        assert!(!shift.contains(pos(4)));
        assert_eq!(shift.apply(pos(2)), pos(1));
        assert_eq!(shift.apply(pos(4)), pos(4));
    }

    #[test]
    fn test_shift_open_range() {
        let shift = Shift {
            from: pos(2),
            to: None,
            direction: Direction::Up,
        };

        assert!(shift.contains(pos(1_000)));
        assert_eq!(shift.apply(pos(2)), pos(3));
        assert_eq!(shift.apply(pos(1)), pos(1));
    }

    #[test]
    fn test_direction_delta() {
        assert_eq!(Direction::Up.delta(), 1);
        assert_eq!(Direction::Down.delta(), -1);
    }
}
