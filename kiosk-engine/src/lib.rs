//! Kiosk Catalog Engine Layer
//!
//! Pure decision logic, deterministic, no I/O.
//! Takes a collection summary → Returns the shift plan to execute.
//!
//! # Plans
//!
//! | Operation | Plan          | Shift                               |
//! |-----------|---------------|-------------------------------------|
//! | create    | `CreatePlan`  | `[p, ∞)` up, or none when appending |
//! | move      | `MovePlan`    | `[p, c)` up or `(c, p]` down        |
//! | delete    | `DeletePlan`  | `(d, ∞)` down                       |
//! | reorder   | `ReorderPlan` | full rewrite, `position = index`    |

#![warn(clippy::all)]

mod density;
mod error;
mod plan;
mod policy;

pub use density::{check_density, DensityReport};
pub use error::PolicyError;
pub use plan::{CreatePlan, DeletePlan, Direction, MovePlan, ReorderPlan, Shift};
pub use policy::{plan_create, plan_delete, plan_move, plan_reorder};
