//! Test helpers for kiosk catalog tests.
//!
//! Provides fixtures, collection seeding, and density assertions shared by
//! the in-memory and database-backed test suites.

mod helpers;

pub use helpers::{assert_dense, fields, names_in_order, pos, seed_collection};

use anyhow::Result;
use sqlx::PgPool;

/// Setup a clean test database by running migrations.
///
/// Convenience function for tests that need a fresh schema.
/// Note: migrations are located at the workspace root.
pub async fn setup_test_db(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../migrations").run(pool).await?;
    Ok(())
}
