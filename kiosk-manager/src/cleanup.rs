//! Post-commit asset cleanup.
//!
//! Runs after the positional change has committed. A failure here is logged
//! and never undoes the commit.

use async_trait::async_trait;
use kiosk_domain::Collection;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Releases the external resource (image, file) behind a member's asset.
#[async_trait]
pub trait AssetCleanup: Send + Sync {
    /// Release `asset`, which belonged to a member of `collection`
    async fn release(&self, collection: Collection, asset: &str) -> anyhow::Result<()>;
}

/// Cleanup that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCleanup;

#[async_trait]
impl AssetCleanup for NoopCleanup {
    async fn release(&self, _collection: Collection, _asset: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Cleanup that records every released asset.
///
/// Useful in tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct RecordingCleanup {
    released: Arc<Mutex<Vec<(Collection, String)>>>,
}

impl RecordingCleanup {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Assets released so far, in call order
    pub async fn released(&self) -> Vec<(Collection, String)> {
        self.released.lock().await.clone()
    }
}

#[async_trait]
impl AssetCleanup for RecordingCleanup {
    async fn release(&self, collection: Collection, asset: &str) -> anyhow::Result<()> {
        self.released.lock().await.push((collection, asset.to_string()));
        Ok(())
    }
}
