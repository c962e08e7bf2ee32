use async_trait::async_trait;
use thiserror::Error;

use crate::index::IndexSnapshot;

/// Errors produced by index persistence implementations.
#[derive(Debug, Error)]
pub enum IndexStoreError {
    /// Underlying storage failure (I/O, key custody).
    #[error("index storage failure: {reason}")]
    Storage { reason: String },
    /// The persisted snapshot exists but could not be opened or parsed.
    #[error("index snapshot rejected: {reason}")]
    Corrupt { reason: String },
}

/// Persistence boundary for the vault index.
///
/// The vault persists the candidate snapshot before committing it to memory,
/// so a `save` failure leaves the in-memory index untouched.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Load the last persisted snapshot, or `None` if nothing was saved yet.
    async fn load(&self) -> Result<Option<IndexSnapshot>, IndexStoreError>;

    /// Persist a snapshot, replacing the previous one.
    async fn save(&self, snapshot: &IndexSnapshot) -> Result<(), IndexStoreError>;
}

/// Memory-only persistence: nothing is written, nothing is restored.
/// The vault then lives exactly as long as the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullIndexStore;

#[async_trait]
impl IndexStore for NullIndexStore {
    async fn load(&self) -> Result<Option<IndexSnapshot>, IndexStoreError> {
        Ok(None)
    }

    async fn save(&self, _snapshot: &IndexSnapshot) -> Result<(), IndexStoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_store_loads_nothing_and_accepts_saves() {
        let store = NullIndexStore;
        assert!(store.load().await.expect("load").is_none());
        store.save(&IndexSnapshot::new()).await.expect("save");
        assert!(store.load().await.expect("load").is_none());
    }
}
