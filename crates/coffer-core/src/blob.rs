use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use thiserror::Error;

use crate::index::StorageId;

/// Errors produced by blob store implementations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlobStoreError {
    /// No blob is stored under the id.
    #[error("no blob for id: {id}")]
    NotFound { id: String },
    /// Underlying storage failure.
    #[error("blob storage failure: {reason}")]
    Storage { reason: String },
}

/// Durable store of opaque byte sequences keyed by storage id.
///
/// Implementations guarantee at least last-writer-wins semantics per id.
/// The vault never hands a blob store anything but ciphertext.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist bytes under an id, overwriting any existing blob.
    async fn put(&self, id: &StorageId, bytes: &[u8]) -> Result<(), BlobStoreError>;

    /// Retrieve the bytes stored under an id.
    async fn get(&self, id: &StorageId) -> Result<Vec<u8>, BlobStoreError>;

    /// Remove a blob (idempotent).
    async fn delete(&self, id: &StorageId) -> Result<(), BlobStoreError>;
}

/// In-memory blob store for tests and ephemeral vaults.
#[derive(Debug, Default, Clone)]
pub struct InMemoryBlobStore {
    inner: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs currently held. Test observability only.
    pub fn blob_count(&self) -> usize {
        self.inner.lock().map(|map| map.len()).unwrap_or(0)
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, id: &StorageId, bytes: &[u8]) -> Result<(), BlobStoreError> {
        let mut map = self.inner.lock().map_err(|err| BlobStoreError::Storage {
            reason: format!("lock poisoned: {err}"),
        })?;
        map.insert(id.as_str().to_string(), bytes.to_vec());
        Ok(())
    }

    async fn get(&self, id: &StorageId) -> Result<Vec<u8>, BlobStoreError> {
        let map = self.inner.lock().map_err(|err| BlobStoreError::Storage {
            reason: format!("lock poisoned: {err}"),
        })?;
        map.get(id.as_str())
            .cloned()
            .ok_or_else(|| BlobStoreError::NotFound {
                id: id.as_str().to_string(),
            })
    }

    async fn delete(&self, id: &StorageId) -> Result<(), BlobStoreError> {
        let mut map = self.inner.lock().map_err(|err| BlobStoreError::Storage {
            reason: format!("lock poisoned: {err}"),
        })?;
        map.remove(id.as_str());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete_round_trip() {
        let store = InMemoryBlobStore::new();
        let id = StorageId::new("blob-1");

        store.put(&id, b"ciphertext").await.expect("put");
        assert_eq!(store.get(&id).await.expect("get"), b"ciphertext");
        assert_eq!(store.blob_count(), 1);

        store.delete(&id).await.expect("delete");
        store.delete(&id).await.expect("delete again");
        let err = store.get(&id).await.expect_err("gone");
        assert!(matches!(err, BlobStoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn put_overwrites_per_id() {
        let store = InMemoryBlobStore::new();
        let id = StorageId::new("blob-1");

        store.put(&id, b"first").await.expect("put");
        store.put(&id, b"second").await.expect("put again");
        assert_eq!(store.get(&id).await.expect("get"), b"second");
        assert_eq!(store.blob_count(), 1);
    }
}
