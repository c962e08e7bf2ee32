use std::{
    fs::{self, File},
    io::{Read, Write},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use coffer_core::{BlobStore, BlobStoreError, StorageId};
use tempfile::NamedTempFile;
use tracing::instrument;

/// One file per storage id under a root directory. Writes land in a named
/// tempfile in the same directory and are persisted atomically, so a blob
/// is either absent or complete; readers never see a partial write.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Ids come from the allocator and are filesystem-safe by construction.
    /// Anything else is refused rather than joined into a path.
    fn checked_path(&self, id: &StorageId) -> Result<PathBuf, BlobStoreError> {
        let raw = id.as_str();
        if raw.is_empty() || raw.contains(['/', '\\']) || raw.contains("..") {
            return Err(BlobStoreError::Storage {
                reason: format!("storage id is not filesystem-safe: {raw}"),
            });
        }
        Ok(self.root.join(raw))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    #[instrument(skip_all, fields(id = %id))]
    async fn put(&self, id: &StorageId, bytes: &[u8]) -> Result<(), BlobStoreError> {
        let path = self.checked_path(id)?;
        write_atomic(&self.root, &path, bytes)
    }

    #[instrument(skip_all, fields(id = %id))]
    async fn get(&self, id: &StorageId) -> Result<Vec<u8>, BlobStoreError> {
        let path = self.checked_path(id)?;
        let mut file = File::open(&path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                BlobStoreError::NotFound {
                    id: id.as_str().to_string(),
                }
            } else {
                storage_err(err)
            }
        })?;

        let mut buf = Vec::new();
        file.read_to_end(&mut buf).map_err(storage_err)?;
        Ok(buf)
    }

    #[instrument(skip_all, fields(id = %id))]
    async fn delete(&self, id: &StorageId) -> Result<(), BlobStoreError> {
        let path = self.checked_path(id)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(storage_err(err)),
        }
    }
}

fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), BlobStoreError> {
    fs::create_dir_all(dir).map_err(storage_err)?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(storage_err)?;
    tmp.write_all(bytes).map_err(storage_err)?;
    tmp.flush().map_err(storage_err)?;
    tmp.persist(path).map_err(|e| storage_err(e.error))?;
    Ok(())
}

fn storage_err<E: ToString>(err: E) -> BlobStoreError {
    BlobStoreError::Storage {
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_bytes_on_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsBlobStore::new(dir.path());
        let id = StorageId::new("blob-1");

        store.put(&id, b"sealed bytes").await.expect("put");
        assert_eq!(store.get(&id).await.expect("get"), b"sealed bytes");
    }

    #[tokio::test]
    async fn overwrite_is_last_writer_wins() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsBlobStore::new(dir.path());
        let id = StorageId::new("blob-1");

        store.put(&id, b"first").await.expect("put");
        store.put(&id, b"second").await.expect("put again");
        assert_eq!(store.get(&id).await.expect("get"), b"second");
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsBlobStore::new(dir.path());
        let id = StorageId::new("blob-1");

        store.put(&id, b"bytes").await.expect("put");
        store.delete(&id).await.expect("delete");
        store.delete(&id).await.expect("delete again");

        let err = store.get(&id).await.expect_err("should be missing");
        assert!(matches!(err, BlobStoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn unsafe_ids_are_refused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsBlobStore::new(dir.path());

        for raw in ["../escape", "a/b", "a\\b", ""] {
            let err = store
                .put(&StorageId::new(raw), b"bytes")
                .await
                .expect_err("unsafe id");
            assert!(matches!(err, BlobStoreError::Storage { .. }), "{raw}");
        }
    }
}
