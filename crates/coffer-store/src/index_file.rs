use std::{
    fs,
    io::Write,
    path::PathBuf,
};

use async_trait::async_trait;
use coffer_core::{IndexSnapshot, IndexStore, IndexStoreError, KeyMaterial};
use tempfile::NamedTempFile;
use tracing::instrument;

use crate::key_provider::KeyProvider;

/// Index persistence as a single file sealed under the provider's custody
/// key, using the same envelope as payload blobs. The index carries every
/// per-entry key, so it never touches disk in the clear.
pub struct EncryptedIndexFile<P: KeyProvider> {
    path: PathBuf,
    provider: P,
}

impl<P: KeyProvider> EncryptedIndexFile<P> {
    pub fn new(path: impl Into<PathBuf>, provider: P) -> Self {
        Self {
            path: path.into(),
            provider,
        }
    }

    async fn custody_key(&self) -> Result<KeyMaterial, IndexStoreError> {
        self.provider
            .get_or_create()
            .await
            .map_err(|e| IndexStoreError::Storage {
                reason: format!("key custody: {e}"),
            })
    }
}

#[async_trait]
impl<P: KeyProvider> IndexStore for EncryptedIndexFile<P> {
    #[instrument(skip_all)]
    async fn load(&self) -> Result<Option<IndexSnapshot>, IndexStoreError> {
        let sealed = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(IndexStoreError::Storage {
                    reason: err.to_string(),
                })
            }
        };

        let key = self.custody_key().await?;
        let plaintext =
            coffer_crypto::open(&sealed, &key).map_err(|e| IndexStoreError::Corrupt {
                reason: e.to_string(),
            })?;
        let snapshot =
            serde_json::from_slice(&plaintext).map_err(|e| IndexStoreError::Corrupt {
                reason: format!("snapshot parse: {e}"),
            })?;
        Ok(Some(snapshot))
    }

    #[instrument(skip_all)]
    async fn save(&self, snapshot: &IndexSnapshot) -> Result<(), IndexStoreError> {
        let key = self.custody_key().await?;
        let plaintext = serde_json::to_vec(snapshot).map_err(|e| IndexStoreError::Storage {
            reason: format!("snapshot encode: {e}"),
        })?;
        let sealed = coffer_crypto::seal(&plaintext, &key).map_err(|e| IndexStoreError::Storage {
            reason: format!("snapshot seal: {e}"),
        })?;

        let parent = self.path.parent().ok_or_else(|| IndexStoreError::Storage {
            reason: "index path has no parent directory".to_string(),
        })?;
        fs::create_dir_all(parent).map_err(|e| IndexStoreError::Storage {
            reason: e.to_string(),
        })?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| IndexStoreError::Storage {
            reason: e.to_string(),
        })?;
        tmp.write_all(&sealed)
            .and_then(|()| tmp.flush())
            .map_err(|e| IndexStoreError::Storage {
                reason: e.to_string(),
            })?;
        tmp.persist(&self.path)
            .map_err(|e| IndexStoreError::Storage {
                reason: e.error.to_string(),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use coffer_core::{Fingerprint, KeyMaterial, StorageId, VaultEntry, FINGERPRINT_LEN, KEY_LEN};

    use super::*;
    use crate::key_provider::InMemoryKeyProvider;

    fn snapshot_with_one_entry() -> IndexSnapshot {
        let mut snapshot = IndexSnapshot::new();
        snapshot.bind(VaultEntry::new(
            StorageId::new("id-1"),
            "report.txt",
            KeyMaterial::from_bytes([7; KEY_LEN]),
            Fingerprint::from_bytes([7; FINGERPRINT_LEN]),
            Utc::now(),
        ));
        snapshot
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = EncryptedIndexFile::new(dir.path().join("index.sealed"), InMemoryKeyProvider::default());

        store.save(&snapshot_with_one_entry()).await.expect("save");
        let restored = store.load().await.expect("load").expect("snapshot present");
        assert!(restored.contains("report.txt"));
        assert_eq!(
            restored.resolve("report.txt").unwrap().key,
            KeyMaterial::from_bytes([7; KEY_LEN])
        );
    }

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = EncryptedIndexFile::new(dir.path().join("index.sealed"), InMemoryKeyProvider::default());
        assert!(store.load().await.expect("load").is_none());
    }

    #[tokio::test]
    async fn index_file_is_not_plaintext() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("index.sealed");
        let store = EncryptedIndexFile::new(&path, InMemoryKeyProvider::default());

        store.save(&snapshot_with_one_entry()).await.expect("save");
        let on_disk = fs::read(&path).expect("read index file");
        let rendered = String::from_utf8_lossy(&on_disk);
        assert!(!rendered.contains("report.txt"), "names must not be visible at rest");
    }

    #[tokio::test]
    async fn tampered_index_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("index.sealed");
        let store = EncryptedIndexFile::new(&path, InMemoryKeyProvider::default());

        store.save(&snapshot_with_one_entry()).await.expect("save");
        let mut on_disk = fs::read(&path).expect("read");
        let mid = on_disk.len() / 2;
        on_disk[mid] ^= 0x01;
        fs::write(&path, &on_disk).expect("write tampered");

        let err = store.load().await.expect_err("tampered index must not load");
        assert!(matches!(err, IndexStoreError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn wrong_custody_key_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("index.sealed");

        let writer = EncryptedIndexFile::new(&path, InMemoryKeyProvider::default());
        writer.save(&snapshot_with_one_entry()).await.expect("save");

        // A fresh provider generates a different custody key.
        let reader = EncryptedIndexFile::new(&path, InMemoryKeyProvider::default());
        let err = reader.load().await.expect_err("wrong key must not load");
        assert!(matches!(err, IndexStoreError::Corrupt { .. }));
    }
}
