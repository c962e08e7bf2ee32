use chrono::Utc;
use coffer_core::{
    BlobStore, BlobStoreError, IndexSnapshot, IndexStore, IndexStoreError, InMemoryBlobStore,
    NullIndexStore, VaultEntry, VaultError,
};
use coffer_crypto::{allocate, fingerprint, generate_key, open, seal};
use tokio::sync::RwLock;
use tracing::{instrument, warn};

use crate::locks::NameLocks;

/// Operating limits for a vault.
#[derive(Debug, Clone, Default)]
pub struct VaultConfig {
    /// Reject payloads larger than this many bytes. `None` means unbounded.
    pub max_payload_bytes: Option<usize>,
}

/// Encrypted file vault over caller-supplied blob and index persistence.
///
/// Every stored file gets its own freshly generated key and a plaintext
/// fingerprint recorded at write time; reads decrypt, re-fingerprint, and
/// fail closed on any mismatch.
pub struct Vault<B: BlobStore, I: IndexStore> {
    blobs: B,
    index_store: I,
    state: RwLock<IndexSnapshot>,
    locks: NameLocks,
    config: VaultConfig,
}

impl Vault<InMemoryBlobStore, NullIndexStore> {
    /// Fully in-memory vault; blobs and index live and die with the process.
    pub fn ephemeral() -> Self {
        Self::with_state(
            InMemoryBlobStore::new(),
            NullIndexStore,
            IndexSnapshot::new(),
            VaultConfig::default(),
        )
    }
}

impl<B: BlobStore, I: IndexStore> Vault<B, I> {
    /// Open a vault over its collaborators, restoring any persisted index.
    pub async fn open(blobs: B, index_store: I, config: VaultConfig) -> Result<Self, VaultError> {
        let snapshot = index_store
            .load()
            .await
            .map_err(index_err)?
            .unwrap_or_default();
        Ok(Self::with_state(blobs, index_store, snapshot, config))
    }

    fn with_state(blobs: B, index_store: I, snapshot: IndexSnapshot, config: VaultConfig) -> Self {
        Self {
            blobs,
            index_store,
            state: RwLock::new(snapshot),
            locks: NameLocks::default(),
            config,
        }
    }

    /// Store a payload under an external name. A name that is already bound
    /// is replaced: the new entry supersedes it and the displaced blob is
    /// reclaimed rather than left to leak.
    #[instrument(skip(self, payload), fields(bytes = payload.len()))]
    pub async fn put(&self, name: &str, payload: &[u8]) -> Result<(), VaultError> {
        self.check_put_input(name, payload)?;
        let lock = self.locks.for_name(name)?;
        let _guard = lock.write().await;

        let storage_id = allocate(name);
        let key = generate_key();
        let print = fingerprint(payload);
        let blob = seal(payload, &key)?;
        self.blobs.put(&storage_id, &blob).await.map_err(blob_err)?;

        let entry = VaultEntry::new(storage_id.clone(), name, key, print, Utc::now());
        let displaced = match self.commit(|index| index.bind(entry)).await {
            Ok(displaced) => displaced,
            Err(err) => {
                // The index never saw this blob; drop it again.
                if let Err(cleanup) = self.blobs.delete(&storage_id).await {
                    warn!(%storage_id, %cleanup, "failed to remove blob after aborted put");
                }
                return Err(err);
            }
        };

        if let Some(old) = displaced {
            if let Err(err) = self.blobs.delete(&old.storage_id).await {
                warn!(storage_id = %old.storage_id, %err, "failed to reclaim replaced blob");
            }
        }
        Ok(())
    }

    /// Fetch and verify the payload stored under an external name.
    #[instrument(skip(self))]
    pub async fn get(&self, name: &str) -> Result<Vec<u8>, VaultError> {
        let lock = self.locks.for_name(name)?;
        let _guard = lock.read().await;

        let entry = {
            let state = self.state.read().await;
            state.resolve(name).cloned()
        }
        .ok_or_else(|| VaultError::NotFound {
            name: name.to_string(),
        })?;

        let blob = self.blobs.get(&entry.storage_id).await.map_err(blob_err)?;
        let plaintext = open(&blob, &entry.key)?;

        // Fail closed: a mismatched fingerprint means the payload is suspect
        // and must not leave the vault.
        if fingerprint(&plaintext) != entry.fingerprint {
            return Err(VaultError::Integrity {
                name: name.to_string(),
            });
        }
        Ok(plaintext)
    }

    /// Re-encrypt an existing entry with a brand-new key, keeping its
    /// storage id and name binding. Fails `NotFound` for unbound names.
    #[instrument(skip(self, payload), fields(bytes = payload.len()))]
    pub async fn replace(&self, name: &str, payload: &[u8]) -> Result<(), VaultError> {
        self.check_put_input(name, payload)?;
        let lock = self.locks.for_name(name)?;
        let _guard = lock.write().await;

        let existing = {
            let state = self.state.read().await;
            state.resolve(name).cloned()
        }
        .ok_or_else(|| VaultError::NotFound {
            name: name.to_string(),
        })?;

        // Keys are never reused across writes.
        let key = generate_key();
        let print = fingerprint(payload);
        let blob = seal(payload, &key)?;
        self.blobs
            .put(&existing.storage_id, &blob)
            .await
            .map_err(blob_err)?;

        // If persistence fails past this point the index still holds the old
        // key: the entry reads as a cipher failure, never as torn plaintext.
        self.commit(|index| {
            index.rekey(name, key, print, Utc::now());
        })
        .await?;
        Ok(())
    }

    /// Remove an entry: blob, index record, and name binding together.
    #[instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> Result<(), VaultError> {
        let lock = self.locks.for_name(name)?;
        let _guard = lock.write().await;

        {
            let state = self.state.read().await;
            if !state.contains(name) {
                return Err(VaultError::NotFound {
                    name: name.to_string(),
                });
            }
        }

        let removed = self.commit(|index| index.unbind(name)).await?;
        if let Some(entry) = removed {
            if let Err(err) = self.blobs.delete(&entry.storage_id).await {
                warn!(storage_id = %entry.storage_id, %err, "failed to remove blob for deleted entry");
            }
        }
        Ok(())
    }

    /// Current external names from one consistent snapshot. No ordering
    /// guarantee.
    pub async fn list(&self) -> Vec<String> {
        let state = self.state.read().await;
        state.names().map(str::to_string).collect()
    }

    fn check_put_input(&self, name: &str, payload: &[u8]) -> Result<(), VaultError> {
        if name.is_empty() {
            return Err(VaultError::InvalidInput {
                reason: "name must not be empty".to_string(),
            });
        }
        if let Some(limit) = self.config.max_payload_bytes {
            if payload.len() > limit {
                return Err(VaultError::InvalidInput {
                    reason: format!("payload is {} bytes, limit is {limit}", payload.len()),
                });
            }
        }
        Ok(())
    }

    /// Apply a mutation to a copy of the index, persist the copy, then swap
    /// it in. A persistence failure leaves the in-memory index untouched.
    async fn commit<T>(
        &self,
        mutate: impl FnOnce(&mut IndexSnapshot) -> T,
    ) -> Result<T, VaultError> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let out = mutate(&mut next);
        self.index_store.save(&next).await.map_err(index_err)?;
        *state = next;
        Ok(out)
    }
}

fn index_err(err: IndexStoreError) -> VaultError {
    VaultError::Storage {
        reason: err.to_string(),
    }
}

fn blob_err(err: BlobStoreError) -> VaultError {
    match err {
        // A live index entry whose blob is gone is a storage-level breach of
        // the entry/blob invariant, not a missing name.
        BlobStoreError::NotFound { id } => VaultError::Storage {
            reason: format!("blob missing for live entry: {id}"),
        },
        BlobStoreError::Storage { reason } => VaultError::Storage { reason },
    }
}
