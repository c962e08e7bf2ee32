use std::{collections::HashMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Symmetric key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// Fingerprint length in bytes (SHA-256).
pub const FINGERPRINT_LEN: usize = 32;

/// 256-bit symmetric key owned by exactly one vault entry.
///
/// The raw bytes are reachable only through [`KeyMaterial::as_bytes`]; they
/// never appear in `Debug` output, logs, or errors.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMaterial([u8; KEY_LEN]);

impl KeyMaterial {
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyMaterial(..)")
    }
}

/// Fixed-width digest of plaintext, compared on every read to detect
/// corruption independent of the cipher's own tag.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    pub const fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}

/// Opaque token naming a stored blob, decoupled from the user-visible name.
/// Allocated once per logical file and stable across rewrites of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageId(String);

impl StorageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the vault needs to open one stored file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultEntry {
    pub storage_id: StorageId,
    pub key: KeyMaterial,
    pub fingerprint: Fingerprint,
    pub external_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VaultEntry {
    pub fn new(
        storage_id: StorageId,
        external_name: impl Into<String>,
        key: KeyMaterial,
        fingerprint: Fingerprint,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            storage_id,
            key,
            fingerprint,
            external_name: external_name.into(),
            created_at: at,
            updated_at: at,
        }
    }
}

/// Whole-index state: entry per storage id plus the external-name binding.
/// One active storage id per external name; no version history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexSnapshot {
    entries: HashMap<StorageId, VaultEntry>,
    names: HashMap<String, StorageId>,
}

impl IndexSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the entry currently bound to an external name.
    pub fn resolve(&self, name: &str) -> Option<&VaultEntry> {
        self.entries.get(self.names.get(name)?)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Bind an entry under its external name. If the name was already bound,
    /// the displaced entry is returned so the caller can reclaim its blob.
    pub fn bind(&mut self, entry: VaultEntry) -> Option<VaultEntry> {
        let displaced = self
            .names
            .insert(entry.external_name.clone(), entry.storage_id.clone())
            .and_then(|old_id| self.entries.remove(&old_id));
        self.entries.insert(entry.storage_id.clone(), entry);
        displaced
    }

    /// Remove a name binding and its entry together.
    pub fn unbind(&mut self, name: &str) -> Option<VaultEntry> {
        let id = self.names.remove(name)?;
        self.entries.remove(&id)
    }

    /// Swap in fresh key material and fingerprint for an existing entry,
    /// leaving the storage id and name binding untouched.
    pub fn rekey(
        &mut self,
        name: &str,
        key: KeyMaterial,
        fingerprint: Fingerprint,
        at: DateTime<Utc>,
    ) -> Option<&VaultEntry> {
        let id = self.names.get(name)?;
        let entry = self.entries.get_mut(id)?;
        entry.key = key;
        entry.fingerprint = fingerprint;
        entry.updated_at = at;
        Some(entry)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
