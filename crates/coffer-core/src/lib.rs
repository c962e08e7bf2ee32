//! Core abstractions for Coffer: the vault data model, the error taxonomy,
//! and the collaborator contracts for blob and index persistence.
//! This crate is intentionally small to keep dependency surface minimal.

pub mod blob;
pub mod error;
pub mod index;
pub mod persist;

pub use blob::{BlobStore, BlobStoreError, InMemoryBlobStore};
pub use error::{CipherError, VaultError};
pub use index::{
    Fingerprint, IndexSnapshot, KeyMaterial, StorageId, VaultEntry, FINGERPRINT_LEN, KEY_LEN,
};
pub use persist::{IndexStore, IndexStoreError, NullIndexStore};
