//! The vault orchestrator: external names in, plaintext out, with every
//! stored artifact sealed under its own key and verified on the way back.
//!
//! The vault composes four collaborators: the storage-id allocator and the
//! cipher/digest primitives from `coffer-crypto`, plus caller-supplied
//! [`BlobStore`](coffer_core::BlobStore) and
//! [`IndexStore`](coffer_core::IndexStore) implementations.

mod locks;
mod vault;

pub use vault::{Vault, VaultConfig};
