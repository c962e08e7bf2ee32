//! Concrete collaborator implementations for the vault core: a filesystem
//! blob store with atomic writes, and index persistence sealed under a key
//! held by the OS keyring (or a test double).

pub mod fs_blob_store;
pub mod index_file;
pub mod key_provider;

pub use fs_blob_store::FsBlobStore;
pub use index_file::EncryptedIndexFile;
pub use key_provider::{InMemoryKeyProvider, KeyProvider, KeyringProvider};
