use std::path::PathBuf;

use coffer_store::{EncryptedIndexFile, FsBlobStore, KeyringProvider};
use coffer_vault::{Vault, VaultConfig};
use color_eyre::Result;
use dirs::data_dir;
use tracing::debug;

use crate::config::Config;

/// The concrete vault type the CLI operates: filesystem blobs plus an
/// index sealed under a key held in the OS keychain.
pub type CliVault = Vault<FsBlobStore, EncryptedIndexFile<KeyringProvider>>;

const KEYRING_SERVICE: &str = "coffer";
const KEYRING_ACCOUNT: &str = "index-key";

/// Resolve the default data directory for Coffer.
pub fn default_data_dir() -> Result<PathBuf> {
    let base = data_dir().ok_or_else(|| color_eyre::eyre::eyre!("no data dir available"))?;
    Ok(base.join("coffer"))
}

/// Open the production vault, honoring config overrides.
pub async fn open_vault(config: &Config) -> Result<CliVault> {
    let root = match &config.data_dir {
        Some(dir) => dir.clone(),
        None => default_data_dir()?,
    };
    debug!(?root, "opening vault");

    let blobs = FsBlobStore::new(root.join("blobs"));
    let index = EncryptedIndexFile::new(
        root.join("index.sealed"),
        KeyringProvider::new(KEYRING_SERVICE, KEYRING_ACCOUNT),
    );
    let vault = Vault::open(blobs, index, vault_config(config)).await?;
    Ok(vault)
}

fn vault_config(config: &Config) -> VaultConfig {
    VaultConfig {
        max_payload_bytes: config.max_payload_bytes,
    }
}

/// Helper for tests: a filesystem-backed vault rooted at a temp dir with an
/// in-memory custody key.
#[cfg(test)]
pub async fn test_vault(
    root: &std::path::Path,
) -> Result<Vault<FsBlobStore, EncryptedIndexFile<coffer_store::InMemoryKeyProvider>>> {
    let blobs = FsBlobStore::new(root.join("blobs"));
    let index = EncryptedIndexFile::new(
        root.join("index.sealed"),
        coffer_store::InMemoryKeyProvider::default(),
    );
    Ok(Vault::open(blobs, index, VaultConfig::default()).await?)
}
