use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use coffer_core::{KeyMaterial, KEY_LEN};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("keyring error: {0}")]
    Keyring(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("generation error: {0}")]
    Generation(String),
}

/// Custody of the key that seals the index at rest (OS keychain in
/// production, memory in tests). Per-entry payload keys never pass through
/// here; those live inside the index itself.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    async fn get_or_create(&self) -> Result<KeyMaterial, KeyError>;
}

/// OS keyring-backed provider. Uses the `keyring` crate to store the key.
pub struct KeyringProvider {
    service: String,
    account: String,
}

impl KeyringProvider {
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
        }
    }
}

#[async_trait]
impl KeyProvider for KeyringProvider {
    async fn get_or_create(&self) -> Result<KeyMaterial, KeyError> {
        // Keyring operations are synchronous; wrap in async for trait compatibility.
        let entry = keyring::Entry::new(&self.service, &self.account)
            .map_err(|e| KeyError::Keyring(e.to_string()))?;

        if let Ok(secret) = entry.get_password() {
            return decode_key(&secret);
        }

        let key = coffer_crypto::generate_key();
        entry
            .set_password(&encode_key(&key))
            .map_err(|e| KeyError::Keyring(e.to_string()))?;
        Ok(key)
    }
}

/// In-memory key provider for tests and ephemeral vaults. Clones share the
/// same key, so a "reopened" vault in a test sees the same custody key.
#[derive(Debug, Default, Clone)]
pub struct InMemoryKeyProvider {
    inner: Arc<Mutex<Option<KeyMaterial>>>,
}

#[async_trait]
impl KeyProvider for InMemoryKeyProvider {
    async fn get_or_create(&self) -> Result<KeyMaterial, KeyError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|err| KeyError::Generation(format!("lock poisoned: {err}")))?;

        if let Some(existing) = guard.clone() {
            return Ok(existing);
        }

        let key = coffer_crypto::generate_key();
        *guard = Some(key.clone());
        Ok(key)
    }
}

fn encode_key(key: &KeyMaterial) -> String {
    STANDARD.encode(key.as_bytes())
}

fn decode_key(secret: &str) -> Result<KeyMaterial, KeyError> {
    let bytes = STANDARD
        .decode(secret)
        .map_err(|e| KeyError::Decode(e.to_string()))?;

    let bytes: [u8; KEY_LEN] = bytes
        .try_into()
        .map_err(|rest: Vec<u8>| KeyError::Decode(format!("expected {KEY_LEN} bytes, got {}", rest.len())))?;
    Ok(KeyMaterial::from_bytes(bytes))
}
