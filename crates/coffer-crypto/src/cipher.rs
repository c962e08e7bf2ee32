//! AES-256-GCM sealing of vault payloads.
//!
//! A sealed blob is a self-contained JSON envelope: the nonce rides along
//! with the ciphertext, so opening needs nothing but the blob and the key.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use coffer_core::{CipherError, KeyMaterial, KEY_LEN};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

/// Envelope format version. Bump when the layout changes.
const ENVELOPE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SealedBlob {
    v: u32,
    nonce: String,
    ciphertext: String,
}

/// Generate a fresh 256-bit key from the operating system CSPRNG.
pub fn generate_key() -> KeyMaterial {
    let mut bytes = [0u8; KEY_LEN];
    OsRng.fill_bytes(&mut bytes);
    KeyMaterial::from_bytes(bytes)
}

/// Seal a payload under a key with a fresh random nonce.
///
/// Two seals of the same plaintext under the same key never produce the
/// same blob.
pub fn seal(plaintext: &[u8], key: &KeyMaterial) -> Result<Vec<u8>, CipherError> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| CipherError::SealFailed {
            reason: format!("encrypt: {e}"),
        })?;

    let envelope = SealedBlob {
        v: ENVELOPE_VERSION,
        nonce: URL_SAFE_NO_PAD.encode(nonce.as_slice()),
        ciphertext: URL_SAFE_NO_PAD.encode(ciphertext),
    };
    serde_json::to_vec(&envelope).map_err(|e| CipherError::SealFailed {
        reason: format!("envelope encode: {e}"),
    })
}

/// Open a sealed blob.
///
/// Envelope problems surface as [`CipherError::MalformedBlob`] before any
/// decryption is attempted; a rejected GCM tag surfaces as
/// [`CipherError::AuthenticationFailed`].
pub fn open(blob: &[u8], key: &KeyMaterial) -> Result<Vec<u8>, CipherError> {
    let envelope: SealedBlob =
        serde_json::from_slice(blob).map_err(|e| CipherError::MalformedBlob {
            reason: format!("envelope parse: {e}"),
        })?;
    if envelope.v != ENVELOPE_VERSION {
        return Err(CipherError::MalformedBlob {
            reason: format!("unsupported envelope version {}", envelope.v),
        });
    }

    let nonce_bytes =
        URL_SAFE_NO_PAD
            .decode(&envelope.nonce)
            .map_err(|e| CipherError::MalformedBlob {
                reason: format!("nonce decode: {e}"),
            })?;
    if nonce_bytes.len() != NONCE_LEN {
        return Err(CipherError::MalformedBlob {
            reason: format!("nonce is {} bytes, expected {NONCE_LEN}", nonce_bytes.len()),
        });
    }
    let ciphertext =
        URL_SAFE_NO_PAD
            .decode(&envelope.ciphertext)
            .map_err(|e| CipherError::MalformedBlob {
                reason: format!("ciphertext decode: {e}"),
            })?;

    let cipher = Aes256Gcm::new(key.as_bytes().into());
    cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
        .map_err(|_| CipherError::AuthenticationFailed)
}
