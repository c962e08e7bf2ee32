use thiserror::Error;

/// Failures raised while sealing or opening a ciphertext blob.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    /// The blob is not a well-formed envelope (truncated, wrong version,
    /// undecodable fields). Raised before any decryption is attempted.
    #[error("malformed blob: {reason}")]
    MalformedBlob { reason: String },

    /// The authentication tag rejected the ciphertext/key pairing.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The plaintext could not be sealed (e.g. exceeds the AEAD limit).
    #[error("seal failed: {reason}")]
    SealFailed { reason: String },
}

/// Errors produced by vault operations. Every failure is returned to the
/// caller as a typed value; corrupted or undecryptable bytes never are.
#[derive(Debug, Error)]
pub enum VaultError {
    /// No entry is bound to the external name.
    #[error("no entry for name: {name}")]
    NotFound { name: String },

    /// The request was rejected before touching any state.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// The blob could not be decrypted (malformed envelope or tag failure).
    #[error(transparent)]
    Cipher(#[from] CipherError),

    /// The blob decrypted cleanly but its plaintext fingerprint no longer
    /// matches the one recorded at write time.
    #[error("integrity check failed for: {name}")]
    Integrity { name: String },

    /// Underlying blob or index storage failure. Not retried internally.
    #[error("storage unavailable: {reason}")]
    Storage { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_entry() {
        let err = VaultError::NotFound {
            name: "report.txt".into(),
        };
        assert_eq!(err.to_string(), "no entry for name: report.txt");

        let err = VaultError::Integrity {
            name: "report.txt".into(),
        };
        assert_eq!(err.to_string(), "integrity check failed for: report.txt");
    }

    #[test]
    fn cipher_errors_convert_transparently() {
        let err: VaultError = CipherError::AuthenticationFailed.into();
        assert_eq!(err.to_string(), "authentication failed");
        assert!(matches!(
            err,
            VaultError::Cipher(CipherError::AuthenticationFailed)
        ));
    }
}
