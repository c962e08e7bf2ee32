//! Plaintext fingerprinting.

use coffer_core::Fingerprint;
use sha2::{Digest, Sha256};

/// SHA-256 fingerprint of a payload. Deterministic, defined for every
/// input including the empty one.
pub fn fingerprint(bytes: &[u8]) -> Fingerprint {
    Fingerprint::from_bytes(Sha256::digest(bytes).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_for_equal_input() {
        assert_eq!(fingerprint(b"hello"), fingerprint(b"hello"));
    }

    #[test]
    fn distinct_inputs_diverge() {
        assert_ne!(fingerprint(b"hello"), fingerprint(b"hellp"));
    }

    #[test]
    fn empty_input_matches_known_vector() {
        // SHA-256 of the empty string.
        assert_eq!(
            fingerprint(b"").to_string(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
