//! Storage-id allocation.
//!
//! External names are caller-controlled and may contain anything, including
//! path separators and traversal sequences. Storage ids are what actually
//! touches the blob store, so they must be filesystem-safe and unique even
//! under concurrent allocation.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use coffer_core::StorageId;
use uuid::Uuid;

/// Cap on the encoded-name suffix. Uniqueness comes from the UUID prefix;
/// the suffix is a debugging aid and is never decoded.
const MAX_NAME_SUFFIX: usize = 48;

/// Allocate a fresh storage id for an external name.
///
/// The id is `<uuid-hex>_<base64(name)>`: 122 bits of entropy up front, a
/// truncated URL-safe rendering of the name behind it. The alphabet rules
/// out separators and `..` sequences, and the total length is bounded.
pub fn allocate(external_name: &str) -> StorageId {
    let tag = Uuid::new_v4().simple().to_string();
    let mut suffix = URL_SAFE_NO_PAD.encode(external_name.as_bytes());
    suffix.truncate(MAX_NAME_SUFFIX);
    if suffix.is_empty() {
        StorageId::new(tag)
    } else {
        StorageId::new(format!("{tag}_{suffix}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_per_allocation() {
        let first = allocate("report.txt");
        let second = allocate("report.txt");
        assert_ne!(first, second);
    }

    #[test]
    fn traversal_sequences_do_not_survive() {
        for name in ["../../etc/passwd", "..\\..\\boot.ini", "a/b/c", ".."] {
            let id = allocate(name);
            assert!(!id.as_str().contains('/'), "{id}");
            assert!(!id.as_str().contains('\\'), "{id}");
            assert!(!id.as_str().contains(".."), "{id}");
        }
    }

    #[test]
    fn length_is_bounded_for_long_names() {
        let id = allocate(&"x".repeat(4096));
        // 32 hex chars, separator, capped suffix.
        assert!(id.as_str().len() <= 32 + 1 + MAX_NAME_SUFFIX);
    }

    #[test]
    fn empty_name_still_yields_an_id() {
        let id = allocate("");
        assert_eq!(id.as_str().len(), 32);
    }
}
