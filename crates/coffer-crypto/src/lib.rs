//! Pure cryptographic operations for Coffer: authenticated encryption at
//! rest, plaintext fingerprinting, and storage-id allocation.
//!
//! All functions work exclusively on in-memory buffers; no I/O happens here.

pub mod cipher;
pub mod digest;
pub mod names;

pub use cipher::{generate_key, open, seal};
pub use digest::fingerprint;
pub use names::allocate;
