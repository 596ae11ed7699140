//! Content hashing for store addressing and render fingerprints.
//!
//! Both uses share one digest: hex-encoded SHA-256.
//! - Store records are addressed by the hash of the entity's qualified name.
//! - Fingerprints are the hash of the entity's canonical JSON encoding, so any
//!   observable change to an entity changes its fingerprint.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 hash, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Compute SHA-256 hash of the given bytes, returning hex-encoded string.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let result = hasher.finalize();
        ContentHash(hex::encode(result))
    }

    /// Hash of the JSON encoding of `value`.
    ///
    /// Struct fields serialize in declaration order and ordered maps keep
    /// insertion order, so equal values always produce equal hashes.
    pub fn of_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Self> {
        let bytes = serde_json::to_vec(value)?;
        Ok(ContentHash::compute(&bytes))
    }

    /// Create from an existing hex string without validation.
    ///
    /// Use only when the input is known to be valid (e.g., read back from a
    /// snapshot this crate wrote, or in tests).
    pub fn from_hex_unchecked(hex: &str) -> Self {
        ContentHash(hex.to_string())
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(12);
        &self.0[..end]
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
