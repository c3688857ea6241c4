//! Cache-key derivation for vCenter poll targets

use crate::config::target::VCenterTarget;
use sha2::{Digest, Sha256};
use std::fmt;

/// Stable cache key identifying a poll target.
///
/// Derived from the server address and credentials, so rotating a password
/// or repointing at another server yields a different key and previously
/// cached results become unreachable. The fingerprint is a full SHA-256
/// digest in lowercase hex; the inputs cannot be recovered from it, which
/// makes it safe to embed in log lines and cache-store keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// The hex digest as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the cache key for a poll target.
///
/// Every identity field is length-prefixed before hashing, so shifting
/// characters between adjacent fields cannot produce colliding keys.
pub fn fingerprint(target: &VCenterTarget) -> Fingerprint {
    let mut hasher = Sha256::new();
    for field in [&target.server, &target.username, &target.password] {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    Fingerprint(hex::encode(hasher.finalize()))
}
