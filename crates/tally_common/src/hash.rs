//! Payload checksums for snapshot integrity checks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// XXH3-128 digest of a persisted payload.
///
/// Snapshot headers record the digest of their payload so that a truncated
/// or partially written file is rejected on load instead of being decoded
/// into a partial index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(u128);

impl ContentHash {
    /// Digests `payload`.
    pub fn of(payload: &[u8]) -> Self {
        Self(xxhash_rust::xxh3::xxh3_128(payload))
    }

    /// Rehashes `payload` and compares it against this digest.
    ///
    /// On mismatch, returns the digest `payload` actually has.
    pub fn check(self, payload: &[u8]) -> Result<(), ContentHash> {
        let actual = Self::of(payload);
        if actual == self {
            Ok(())
        } else {
            Err(actual)
        }
    }

    /// The raw 128-bit digest.
    pub fn as_u128(self) -> u128 {
        self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:08x}..)", self.0 >> 96)
    }
}
