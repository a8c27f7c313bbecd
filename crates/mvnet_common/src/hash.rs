//! Content hashing for structural network signatures.

use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::Xxh3;

/// A 128-bit XXH3 digest of a network's structure.
///
/// Equal signatures mean equal names, kinds, value counts and fanin lists.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// The digest as little-endian bytes.
    pub fn to_bytes(self) -> [u8; 16] {
        self.0
    }

    fn value(self) -> u128 {
        u128::from_le_bytes(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.value())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:08x}..)", self.value() >> 96)
    }
}

/// Incremental builder for a [`ContentHash`].
///
/// Strings are length-prefixed, so `("ab", "c")` and `("a", "bc")` give
/// different digests.
pub struct ContentHasher {
    state: Xxh3,
}

impl ContentHasher {
    /// Creates an empty hasher.
    pub fn new() -> Self {
        Self { state: Xxh3::new() }
    }

    /// Feeds a string field.
    pub fn write_str(&mut self, s: &str) {
        self.write_u64(s.len() as u64);
        self.state.update(s.as_bytes());
    }

    /// Feeds an integer field.
    pub fn write_u64(&mut self, v: u64) {
        self.state.update(&v.to_le_bytes());
    }

    /// The digest of everything fed so far.
    pub fn finish(&self) -> ContentHash {
        ContentHash(self.state.digest128().to_le_bytes())
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}
