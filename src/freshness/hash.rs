//! Content hashing using blake3.
//!
//! Provides the digests used for script fingerprints and for deriving
//! stable unit names from a set of input paths.

use std::path::PathBuf;

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    #[inline]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to lower-case hex string.
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // First 16 hex chars are enough for log lines
        write!(f, "{}", &self.to_hex()[..16])
    }
}

/// Hash raw bytes.
#[inline]
pub fn hash_bytes(bytes: &[u8]) -> ContentHash {
    ContentHash::new(*blake3::hash(bytes).as_bytes())
}

/// Order-independent digest of a set of paths.
///
/// Paths are sorted and joined with `|` before hashing, so the same set
/// always yields the same digest regardless of discovery order.
pub fn hash_path_set(paths: &[PathBuf]) -> ContentHash {
    let mut sorted: Vec<_> = paths.iter().map(|p| p.to_string_lossy()).collect();
    sorted.sort();
    hash_bytes(sorted.join("|").as_bytes())
}

/// Digest of a whole source set: every `(path, content)` pair, order
/// independent. Recorded in artifacts so a cached unit is only reused for
/// the exact sources it was built from.
pub fn hash_sources<S: AsRef<str>>(sources: &[(PathBuf, S)]) -> ContentHash {
    let mut entries: Vec<_> = sources
        .iter()
        .map(|(path, text)| (path.to_string_lossy(), hash_bytes(text.as_ref().as_bytes())))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut hasher = blake3::Hasher::new();
    for (path, hash) in entries {
        hasher.update(path.as_bytes());
        hasher.update(&[0]);
        hasher.update(hash.as_bytes());
    }
    ContentHash::new(*hasher.finalize().as_bytes())
}
