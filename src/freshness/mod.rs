//! Content fingerprints: blake3 hashes of script sources, keyed by path.

mod cache;
mod hash;

pub use cache::{FingerprintCache, FreshnessReport};
pub use hash::{ContentHash, hash_bytes, hash_path_set, hash_sources};
