//! Session-wide fingerprint cache for script sources.

use dashmap::DashMap;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use super::{ContentHash, hash_bytes};

/// Path -> last-seen content hash.
///
/// Entries are never evicted: a removed script leaves a harmless stale
/// entry behind. One cache lives for the whole editor session.
#[derive(Debug, Default)]
pub struct FingerprintCache {
    hashes: DashMap<PathBuf, ContentHash>,
}

/// Result of observing a set of sources.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FreshnessReport {
    /// Paths whose hash was unknown or differed from the stored one.
    pub changed: Vec<PathBuf>,
    /// Paths whose hash matched the stored one.
    pub unchanged: Vec<PathBuf>,
}

impl FreshnessReport {
    pub fn any_changed(&self) -> bool {
        !self.changed.is_empty()
    }
}

impl FingerprintCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<ContentHash> {
        self.hashes.get(path).map(|r| *r)
    }

    /// Record `content` for `path`, returning whether it changed.
    ///
    /// The stored hash is always overwritten, so reverting a file and
    /// re-applying identical content reads as unchanged the next time.
    pub fn observe(&self, path: &Path, content: &str) -> bool {
        let hash = hash_bytes(content.as_bytes());
        match self.hashes.insert(path.to_path_buf(), hash) {
            Some(previous) => previous != hash,
            None => true,
        }
    }

    /// Observe every source. Hashing runs in parallel; every entry is
    /// updated even after the first change is found.
    pub fn observe_all<S>(&self, sources: &[(PathBuf, S)]) -> FreshnessReport
    where
        S: AsRef<str> + Sync,
    {
        let flags: Vec<(PathBuf, bool)> = sources
            .par_iter()
            .map(|(path, content)| (path.clone(), self.observe(path, content.as_ref())))
            .collect();

        let mut report = FreshnessReport::default();
        for (path, changed) in flags {
            if changed {
                report.changed.push(path);
            } else {
                report.unchanged.push(path);
            }
        }
        report
    }

    /// Forget a path (used when a read fails mid-compile).
    pub fn invalidate(&self, path: &Path) {
        self.hashes.remove(path);
    }

    pub fn clear(&self) {
        self.hashes.clear();
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(items: &[(&str, &str)]) -> Vec<(PathBuf, String)> {
        items
            .iter()
            .map(|(p, c)| (PathBuf::from(p), c.to_string()))
            .collect()
    }

    #[test]
    fn test_first_observation_is_changed() {
        let cache = FingerprintCache::new();
        assert!(cache.observe(Path::new("/a.nes"), "component A {}"));
        assert!(!cache.observe(Path::new("/a.nes"), "component A {}"));
        assert!(cache.get(Path::new("/a.nes")).is_some());
    }

    #[test]
    fn test_observe_all_updates_every_entry() {
        let cache = FingerprintCache::new();
        let first = cache.observe_all(&sources(&[("/a.nes", "a"), ("/b.nes", "b")]));
        assert_eq!(first.changed.len(), 2);

        // Both change; both hashes must be refreshed, not just the first one
        let second = cache.observe_all(&sources(&[("/a.nes", "a2"), ("/b.nes", "b2")]));
        assert_eq!(second.changed.len(), 2);

        let third = cache.observe_all(&sources(&[("/a.nes", "a2"), ("/b.nes", "b2")]));
        assert!(!third.any_changed());
        assert_eq!(third.unchanged.len(), 2);
    }

    #[test]
    fn test_revert_and_reapply_reads_unchanged() {
        let cache = FingerprintCache::new();
        let path = Path::new("/a.nes");
        cache.observe(path, "v1");
        assert!(cache.observe(path, "v2"));
        assert!(cache.observe(path, "v1"));
        assert!(!cache.observe(path, "v1"));
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = FingerprintCache::new();
        cache.observe(Path::new("/a.nes"), "a");
        cache.observe(Path::new("/b.nes"), "b");
        assert_eq!(cache.len(), 2);

        cache.invalidate(Path::new("/a.nes"));
        assert!(cache.observe(Path::new("/a.nes"), "a"));

        cache.clear();
        assert!(cache.is_empty());
    }
}
