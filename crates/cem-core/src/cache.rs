//! A parsed-manifest cache validated against filesystem modification time.
//!
//! Where a registry-fetching LSP validates cached HTTP responses against
//! `ETag`/`Last-Modified` headers, the Manifest Registry validates cached
//! *parsed* manifests against the source file's `mtime` and byte length.
//! This bounds the cost of the 50ms watcher debounce firing repeatedly on
//! directory churn that doesn't actually touch a manifest's bytes.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use crate::manifest::Manifest;

/// Maximum number of cached entries, bounding memory growth across large
/// `node_modules` trees. Eviction is least-recently-used.
const MAX_CACHE_ENTRIES: usize = 1000;

/// Validation stamp recorded alongside a cached parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stamp {
    modified: SystemTime,
    len: u64,
}

struct Entry {
    stamp: Stamp,
    manifest: std::sync::Arc<Manifest>,
}

/// An LRU cache mapping canonical manifest paths to their last successful
/// parse, validated by mtime and length.
pub struct ManifestCache {
    entries: Mutex<lru::LruCache<PathBuf, Entry>>,
}

impl ManifestCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(lru::LruCache::new(
                std::num::NonZeroUsize::new(MAX_CACHE_ENTRIES).unwrap(),
            )),
        }
    }

    /// Returns the cached manifest for `path` if its stamp still matches
    /// `metadata`, promoting the entry to most-recently-used.
    pub fn get_if_fresh(
        &self,
        path: &Path,
        metadata: &std::fs::Metadata,
    ) -> Option<std::sync::Arc<Manifest>> {
        let stamp = Stamp {
            modified: metadata.modified().ok()?,
            len: metadata.len(),
        };
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.get(path)?;
        if entry.stamp == stamp {
            Some(std::sync::Arc::clone(&entry.manifest))
        } else {
            None
        }
    }

    /// Inserts (or replaces) the cached parse for `path`.
    pub fn insert(&self, path: PathBuf, metadata: &std::fs::Metadata, manifest: Manifest) {
        let Ok(modified) = metadata.modified() else {
            return;
        };
        let stamp = Stamp {
            modified,
            len: metadata.len(),
        };
        let mut entries = self.entries.lock().unwrap();
        entries.put(
            path,
            Entry {
                stamp,
                manifest: std::sync::Arc::new(manifest),
            },
        );
    }

    /// Drops any cached entry for `path`; called when the file watcher
    /// reports a change or delete.
    pub fn invalidate(&self, path: &Path) {
        self.entries.lock().unwrap().pop(path);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ManifestCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_manifest(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_cache_starts_empty() {
        let cache = ManifestCache::new();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_and_get_if_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(&dir, "custom-elements.json", r#"{"modules":[]}"#);
        let metadata = std::fs::metadata(&path).unwrap();
        let cache = ManifestCache::new();

        assert!(cache.get_if_fresh(&path, &metadata).is_none());
        cache.insert(path.clone(), &metadata, Manifest { modules: vec![] });
        assert!(cache.get_if_fresh(&path, &metadata).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_stale_after_size_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(&dir, "custom-elements.json", r#"{"modules":[]}"#);
        let metadata = std::fs::metadata(&path).unwrap();
        let cache = ManifestCache::new();
        cache.insert(path.clone(), &metadata, Manifest { modules: vec![] });

        // Rewrite with different length; the stamp no longer matches.
        write_manifest(&dir, "custom-elements.json", r#"{"modules":[],"extra":1}"#);
        let new_metadata = std::fs::metadata(&path).unwrap();
        assert!(cache.get_if_fresh(&path, &new_metadata).is_none());
    }

    #[test]
    fn test_invalidate_removes_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(&dir, "custom-elements.json", r#"{"modules":[]}"#);
        let metadata = std::fs::metadata(&path).unwrap();
        let cache = ManifestCache::new();
        cache.insert(path.clone(), &metadata, Manifest { modules: vec![] });
        cache.invalidate(&path);
        assert!(cache.is_empty());
    }
}
