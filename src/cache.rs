//! Markup Cache for the Example Playground
//!
//! On-disk cache of rendered markup keyed by example path and the SHA-256 of
//! the snippet text. Used by the batch renderer so unchanged examples are not
//! re-evaluated between documentation builds.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub hash: String,
    pub markup: String,
}

#[derive(Debug, Clone)]
pub struct MarkupCache {
    cache_dir: PathBuf,
}

impl MarkupCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        let cache_dir = cache_dir.into();
        if !cache_dir.exists() {
            if let Err(err) = fs::create_dir_all(&cache_dir) {
                warn!(dir = %cache_dir.display(), error = %err, "cannot create markup cache");
            }
        }
        Self { cache_dir }
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    fn entry_path(&self, example_path: &str) -> PathBuf {
        let safe_name = example_path
            .replace('/', "_")
            .replace('\\', "_")
            .replace(':', "_");
        self.cache_dir.join(format!("{}.json", safe_name))
    }

    /// Cached markup for `example_path`, if its source is unchanged.
    pub fn get(&self, example_path: &str, source: &str) -> Option<String> {
        let entry_path = self.entry_path(example_path);
        let data = fs::read_to_string(&entry_path).ok()?;

        let entry: CacheEntry = match serde_json::from_str(&data) {
            Ok(entry) => entry,
            Err(err) => {
                debug!(path = %example_path, error = %err, "discarding corrupt cache entry");
                fs::remove_file(entry_path).ok();
                return None;
            }
        };

        (entry.hash == digest(source)).then_some(entry.markup)
    }

    pub fn set(&self, example_path: &str, source: &str, markup: &str) {
        let entry = CacheEntry {
            hash: digest(source),
            markup: markup.to_string(),
        };
        match serde_json::to_string(&entry) {
            Ok(data) => {
                if let Err(err) = fs::write(self.entry_path(example_path), data) {
                    warn!(path = %example_path, error = %err, "cannot write cache entry");
                }
            }
            Err(err) => warn!(path = %example_path, error = %err, "cannot encode cache entry"),
        }
    }
}

/// Lowercase hex SHA-256 of `text`.
pub fn digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_stable() {
        assert_eq!(
            digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hit_and_invalidation() {
        let dir = tempfile::tempdir().unwrap();
        let cache = MarkupCache::new(dir.path().join("cache"));

        cache.set("elements/Button/Types/ButtonExample", "src v1", "<button></button>");
        assert_eq!(
            cache.get("elements/Button/Types/ButtonExample", "src v1").as_deref(),
            Some("<button></button>")
        );
        assert_eq!(cache.get("elements/Button/Types/ButtonExample", "src v2"), None);
        assert_eq!(cache.get("elements/Other", "src v1"), None);
    }

    #[test]
    fn test_corrupt_entry_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = MarkupCache::new(dir.path());
        let path = dir.path().join("a_B.json");
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(cache.get("a/B", "x"), None);
        assert!(!path.exists());
    }
}
