//! Example Store Module for the Example Playground
//!
//! Where original snippet text comes from. Examples are addressed by their
//! path relative to the examples root without extension, e.g.
//! `elements/Button/Types/ButtonExample`.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::StoreError;

pub const EXAMPLE_EXTENSION: &str = "js";

pub trait ExampleStore {
    /// Original text of the example at `path`.
    fn load(&self, path: &str) -> Result<String, StoreError>;

    /// Every example path, sorted.
    fn paths(&self) -> Vec<String>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// DIRECTORY STORE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct DirectoryExampleStore {
    root: PathBuf,
}

impl DirectoryExampleStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryExampleStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_for(&self, path: &str) -> PathBuf {
        self.root.join(format!("{}.{}", path, EXAMPLE_EXTENSION))
    }
}

impl ExampleStore for DirectoryExampleStore {
    fn load(&self, path: &str) -> Result<String, StoreError> {
        if path.split('/').any(|segment| segment == "..") {
            return Err(StoreError::NotFound(path.to_string()));
        }
        let file = self.file_for(path);
        fs::read_to_string(&file).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(path.to_string()),
            _ => StoreError::Io {
                path: file.to_string_lossy().to_string(),
                source,
            },
        })
    }

    fn paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            let file = entry.path();
            if !file.is_file() || file.extension().map_or(true, |ext| ext != EXAMPLE_EXTENSION) {
                continue;
            }
            if let Ok(relative) = file.with_extension("").strip_prefix(&self.root) {
                let segments: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().to_string())
                    .collect();
                paths.push(segments.join("/"));
            }
        }
        paths.sort();
        paths
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MEMORY STORE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default)]
pub struct MemoryExampleStore {
    examples: BTreeMap<String, String>,
}

impl MemoryExampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, source: impl Into<String>) {
        self.examples.insert(path.into(), source.into());
    }

    pub fn with(mut self, path: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(path, source);
        self
    }
}

impl ExampleStore for MemoryExampleStore {
    fn load(&self, path: &str) -> Result<String, StoreError> {
        self.examples
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    fn paths(&self) -> Vec<String> {
        self.examples.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_store_discovers_examples() {
        let dir = tempfile::tempdir().unwrap();
        let types = dir.path().join("elements/Button/Types");
        fs::create_dir_all(&types).unwrap();
        fs::write(types.join("ButtonExample.js"), "export default 1").unwrap();
        fs::write(types.join("index.md"), "ignored").unwrap();
        fs::write(dir.path().join("elements/Intro.js"), "export default 2").unwrap();

        let store = DirectoryExampleStore::new(dir.path());
        assert_eq!(
            store.paths(),
            vec!["elements/Button/Types/ButtonExample", "elements/Intro"]
        );
        assert_eq!(store.load("elements/Intro").unwrap(), "export default 2");
    }

    #[test]
    fn test_directory_store_missing_example() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryExampleStore::new(dir.path());
        assert!(matches!(store.load("nope/Missing"), Err(StoreError::NotFound(_))));
        assert!(matches!(store.load("../etc/passwd"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryExampleStore::new().with("b/B", "2").with("a/A", "1");
        assert_eq!(store.paths(), vec!["a/A", "b/B"]);
        assert_eq!(store.load("a/A").unwrap(), "1");
        assert!(store.load("c/C").is_err());
    }
}
