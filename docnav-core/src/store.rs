//! Persistent key-value storage for preferences and recent searches

use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::config::APP_NAME;

/// A string-to-string store that may fail on any call
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Store that lives only as long as the process
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Store backed by a JSON object on disk, rewritten on every change
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Platform data path of the store file
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", APP_NAME)
            .map(|proj_dirs| proj_dirs.data_dir().join("store.json"))
    }

    /// Open the store at the platform data path
    pub fn open_default() -> Result<Self> {
        let path = Self::default_path().context("No data directory available on this platform")?;
        Ok(Self::open(path))
    }

    /// Open a store file. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match Self::read(&path) {
            Ok(values) => values,
            Err(e) => {
                log::warn!("ignoring store {}: {:#}", path.display(), e);
                BTreeMap::new()
            }
        };
        Self { path, values }
    }

    fn read(path: &Path) -> Result<BTreeMap<String, String>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read store file: {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse store file: {}", path.display()))
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write store file: {}", self.path.display()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    /// A store whose every call fails
    #[derive(Default)]
    pub(crate) struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            anyhow::bail!("storage unavailable")
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            anyhow::bail!("storage unavailable")
        }
        fn remove(&mut self, _key: &str) -> Result<()> {
            anyhow::bail!("storage unavailable")
        }
    }

    #[test]
    fn test_memory_store() -> Result<()> {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k")?, None);
        store.set("k", "v")?;
        assert_eq!(store.get("k")?.as_deref(), Some("v"));
        store.remove("k")?;
        assert_eq!(store.get("k")?, None);
        Ok(())
    }

    #[test]
    fn test_file_store_persists() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("nested").join("store.json");

        let mut store = FileStore::open(&path);
        store.set("docnav_theme", "dark")?;
        store.set("docnav.search.recent", "[\"a\"]")?;

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get("docnav_theme")?.as_deref(), Some("dark"));
        assert_eq!(reopened.get("docnav.search.recent")?.as_deref(), Some("[\"a\"]"));
        Ok(())
    }

    #[test]
    fn test_file_store_malformed_starts_empty() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{ not json")?;

        let mut store = FileStore::open(&path);
        assert_eq!(store.get("anything")?, None);

        // Writing replaces the malformed file
        store.set("k", "v")?;
        assert_eq!(FileStore::open(&path).get("k")?.as_deref(), Some("v"));
        Ok(())
    }

    #[test]
    fn test_default_path_mentions_app() {
        if let Some(path) = FileStore::default_path() {
            assert!(path.to_string_lossy().contains("docnav"));
            assert!(path.ends_with("store.json"));
        }
    }
}
