//! Durable key-value storage
//!
//! The session keeps its access token here; preferences share the same
//! store. [`FileStore`] persists a flat JSON object on disk,
//! [`MemoryStore`] lives only as long as its clones.

use crate::error::{Result, SessionError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Storage key of the persisted access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Storage key of the UI locale
pub const LOCALE_KEY: &str = "user-locale";

/// Storage key of the UI theme
pub const THEME_KEY: &str = "user-theme";

/// Get/set/remove by string key, surviving restarts for durable impls
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store. Clones share the same entries, which lets tests model a
/// process restart by building fresh services over a clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous peek, handy in assertions
    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// JSON-file backed store
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles
    lock: tokio::sync::Mutex<()>,
}

impl FileStore {
    /// Create a store at the given path. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Default location: `~/.fieldops/storage.json`
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".fieldops")
            .join("storage.json")
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            SessionError::Storage(format!(
                "Failed to parse {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    async fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        let content = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, content).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&self.path, perms).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries).await?;
        debug!("Stored {} in {:?}", key, self.path);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.save(&entries).await?;
            debug!("Removed {} from {:?}", key, self.path);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_store_clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();

        store.set(ACCESS_TOKEN_KEY, "abc").await.unwrap();
        assert_eq!(other.get(ACCESS_TOKEN_KEY).await.unwrap(), Some("abc".to_string()));

        other.remove(ACCESS_TOKEN_KEY).await.unwrap();
        assert!(store.peek(ACCESS_TOKEN_KEY).is_none());
    }

    #[tokio::test]
    async fn test_file_store_missing_file_reads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("nested").join("storage.json"));

        assert_eq!(store.get(ACCESS_TOKEN_KEY).await.unwrap(), None);
        // Removing from a missing file does not create it
        store.remove(ACCESS_TOKEN_KEY).await.unwrap();
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");

        let store = FileStore::new(&path);
        store.set(ACCESS_TOKEN_KEY, "tok").await.unwrap();
        store.set(THEME_KEY, "dark").await.unwrap();
        drop(store);

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get(ACCESS_TOKEN_KEY).await.unwrap(), Some("tok".to_string()));
        assert_eq!(reopened.get(THEME_KEY).await.unwrap(), Some("dark".to_string()));

        reopened.remove(ACCESS_TOKEN_KEY).await.unwrap();
        assert_eq!(reopened.get(ACCESS_TOKEN_KEY).await.unwrap(), None);
        assert_eq!(reopened.get(THEME_KEY).await.unwrap(), Some("dark".to_string()));
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let store = FileStore::new(&path);
        assert!(matches!(
            store.get(ACCESS_TOKEN_KEY).await,
            Err(SessionError::Storage(_))
        ));
    }

    #[test]
    fn test_default_path() {
        assert!(FileStore::default_path().ends_with(".fieldops/storage.json"));
    }
}
