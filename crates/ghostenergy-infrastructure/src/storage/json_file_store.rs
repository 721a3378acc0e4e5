//! File-backed key/value store.

use super::atomic_json::{AtomicJsonError, AtomicJsonFile};
use async_trait::async_trait;
use ghostenergy_core::error::{GhostError, Result};
use ghostenergy_core::storage::KeyValueStore;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

type Document = BTreeMap<String, String>;

/// Durable [`KeyValueStore`] backed by a single JSON object on disk.
///
/// Every call re-reads the file, so several client processes sharing the
/// same file observe each other's writes. File I/O runs on the blocking pool.
#[derive(Clone)]
pub struct JsonFileKeyValueStore {
    file: Arc<AtomicJsonFile<Document>>,
}

impl JsonFileKeyValueStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: Arc::new(AtomicJsonFile::new(path)),
        }
    }

    async fn blocking<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&AtomicJsonFile<Document>) -> std::result::Result<R, AtomicJsonError>
            + Send
            + 'static,
    {
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || f(&file))
            .await
            .map_err(|e| GhostError::internal(format!("Failed to join storage task: {}", e)))?
            .map_err(|e| GhostError::storage(e.to_string()))
    }
}

#[async_trait]
impl KeyValueStore for JsonFileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.blocking(move |file| Ok(file.load()?.and_then(|mut doc| doc.remove(&key))))
            .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.blocking(move |file| {
            file.update(Document::new(), |doc| {
                doc.insert(key, value);
                Ok(())
            })
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.blocking(move |file| {
            if !file.path().exists() {
                return Ok(());
            }
            file.update(Document::new(), |doc| {
                doc.remove(&key);
                Ok(())
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghostenergy_core::storage::{TOKEN_KEY, USER_KEY};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_set_get_remove() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileKeyValueStore::new(temp_dir.path().join("storage.json"));

        assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);

        store.set(TOKEN_KEY, "tok").await.unwrap();
        store.set(USER_KEY, r#"{"name":"Ana"}"#).await.unwrap();
        assert_eq!(store.get(TOKEN_KEY).await.unwrap().as_deref(), Some("tok"));

        store.remove(TOKEN_KEY).await.unwrap();
        assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);
        assert!(store.get(USER_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_values_survive_a_new_handle() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");

        JsonFileKeyValueStore::new(path.clone())
            .set(TOKEN_KEY, "persisted")
            .await
            .unwrap();

        let reopened = JsonFileKeyValueStore::new(path);
        assert_eq!(reopened.get(TOKEN_KEY).await.unwrap().as_deref(), Some("persisted"));
    }

    #[tokio::test]
    async fn test_remove_without_file_does_not_create_it() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        let store = JsonFileKeyValueStore::new(path.clone());

        store.remove(USER_KEY).await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_surfaces_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        std::fs::write(&path, "[1,2").unwrap();

        let err = JsonFileKeyValueStore::new(path).get(TOKEN_KEY).await.unwrap_err();
        assert!(err.is_storage());
    }
}
