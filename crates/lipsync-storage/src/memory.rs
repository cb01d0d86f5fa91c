//! In-memory `ObjectStore` used in tests.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{StorageError, StorageResult};
use crate::store::ObjectStore;

/// In-memory object store backed by a key → bytes map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert raw bytes under a key.
    pub fn insert(&self, key: &str, bytes: Vec<u8>) {
        self.objects
            .lock()
            .expect("store lock poisoned")
            .insert(key.to_string(), bytes);
    }

    /// Fetch raw bytes by key.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .expect("store lock poisoned")
            .get(key)
            .cloned()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.lock().expect("store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_file(&self, path: &Path, key: &str) -> StorageResult<()> {
        let bytes = tokio::fs::read(path).await?;
        self.insert(key, bytes);
        Ok(())
    }

    async fn get_file(&self, key: &str, path: &Path) -> StorageResult<()> {
        let bytes = self
            .get(key)
            .ok_or_else(|| StorageError::not_found(key))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> StorageResult<Vec<String>> {
        Ok(self
            .objects
            .lock()
            .expect("store lock poisoned")
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete_prefix(&self, prefix: &str) -> StorageResult<u32> {
        let mut objects = self.objects.lock().expect("store lock poisoned");
        let keys: Vec<String> = objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();

        for key in &keys {
            objects.remove(key);
        }

        Ok(keys.len() as u32)
    }

    async fn url_for(&self, key: &str) -> StorageResult<String> {
        if self.get(key).is_none() {
            return Err(StorageError::not_found(key));
        }
        Ok(format!("memory://{}", key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new();

        let src = dir.path().join("source.bin");
        tokio::fs::write(&src, b"lip sync bytes").await.unwrap();

        store.put_file(&src, "jobs/abc/video.mp4").await.unwrap();

        let dst = dir.path().join("downloaded.bin");
        store.get_file("jobs/abc/video.mp4", &dst).await.unwrap();

        let round_tripped = tokio::fs::read(&dst).await.unwrap();
        assert_eq!(round_tripped, b"lip sync bytes");
    }

    #[tokio::test]
    async fn test_get_missing_key_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new();

        let err = store
            .get_file("missing", &dir.path().join("out"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_prefix_scoping() {
        let store = MemoryStore::new();
        store.insert("jobs/a/video.mp4", vec![1]);
        store.insert("jobs/a/audio.mp3", vec![2]);
        store.insert("jobs/ab/video.mp4", vec![3]);
        store.insert("other/result.mp4", vec![4]);

        let deleted = store.delete_prefix("jobs/a/").await.unwrap();
        assert_eq!(deleted, 2);

        // Keys outside the prefix survive
        assert!(store.get("jobs/ab/video.mp4").is_some());
        assert!(store.get("other/result.mp4").is_some());
        assert!(store.get("jobs/a/video.mp4").is_none());
    }

    #[tokio::test]
    async fn test_list_keys_filters_by_prefix() {
        let store = MemoryStore::new();
        store.insert("media/a.mp4", vec![]);
        store.insert("media/b.mp4", vec![]);
        store.insert("results/c.mp4", vec![]);

        let keys = store.list_keys("media/").await.unwrap();
        assert_eq!(keys, vec!["media/a.mp4".to_string(), "media/b.mp4".to_string()]);
    }
}
