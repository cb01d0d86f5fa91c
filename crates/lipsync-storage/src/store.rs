//! The `ObjectStore` trait seam.
//!
//! The job handler only needs put/get/list/delete/url, so it is written
//! against this trait rather than the concrete SDK client.

use std::path::Path;

use async_trait::async_trait;

use crate::client::B2Client;
use crate::error::StorageResult;

/// Minimal object-storage capability used by the job handler.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload a local file under `key`.
    async fn put_file(&self, path: &Path, key: &str) -> StorageResult<()>;

    /// Download the object at `key` into a local file.
    async fn get_file(&self, key: &str, path: &Path) -> StorageResult<()>;

    /// List all keys under a prefix.
    async fn list_keys(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Delete every object under a prefix (best-effort), returning the count.
    async fn delete_prefix(&self, prefix: &str) -> StorageResult<u32>;

    /// Derive a URL for the object at `key`.
    async fn url_for(&self, key: &str) -> StorageResult<String>;
}

#[async_trait]
impl ObjectStore for B2Client {
    async fn put_file(&self, path: &Path, key: &str) -> StorageResult<()> {
        self.upload_file(path, key).await
    }

    async fn get_file(&self, key: &str, path: &Path) -> StorageResult<()> {
        self.download_file(key, path).await
    }

    async fn list_keys(&self, prefix: &str) -> StorageResult<Vec<String>> {
        Ok(self
            .list_objects(prefix)
            .await?
            .into_iter()
            .map(|o| o.key)
            .collect())
    }

    async fn delete_prefix(&self, prefix: &str) -> StorageResult<u32> {
        B2Client::delete_prefix(self, prefix).await
    }

    async fn url_for(&self, key: &str) -> StorageResult<String> {
        B2Client::url_for(self, key).await
    }
}
