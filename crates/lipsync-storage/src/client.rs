//! Backblaze B2 client over the S3-compatible API.

use std::path::Path;
use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client;
use tracing::{debug, info, warn};

use crate::error::{StorageError, StorageResult};

/// Lifetime of presigned GET URLs handed back to callers.
const PRESIGN_EXPIRY: Duration = Duration::from_secs(24 * 3600);

/// Batch-delete requests carry at most this many keys.
const DELETE_BATCH: usize = 1000;

/// Configuration for the B2 client.
///
/// Credentials are read lazily from the environment; a missing secret
/// surfaces only when the client is first constructed.
#[derive(Debug, Clone)]
pub struct B2Config {
    /// S3 API host for the bucket's region, e.g. `s3.us-west-002.backblazeb2.com`
    pub endpoint: String,
    /// Application key ID
    pub key_id: String,
    /// Application key
    pub app_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Bucket ID
    pub bucket_id: String,
    /// Region portion of the endpoint
    pub region: String,
}

impl B2Config {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        let required = |name: &str| {
            std::env::var(name).map_err(|_| StorageError::config_error(format!("{name} not set")))
        };

        Ok(Self {
            endpoint: std::env::var("BUCKET_ENDPOINT")
                .unwrap_or_else(|_| "s3.us-west-002.backblazeb2.com".to_string()),
            key_id: required("BUCKET_KEY_ID")?,
            app_key: required("BUCKET_APP_KEY")?,
            bucket_name: required("BUCKET_NAME")?,
            bucket_id: required("BUCKET_ID")?,
            region: std::env::var("BUCKET_REGION").unwrap_or_else(|_| "us-west-002".to_string()),
        })
    }
}

/// Backblaze B2 storage client.
#[derive(Clone)]
pub struct B2Client {
    client: Client,
    bucket: String,
    /// Host used for the public URL fallback template
    public_host: String,
}

impl B2Client {
    /// Create a new B2 client from configuration.
    pub async fn new(config: B2Config) -> StorageResult<Self> {
        let credentials = Credentials::new(&config.key_id, &config.app_key, None, None, "b2");

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(format!("https://{}", config.endpoint))
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket_name,
            public_host: config.endpoint,
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        Self::new(B2Config::from_env()?).await
    }

    /// Upload a file to the bucket.
    pub async fn upload_file(&self, path: impl AsRef<Path>, key: &str) -> StorageResult<()> {
        let path = path.as_ref();

        let body = ByteStream::from_path(path)
            .await
            .map_err(StorageError::upload_failed)?;
        self.put_body(body, key).await?;

        info!("Uploaded {} to {}", path.display(), key);
        Ok(())
    }

    /// Upload bytes to the bucket.
    pub async fn upload_bytes(&self, data: Vec<u8>, key: &str) -> StorageResult<()> {
        debug!("Uploading {} bytes to {}", data.len(), key);
        self.put_body(ByteStream::from(data), key).await
    }

    async fn put_body(&self, body: ByteStream, key: &str) -> StorageResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(StorageError::upload_failed)?;
        Ok(())
    }

    /// Create a folder marker: a zero-byte object whose key ends in `/`.
    pub async fn create_folder(&self, prefix: &str) -> StorageResult<()> {
        let key = if prefix.ends_with('/') {
            prefix.to_string()
        } else {
            format!("{}/", prefix)
        };

        debug!("Creating folder marker {}", key);
        self.upload_bytes(Vec::new(), &key).await
    }

    /// Download an object as bytes.
    pub async fn download_bytes(&self, key: &str) -> StorageResult<Vec<u8>> {
        debug!("Downloading {}", key);

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match e.into_service_error() {
                err if err.is_no_such_key() => StorageError::not_found(key),
                err => StorageError::download_failed(err),
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(StorageError::download_failed)?;

        Ok(data.into_bytes().to_vec())
    }

    /// Download an object to a file, creating parent directories as needed.
    pub async fn download_file(&self, key: &str, path: impl AsRef<Path>) -> StorageResult<()> {
        let path = path.as_ref();
        let bytes = self.download_bytes(key).await?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::DownloadFailed(format!("Failed to create directory: {}", e))
            })?;
        }
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| StorageError::DownloadFailed(format!("Failed to write file: {}", e)))?;

        info!("Downloaded {} to {}", key, path.display());
        Ok(())
    }

    /// List objects with a prefix.
    pub async fn list_objects(&self, prefix: &str) -> StorageResult<Vec<ObjectInfo>> {
        debug!("Listing objects with prefix: {}", prefix);

        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        let mut objects = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(StorageError::list_failed)?;
            for obj in page.contents() {
                objects.push(ObjectInfo {
                    key: obj.key().unwrap_or_default().to_string(),
                    size: obj.size().unwrap_or(0) as u64,
                });
            }
        }

        Ok(objects)
    }

    /// Delete multiple objects in one batch request.
    pub async fn delete_objects(&self, keys: &[String]) -> StorageResult<u32> {
        if keys.is_empty() {
            return Ok(0);
        }
        debug!("Deleting {} objects", keys.len());

        let mut objects = Vec::with_capacity(keys.len());
        for key in keys {
            let id = ObjectIdentifier::builder()
                .key(key)
                .build()
                .map_err(StorageError::delete_failed)?;
            objects.push(id);
        }

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
            .map_err(StorageError::delete_failed)?;

        self.client
            .delete_objects()
            .bucket(&self.bucket)
            .delete(delete)
            .send()
            .await
            .map_err(StorageError::delete_failed)?;

        Ok(keys.len() as u32)
    }

    /// Delete every object under a prefix.
    ///
    /// Not transactional: a failure partway through leaves the objects
    /// deleted so far gone.
    pub async fn delete_prefix(&self, prefix: &str) -> StorageResult<u32> {
        let keys: Vec<String> = self
            .list_objects(prefix)
            .await?
            .into_iter()
            .map(|o| o.key)
            .collect();

        let mut deleted = 0;
        for chunk in keys.chunks(DELETE_BATCH) {
            deleted += self.delete_objects(chunk).await?;
        }

        info!("Deleted {} objects under {}", deleted, prefix);
        Ok(deleted)
    }

    /// Generate a presigned GET URL via the SDK.
    pub async fn presign_get(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        let presign_config = PresigningConfig::expires_in(expires_in)
            .map_err(StorageError::presign_failed)?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(StorageError::presign_failed)?;

        Ok(presigned.uri().to_string())
    }

    /// Derive a URL for an uploaded object.
    ///
    /// Tries a presigned GET first; if presigning fails, falls back to the
    /// bucket's public download template.
    pub async fn url_for(&self, key: &str) -> StorageResult<String> {
        match self.presign_get(key, PRESIGN_EXPIRY).await {
            Ok(url) => Ok(url),
            Err(e) => {
                warn!("Presign failed for {}, falling back to public URL: {}", key, e);
                Ok(self.public_url(key))
            }
        }
    }

    /// Public download URL template for the bucket.
    pub fn public_url(&self, key: &str) -> String {
        format!("https://{}.{}/{}", self.bucket, self.public_host, key)
    }

    /// Check connectivity by performing a head-bucket operation.
    pub async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::AwsSdk(format!("B2 connectivity check failed: {}", e)))?;
        Ok(())
    }
}

/// Information about a stored object.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
}
