//! Typed errors for the storage gateway.

use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

/// Failures surfaced by the B2 gateway.
///
/// Operation variants carry the SDK's message as a string; callers branch
/// on the variant, not the text.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage client misconfigured: {0}")]
    ConfigError(String),

    #[error("no such object: {0}")]
    NotFound(String),

    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("delete failed: {0}")]
    DeleteFailed(String),

    #[error("listing failed: {0}")]
    ListFailed(String),

    #[error("could not presign URL: {0}")]
    PresignFailed(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SDK error: {0}")]
    AwsSdk(String),
}

impl StorageError {
    pub fn config_error(msg: impl std::fmt::Display) -> Self {
        Self::ConfigError(msg.to_string())
    }

    pub fn not_found(key: impl std::fmt::Display) -> Self {
        Self::NotFound(key.to_string())
    }

    pub fn upload_failed(cause: impl std::fmt::Display) -> Self {
        Self::UploadFailed(cause.to_string())
    }

    pub fn download_failed(cause: impl std::fmt::Display) -> Self {
        Self::DownloadFailed(cause.to_string())
    }

    pub fn delete_failed(cause: impl std::fmt::Display) -> Self {
        Self::DeleteFailed(cause.to_string())
    }

    pub fn list_failed(cause: impl std::fmt::Display) -> Self {
        Self::ListFailed(cause.to_string())
    }

    pub fn presign_failed(cause: impl std::fmt::Display) -> Self {
        Self::PresignFailed(cause.to_string())
    }
}
