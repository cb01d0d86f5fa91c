//! Storage-URL parsing.
//!
//! Bucket download URLs follow the `https://<host>/file/<bucket>/<key>`
//! convention; the object key is everything after the bucket segment.

use thiserror::Error;

/// Errors that can occur while extracting a storage key from a URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageKeyError {
    #[error("URL does not follow the /file/<bucket>/<key> convention: {0}")]
    InvalidUrl(String),

    #[error("URL has no object key after the bucket segment: {0}")]
    MissingKey(String),
}

/// Result type for storage key extraction.
pub type StorageKeyResult<T> = Result<T, StorageKeyError>;

/// Extract the object key from a bucket download URL.
///
/// ```
/// use lipsync_models::storage_key_from_url;
///
/// let key = storage_key_from_url(
///     "https://f004.backblazeb2.com/file/my-bucket/media/source.mp4",
/// ).unwrap();
/// assert_eq!(key, "media/source.mp4");
/// ```
pub fn storage_key_from_url(url: &str) -> StorageKeyResult<String> {
    let url = url.trim();

    let (_, rest) = url
        .split_once("/file/")
        .ok_or_else(|| StorageKeyError::InvalidUrl(url.to_string()))?;

    let (_bucket, key) = rest
        .split_once('/')
        .ok_or_else(|| StorageKeyError::MissingKey(url.to_string()))?;

    if key.is_empty() {
        return Err(StorageKeyError::MissingKey(url.to_string()));
    }

    Ok(key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_nested_key() {
        let key = storage_key_from_url(
            "https://f004.backblazeb2.com/file/bucket-name/path/to/file.mp4",
        )
        .unwrap();
        assert_eq!(key, "path/to/file.mp4");
    }

    #[test]
    fn test_rejects_url_without_file_segment() {
        let err = storage_key_from_url("https://example.com/bucket/file.mp4").unwrap_err();
        assert!(matches!(err, StorageKeyError::InvalidUrl(_)));
    }

    #[test]
    fn test_rejects_url_without_key() {
        let err = storage_key_from_url("https://f004.backblazeb2.com/file/bucket-name").unwrap_err();
        assert!(matches!(err, StorageKeyError::MissingKey(_)));

        let err = storage_key_from_url("https://f004.backblazeb2.com/file/bucket-name/").unwrap_err();
        assert!(matches!(err, StorageKeyError::MissingKey(_)));
    }
}
