//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Anything that can go wrong while taking and running a job.
///
/// `InvalidInput` is the only variant raised before side effects; every
/// other failure may leave partial state behind in the bucket.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("invalid job input: {0}")]
    InvalidInput(String),

    #[error("job failed: {0}")]
    JobFailed(String),

    #[error("queue request failed: {0}")]
    Queue(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Storage(#[from] lipsync_storage::StorageError),

    #[error(transparent)]
    Media(#[from] lipsync_media::MediaError),

    #[error(transparent)]
    Pipeline(#[from] lipsync_pipeline::PipelineError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// True for errors raised by input validation, before any side effect.
    pub fn is_validation(&self) -> bool {
        matches!(self, WorkerError::InvalidInput(_))
    }
}
