//! Pipeline error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that can occur while invoking the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Pipeline launcher not found: {0}")]
    LauncherNotFound(String),

    #[error("Pipeline process failed: {message}")]
    ProcessFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Pipeline reported success but produced no output at {0}")]
    OutputMissing(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn process_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::ProcessFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }
}
