//! Errors for ffmpeg/ffprobe operations.

use std::path::PathBuf;
use thiserror::Error;

pub type MediaResult<T> = Result<T, MediaError>;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("ffmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("ffprobe not found in PATH")]
    FfprobeNotFound,

    /// ffmpeg ran but exited unsuccessfully; stderr is kept for the logs.
    #[error("ffmpeg failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("ffprobe failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("invalid media file: {0}")]
    InvalidMedia(String),

    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse ffprobe output: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Build an error from a failed ffmpeg invocation, keeping its stderr.
    pub fn ffmpeg_failed(message: impl Into<String>, output: &std::process::Output) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr: Some(String::from_utf8_lossy(&output.stderr).into_owned()),
            exit_code: output.status.code(),
        }
    }
}
