//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{WorkerError, WorkerResult};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Root directory for per-job working directories
    pub work_dir: PathBuf,
    /// Base URL of the job queue endpoint
    pub queue_endpoint: String,
    /// API key for the job queue
    pub queue_api_key: String,
    /// Delay between polls when the queue is empty
    pub poll_interval: Duration,
}

impl WorkerConfig {
    /// Create config from environment variables.
    ///
    /// The queue endpoint and API key are required; everything else has a
    /// default.
    pub fn from_env() -> WorkerResult<Self> {
        Ok(Self {
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/tmp/lipsync")),
            queue_endpoint: std::env::var("QUEUE_ENDPOINT")
                .map_err(|_| WorkerError::config_error("QUEUE_ENDPOINT not set"))?,
            queue_api_key: std::env::var("QUEUE_API_KEY")
                .map_err(|_| WorkerError::config_error("QUEUE_API_KEY not set"))?,
            poll_interval: Duration::from_secs(
                std::env::var("WORKER_POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
        })
    }
}
