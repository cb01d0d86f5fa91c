//! Job request/result schema and lifecycle.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Unique identifier minted for each job, also naming its scratch
/// directory so concurrent invocations never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stage a job is in while being processed.
///
/// Used for structured logging and to attach context to failures. Any stage
/// may transition to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Received,
    Validated,
    Downloading,
    Reconciling,
    Inferring,
    Uploading,
    CleanedUp,
    Failed,
}

impl JobStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStage::Received => "received",
            JobStage::Validated => "validated",
            JobStage::Downloading => "downloading",
            JobStage::Reconciling => "reconciling",
            JobStage::Inferring => "inferring",
            JobStage::Uploading => "uploading",
            JobStage::CleanedUp => "cleaned_up",
            JobStage::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStage::CleanedUp | JobStage::Failed)
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lip-sync job request.
///
/// `source_video` and `source_audio` are bucket download URLs; both are
/// required and rejected at deserialization when absent. The remaining
/// fields carry schema defaults. Immutable once accepted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct JobRequest {
    /// Bucket URL of the source video
    pub source_video: String,

    /// Bucket URL of the source audio
    pub source_audio: String,

    /// Whether to run face restoration on the output
    #[serde(default)]
    pub face_restore: bool,

    /// Upscale factor applied by the pipeline
    #[serde(default = "default_upscale")]
    #[validate(range(min = 1))]
    pub upscale: u32,

    /// CodeFormer fidelity weight (0 = quality, 1 = fidelity)
    #[serde(default = "default_codeformer_fidelity")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub codeformer_fidelity: f64,
}

fn default_upscale() -> u32 {
    1
}

fn default_codeformer_fidelity() -> f64 {
    0.5
}

impl JobRequest {
    /// Create a request with schema defaults for the optional fields.
    pub fn new(source_video: impl Into<String>, source_audio: impl Into<String>) -> Self {
        Self {
            source_video: source_video.into(),
            source_audio: source_audio.into(),
            face_restore: false,
            upscale: default_upscale(),
            codeformer_fidelity: default_codeformer_fidelity(),
        }
    }
}

/// Result of a successful job: the bucket URL of the lip-synced video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobResult {
    pub result_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request: JobRequest = serde_json::from_str(
            r#"{"source_video": "https://x/file/b/v.mp4", "source_audio": "https://x/file/b/a.mp3"}"#,
        )
        .unwrap();

        assert!(!request.face_restore);
        assert_eq!(request.upscale, 1);
        assert!((request.codeformer_fidelity - 0.5).abs() < f64::EPSILON);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_request_missing_audio_rejected() {
        let result: Result<JobRequest, _> =
            serde_json::from_str(r#"{"source_video": "https://x/file/b/v.mp4"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_request_fidelity_out_of_range() {
        let mut request = JobRequest::new("https://x/file/b/v.mp4", "https://x/file/b/a.mp3");
        request.codeformer_fidelity = 1.5;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_request_zero_upscale_rejected() {
        let mut request = JobRequest::new("https://x/file/b/v.mp4", "https://x/file/b/a.mp3");
        request.upscale = 0;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_stage_terminality() {
        assert!(JobStage::CleanedUp.is_terminal());
        assert!(JobStage::Failed.is_terminal());
        assert!(!JobStage::Inferring.is_terminal());
    }
}
