//! Shared data models for the lipsync worker.
//!
//! This crate provides Serde-serializable types for:
//! - Job requests and results (the serverless input/output schema)
//! - Inference argument records passed to the diffusion pipeline
//! - Job identifiers and lifecycle stages
//! - Storage-URL parsing

pub mod inference;
pub mod job;
pub mod utils;

// Re-export common types
pub use inference::{
    InferenceArgs, DEFAULT_CHECKPOINT_PATH, DEFAULT_GUIDANCE_SCALE, DEFAULT_INFERENCE_STEPS,
    DEFAULT_SEED, DEFAULT_START_FRAME, DEFAULT_UNET_CONFIG_PATH,
};
pub use job::{JobId, JobRequest, JobResult, JobStage};
pub use utils::{storage_key_from_url, StorageKeyError, StorageKeyResult};
