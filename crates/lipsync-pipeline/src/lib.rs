//! Invoker for the opaque lip-sync diffusion pipeline.
//!
//! The diffusion model (UNet, VAE, scheduler, audio encoder) is an external
//! collaborator with a fixed call contract: given an argument record it
//! produces an output video or fails. This crate exposes that contract as
//! the `LipsyncPipeline` trait plus a subprocess-backed implementation.

pub mod error;
pub mod process;

use std::path::PathBuf;

use async_trait::async_trait;

use lipsync_models::InferenceArgs;

pub use error::{PipelineError, PipelineResult};
pub use process::{PipelineConfig, PipelineProcess};

/// The external lip-sync inference capability.
///
/// Called exactly once per job, synchronously; the implementation blocks
/// until the model finishes or fails. No retries.
#[async_trait]
pub trait LipsyncPipeline: Send + Sync {
    /// Run inference and return the path of the produced video.
    async fn run(&self, args: &InferenceArgs) -> PipelineResult<PathBuf>;
}
