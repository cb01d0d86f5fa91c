//! Inference argument record for the diffusion pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::job::JobRequest;

/// Default UNet config shipped with the pipeline image.
pub const DEFAULT_UNET_CONFIG_PATH: &str = "configs/unet/second_stage.yaml";

/// Default UNet checkpoint shipped with the pipeline image.
pub const DEFAULT_CHECKPOINT_PATH: &str = "checkpoints/latentsync_unet.pt";

/// Default number of denoising steps.
pub const DEFAULT_INFERENCE_STEPS: u32 = 20;

/// Default classifier-free guidance scale.
pub const DEFAULT_GUIDANCE_SCALE: f64 = 1.0;

/// Default RNG seed (-1 would mean unseeded).
pub const DEFAULT_SEED: i64 = 1247;

/// Default frame of the source video to sync from.
pub const DEFAULT_START_FRAME: u32 = 0;

/// The fixed argument record handed to the lip-sync pipeline.
///
/// Constructed once per job and consumed once. Model config and checkpoint
/// paths are fixed deployment paths, not user input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceArgs {
    pub unet_config_path: PathBuf,
    pub checkpoint_path: PathBuf,
    pub video_path: PathBuf,
    pub audio_path: PathBuf,
    pub video_out_path: PathBuf,
    pub inference_steps: u32,
    pub guidance_scale: f64,
    pub seed: i64,
    pub start_frame: u32,
    pub face_restore: bool,
    pub upscale: u32,
    pub codeformer_fidelity: f64,
}

impl InferenceArgs {
    /// Build the argument record for a job request, with the deployment's
    /// fixed model paths and defaults for the sampling parameters.
    pub fn for_request(
        request: &JobRequest,
        video_path: impl AsRef<Path>,
        audio_path: impl AsRef<Path>,
        video_out_path: impl AsRef<Path>,
    ) -> Self {
        Self {
            unet_config_path: PathBuf::from(DEFAULT_UNET_CONFIG_PATH),
            checkpoint_path: PathBuf::from(DEFAULT_CHECKPOINT_PATH),
            video_path: video_path.as_ref().to_path_buf(),
            audio_path: audio_path.as_ref().to_path_buf(),
            video_out_path: video_out_path.as_ref().to_path_buf(),
            inference_steps: DEFAULT_INFERENCE_STEPS,
            guidance_scale: DEFAULT_GUIDANCE_SCALE,
            seed: DEFAULT_SEED,
            start_frame: DEFAULT_START_FRAME,
            face_restore: request.face_restore,
            upscale: request.upscale,
            codeformer_fidelity: request.codeformer_fidelity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_request_fills_defaults() {
        let request = JobRequest::new("https://x/file/b/v.mp4", "https://x/file/b/a.mp3");
        let args = InferenceArgs::for_request(&request, "/tmp/v.mp4", "/tmp/a.mp3", "/tmp/out.mp4");

        assert_eq!(args.inference_steps, 20);
        assert_eq!(args.seed, 1247);
        assert_eq!(args.start_frame, 0);
        assert_eq!(args.unet_config_path, PathBuf::from(DEFAULT_UNET_CONFIG_PATH));
        assert_eq!(args.video_out_path, PathBuf::from("/tmp/out.mp4"));
    }
}
