//! Subprocess-backed pipeline implementation.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use lipsync_models::InferenceArgs;

use crate::error::{PipelineError, PipelineResult};
use crate::LipsyncPipeline;

/// Configuration for the pipeline launcher process.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Interpreter used to launch the pipeline
    pub python: String,
    /// Entry-point script packaged with the deployment
    pub script: PathBuf,
    /// Override for the UNet config path baked into the argument record
    pub unet_config: Option<PathBuf>,
    /// Override for the checkpoint path baked into the argument record
    pub checkpoint: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            script: PathBuf::from("scripts/inference.py"),
            unet_config: None,
            checkpoint: None,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables, with deployment defaults.
    pub fn from_env() -> Self {
        let path_var = |name: &str| std::env::var(name).ok().map(PathBuf::from);

        Self {
            python: std::env::var("PIPELINE_PYTHON").unwrap_or_else(|_| "python3".to_string()),
            script: path_var("PIPELINE_SCRIPT")
                .unwrap_or_else(|| PathBuf::from("scripts/inference.py")),
            unet_config: path_var("PIPELINE_UNET_CONFIG"),
            checkpoint: path_var("PIPELINE_CHECKPOINT"),
        }
    }
}

/// Pipeline implementation that shells out to the packaged inference script.
#[derive(Debug, Clone)]
pub struct PipelineProcess {
    config: PipelineConfig,
}

impl PipelineProcess {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(PipelineConfig::from_env())
    }

    /// Build the flag vector for an argument record.
    ///
    /// Deployment-level overrides for the model paths win over the record.
    pub fn build_args(&self, args: &InferenceArgs) -> Vec<String> {
        let unet_config = self.config.unet_config.as_ref().unwrap_or(&args.unet_config_path);
        let checkpoint = self.config.checkpoint.as_ref().unwrap_or(&args.checkpoint_path);

        let mut flags = vec![self.config.script.to_string_lossy().to_string()];

        flags.push("--unet_config_path".to_string());
        flags.push(unet_config.to_string_lossy().to_string());
        flags.push("--inference_ckpt_path".to_string());
        flags.push(checkpoint.to_string_lossy().to_string());
        flags.push("--video_path".to_string());
        flags.push(args.video_path.to_string_lossy().to_string());
        flags.push("--audio_path".to_string());
        flags.push(args.audio_path.to_string_lossy().to_string());
        flags.push("--video_out_path".to_string());
        flags.push(args.video_out_path.to_string_lossy().to_string());
        flags.push("--inference_steps".to_string());
        flags.push(args.inference_steps.to_string());
        flags.push("--guidance_scale".to_string());
        flags.push(args.guidance_scale.to_string());
        flags.push("--seed".to_string());
        flags.push(args.seed.to_string());
        flags.push("--start_frame".to_string());
        flags.push(args.start_frame.to_string());

        if args.face_restore {
            flags.push("--face_restore".to_string());
            flags.push("--upscale".to_string());
            flags.push(args.upscale.to_string());
            flags.push("--codeformer_fidelity".to_string());
            flags.push(args.codeformer_fidelity.to_string());
        }

        flags
    }
}

#[async_trait]
impl LipsyncPipeline for PipelineProcess {
    async fn run(&self, args: &InferenceArgs) -> PipelineResult<PathBuf> {
        let flags = self.build_args(args);
        debug!("Launching pipeline: {} {}", self.config.python, flags.join(" "));

        // Blocks until the model finishes or fails; the surrounding
        // platform's timeout is the only bound.
        let output = Command::new(&self.config.python)
            .args(&flags)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PipelineError::LauncherNotFound(self.config.python.clone())
                } else {
                    PipelineError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(PipelineError::process_failed(
                "Inference process exited with non-zero status",
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
                output.status.code(),
            ));
        }

        if !args.video_out_path.exists() {
            return Err(PipelineError::OutputMissing(args.video_out_path.clone()));
        }

        info!("Inference produced {}", args.video_out_path.display());
        Ok(args.video_out_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lipsync_models::JobRequest;

    fn test_args() -> InferenceArgs {
        let request = JobRequest::new("https://x/file/b/v.mp4", "https://x/file/b/a.mp3");
        InferenceArgs::for_request(&request, "/work/video.mp4", "/work/audio.mp3", "/work/result.mp4")
    }

    #[test]
    fn test_build_args_layout() {
        let process = PipelineProcess::new(PipelineConfig::default());
        let flags = process.build_args(&test_args());

        assert_eq!(flags[0], "scripts/inference.py");
        let steps_pos = flags.iter().position(|f| f == "--inference_steps").unwrap();
        assert_eq!(flags[steps_pos + 1], "20");
        let seed_pos = flags.iter().position(|f| f == "--seed").unwrap();
        assert_eq!(flags[seed_pos + 1], "1247");
        // Face restoration is off by default
        assert!(!flags.iter().any(|f| f == "--face_restore"));
    }

    #[test]
    fn test_model_path_overrides_win() {
        let config = PipelineConfig {
            unet_config: Some(PathBuf::from("/models/unet.yaml")),
            checkpoint: Some(PathBuf::from("/models/unet.pt")),
            ..PipelineConfig::default()
        };
        let flags = PipelineProcess::new(config).build_args(&test_args());

        let unet_pos = flags.iter().position(|f| f == "--unet_config_path").unwrap();
        assert_eq!(flags[unet_pos + 1], "/models/unet.yaml");
        let ckpt_pos = flags.iter().position(|f| f == "--inference_ckpt_path").unwrap();
        assert_eq!(flags[ckpt_pos + 1], "/models/unet.pt");
    }

    #[test]
    fn test_build_args_face_restore() {
        let mut args = test_args();
        args.face_restore = true;
        args.upscale = 2;
        args.codeformer_fidelity = 0.7;

        let process = PipelineProcess::new(PipelineConfig::default());
        let flags = process.build_args(&args);

        assert!(flags.iter().any(|f| f == "--face_restore"));
        let upscale_pos = flags.iter().position(|f| f == "--upscale").unwrap();
        assert_eq!(flags[upscale_pos + 1], "2");
    }
}
