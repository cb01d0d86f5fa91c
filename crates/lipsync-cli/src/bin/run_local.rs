//! Run the lip-sync pipeline against local files.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use lipsync_media::{check_ffmpeg, check_ffprobe, probe_duration, reconcile_duration};
use lipsync_models::{InferenceArgs, JobRequest, DEFAULT_START_FRAME};
use lipsync_pipeline::{LipsyncPipeline, PipelineProcess};

#[derive(Debug, Parser)]
#[command(name = "run-local", about = "Run lip sync against local media files")]
struct Args {
    /// Path to the source video file
    #[arg(long)]
    source_video: PathBuf,

    /// Path to the source audio file
    #[arg(long)]
    source_audio: PathBuf,

    /// Whether to restore face quality
    #[arg(long)]
    face_restore: bool,

    /// Upscale factor
    #[arg(long, default_value_t = 1)]
    upscale: u32,

    /// CodeFormer fidelity parameter
    #[arg(long, default_value_t = 0.5)]
    codeformer_fidelity: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("lipsync=info".parse()?))
        .init();

    let args = Args::parse();

    check_ffmpeg().context("ffmpeg is required")?;
    check_ffprobe().context("ffprobe is required")?;

    anyhow::ensure!(args.source_video.exists(), "Video file not found: {}", args.source_video.display());
    anyhow::ensure!(args.source_audio.exists(), "Audio file not found: {}", args.source_audio.display());

    let work_dir = std::env::temp_dir().join(format!("lipsync_{}", Uuid::new_v4()));
    tokio::fs::create_dir_all(&work_dir).await?;

    let audio_duration = probe_duration(&args.source_audio)
        .await
        .context("Failed to probe audio duration")?;
    info!("Audio duration: {:.2}s", audio_duration);

    let reconciled = reconcile_duration(
        &args.source_video,
        &work_dir,
        audio_duration,
        DEFAULT_START_FRAME,
    )
    .await
    .context("Failed to reconcile video duration")?;

    let mut request = JobRequest::new(
        args.source_video.to_string_lossy(),
        args.source_audio.to_string_lossy(),
    );
    request.face_restore = args.face_restore;
    request.upscale = args.upscale;
    request.codeformer_fidelity = args.codeformer_fidelity;

    let out_path = work_dir.join("result.mp4");
    let inference_args =
        InferenceArgs::for_request(&request, &reconciled, &args.source_audio, &out_path);

    let pipeline = PipelineProcess::from_env();
    let produced = pipeline
        .run(&inference_args)
        .await
        .context("Inference failed")?;

    println!("{}", produced.display());
    Ok(())
}
