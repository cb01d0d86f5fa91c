//! Round-trip media through the bucket: upload sources, run the pipeline
//! locally, upload the result, download it back, then delete the working
//! folder.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use lipsync_media::{probe_duration, reconcile_duration};
use lipsync_models::{InferenceArgs, JobRequest, DEFAULT_START_FRAME};
use lipsync_pipeline::{LipsyncPipeline, PipelineProcess};
use lipsync_storage::{B2Client, ObjectStore};

#[derive(Debug, Parser)]
#[command(name = "process-media", about = "Process media files through the bucket")]
struct Args {
    /// Path to the input audio file
    #[arg(long, short = 'a')]
    audio: PathBuf,

    /// Path to the input video file
    #[arg(long, short = 'v')]
    video: PathBuf,

    /// Directory the result video is downloaded into
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("lipsync=info".parse()?))
        .init();

    let args = Args::parse();

    anyhow::ensure!(args.audio.exists(), "Audio file not found: {}", args.audio.display());
    anyhow::ensure!(args.video.exists(), "Video file not found: {}", args.video.display());

    let store = B2Client::from_env()
        .await
        .context("Failed to create storage client")?;

    let folder = "media_processing/";
    let result = run(&store, &args, folder).await;

    // Working folder is ephemeral either way
    if let Err(e) = store.delete_prefix(folder).await {
        warn!("Failed to clean up bucket folder {}: {}", folder, e);
    }

    result
}

async fn run(store: &B2Client, args: &Args, folder: &str) -> anyhow::Result<()> {
    info!("Creating folder in bucket");
    store.create_folder(folder).await?;

    let audio_name = file_name(&args.audio)?;
    let video_name = file_name(&args.video)?;

    info!("Uploading audio file: {}", audio_name);
    store
        .put_file(&args.audio, &format!("{}{}", folder, audio_name))
        .await?;

    info!("Uploading video file: {}", video_name);
    store
        .put_file(&args.video, &format!("{}{}", folder, video_name))
        .await?;

    let work_dir = std::env::temp_dir().join(format!("lipsync_{}", Uuid::new_v4()));
    tokio::fs::create_dir_all(&work_dir).await?;

    let audio_duration = probe_duration(&args.audio).await?;
    let reconciled =
        reconcile_duration(&args.video, &work_dir, audio_duration, DEFAULT_START_FRAME).await?;

    let request = JobRequest::new(
        args.video.to_string_lossy(),
        args.audio.to_string_lossy(),
    );
    let out_path = work_dir.join("result.mp4");
    let inference_args = InferenceArgs::for_request(&request, &reconciled, &args.audio, &out_path);

    let pipeline = PipelineProcess::from_env();
    let produced = pipeline.run(&inference_args).await.context("Inference failed")?;

    let result_key = format!("{}result.mp4", folder);
    info!("Uploading result file");
    store.put_file(&produced, &result_key).await?;

    info!("Downloading result file");
    tokio::fs::create_dir_all(&args.output_dir).await?;
    let downloaded = args.output_dir.join("downloaded_result.mp4");
    store.get_file(&result_key, &downloaded).await?;

    if let Err(e) = tokio::fs::remove_dir_all(&work_dir).await {
        warn!("Failed to remove working directory: {}", e);
    }

    println!("{}", downloaded.display());
    Ok(())
}

fn file_name(path: &std::path::Path) -> anyhow::Result<String> {
    Ok(path
        .file_name()
        .with_context(|| format!("Path has no file name: {}", path.display()))?
        .to_string_lossy()
        .to_string())
}
