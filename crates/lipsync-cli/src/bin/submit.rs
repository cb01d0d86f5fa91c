//! Submit a lip-sync job to a remote queue and wait for the result.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lipsync_models::{JobRequest, JobResult};

/// How often the remote job status is polled.
const POLL_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Parser)]
#[command(name = "submit", about = "Submit a lip-sync job to a remote endpoint")]
struct Args {
    /// Bucket URL of the source video
    #[arg(long)]
    source_video: String,

    /// Bucket URL of the source audio
    #[arg(long)]
    source_audio: String,

    /// Whether to restore face quality
    #[arg(long)]
    face_restore: bool,

    /// Upscale factor
    #[arg(long, default_value_t = 1)]
    upscale: u32,

    /// CodeFormer fidelity parameter
    #[arg(long, default_value_t = 0.5)]
    codeformer_fidelity: f64,

    /// Base URL of the serverless endpoint
    #[arg(long, env = "QUEUE_ENDPOINT")]
    endpoint: String,

    /// API key for the endpoint
    #[arg(long, env = "QUEUE_API_KEY")]
    api_key: String,

    /// Directory the result video is downloaded into
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    output: Option<JobResult>,
    #[serde(default)]
    error: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("lipsync=info".parse()?))
        .init();

    let args = Args::parse();
    let endpoint = args.endpoint.trim_end_matches('/');
    let http = reqwest::Client::new();

    let mut request = JobRequest::new(&args.source_video, &args.source_audio);
    request.face_restore = args.face_restore;
    request.upscale = args.upscale;
    request.codeformer_fidelity = args.codeformer_fidelity;

    let submitted: SubmitResponse = http
        .post(format!("{}/run", endpoint))
        .bearer_auth(&args.api_key)
        .json(&serde_json::json!({ "input": request }))
        .send()
        .await?
        .error_for_status()
        .context("Job submission failed")?
        .json()
        .await?;

    info!("Submitted job {}", submitted.id);

    let result = loop {
        let status: StatusResponse = http
            .get(format!("{}/status/{}", endpoint, submitted.id))
            .bearer_auth(&args.api_key)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match status.status.as_str() {
            "COMPLETED" => {
                break status
                    .output
                    .context("Job completed without an output record")?;
            }
            "FAILED" => {
                anyhow::bail!(
                    "Job failed: {}",
                    status.error.unwrap_or_else(|| "unknown error".to_string())
                );
            }
            other => {
                info!("Job {} is {}", submitted.id, other);
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }
    };

    info!("Result available at {}", result.result_url);

    tokio::fs::create_dir_all(&args.output_dir).await?;
    let output_path = args.output_dir.join("result.mp4");

    let bytes = http
        .get(&result.result_url)
        .send()
        .await?
        .error_for_status()
        .context("Result download failed")?
        .bytes()
        .await?;
    tokio::fs::write(&output_path, &bytes).await?;

    println!("{}", output_path.display());
    Ok(())
}
