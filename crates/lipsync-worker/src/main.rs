//! Lip-sync worker binary: polls the job queue and processes jobs.

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lipsync_pipeline::PipelineProcess;
use lipsync_storage::B2Client;
use lipsync_worker::{JobHandler, QueueClient, WorkerConfig};

/// Structured JSON logs when `LOG_FORMAT=json`, human-readable otherwise.
fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("lipsync=info".parse().expect("static directive"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().with_ansi(true).with_target(true)).init();
    }
}

#[tokio::main]
async fn main() {
    // TLS for the queue client and the S3 endpoint
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting lipsync-worker");

    let config = match WorkerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load worker config: {}", e);
            std::process::exit(1);
        }
    };

    let store = match B2Client::from_env().await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create storage client: {}", e);
            std::process::exit(1);
        }
    };

    let handler = JobHandler::new(store, PipelineProcess::from_env(), &config.work_dir);
    let queue = QueueClient::new(&config.queue_endpoint, &config.queue_api_key);

    if let Err(e) = queue.run(&handler, config.poll_interval).await {
        error!("Worker loop error: {}", e);
        std::process::exit(1);
    }
}
