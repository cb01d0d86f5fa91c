//! Thin client for the serverless platform's job-polling protocol.
//!
//! The protocol itself is an external collaborator: take a job, run it,
//! report the outcome. Nothing here is retried or persisted.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use lipsync_models::{JobRequest, JobResult};
use lipsync_pipeline::LipsyncPipeline;
use lipsync_storage::ObjectStore;

use crate::error::{WorkerError, WorkerResult};
use crate::handler::JobHandler;

/// A job taken from the queue. The input payload is kept raw so a malformed
/// request fails that job, not the worker loop.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueJob {
    pub id: String,
    pub input: Value,
}

#[derive(Debug, Serialize)]
struct FailureReport<'a> {
    error: &'a str,
}

/// Client for the remote job queue.
pub struct QueueClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl QueueClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Take the next job, if any.
    pub async fn take_job(&self) -> WorkerResult<Option<QueueJob>> {
        let response = self
            .http
            .get(format!("{}/job-take", self.endpoint))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let response = response
            .error_for_status()
            .map_err(|e| WorkerError::Queue(e.to_string()))?;

        Ok(Some(response.json().await?))
    }

    /// Report a successful job.
    pub async fn report_done(&self, job_id: &str, result: &JobResult) -> WorkerResult<()> {
        self.http
            .post(format!("{}/job-done/{}", self.endpoint, job_id))
            .bearer_auth(&self.api_key)
            .json(result)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| WorkerError::Queue(e.to_string()))?;
        Ok(())
    }

    /// Report a failed job with a flat string description.
    pub async fn report_failed(&self, job_id: &str, message: &str) -> WorkerResult<()> {
        self.http
            .post(format!("{}/job-failed/{}", self.endpoint, job_id))
            .bearer_auth(&self.api_key)
            .json(&FailureReport { error: message })
            .send()
            .await?
            .error_for_status()
            .map_err(|e| WorkerError::Queue(e.to_string()))?;
        Ok(())
    }

    /// Poll the queue forever, handing jobs to the handler one at a time.
    pub async fn run<S, P>(
        &self,
        handler: &JobHandler<S, P>,
        poll_interval: Duration,
    ) -> WorkerResult<()>
    where
        S: ObjectStore,
        P: LipsyncPipeline,
    {
        info!("Polling {} for jobs", self.endpoint);

        loop {
            match self.take_job().await {
                Ok(Some(job)) => {
                    info!(queue_job_id = %job.id, "Took job from queue");
                    self.dispatch(handler, job).await;
                }
                Ok(None) => {
                    tokio::time::sleep(poll_interval).await;
                }
                Err(e) => {
                    warn!("Queue poll failed: {}", e);
                    tokio::time::sleep(poll_interval).await;
                }
            }
        }
    }

    async fn dispatch<S, P>(&self, handler: &JobHandler<S, P>, job: QueueJob)
    where
        S: ObjectStore,
        P: LipsyncPipeline,
    {
        let outcome = match serde_json::from_value::<JobRequest>(job.input) {
            Ok(request) => handler.handle(request).await,
            Err(e) => Err(WorkerError::invalid_input(e.to_string())),
        };

        let report = match outcome {
            Ok(result) => self.report_done(&job.id, &result).await,
            Err(e) => {
                self.report_failed(&job.id, &format!("Error processing request: {}", e))
                    .await
            }
        };

        if let Err(e) = report {
            error!(queue_job_id = %job.id, "Failed to report job outcome: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_take_job_parses_payload() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/job-take"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "job-1",
                "input": {
                    "source_video": "https://x/file/b/v.mp4",
                    "source_audio": "https://x/file/b/a.mp3"
                }
            })))
            .mount(&server)
            .await;

        let client = QueueClient::new(server.uri(), "key");
        let job = client.take_job().await.unwrap().unwrap();

        assert_eq!(job.id, "job-1");
        let request: JobRequest = serde_json::from_value(job.input).unwrap();
        assert_eq!(request.upscale, 1);
    }

    #[tokio::test]
    async fn test_take_job_empty_queue() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/job-take"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = QueueClient::new(server.uri(), "key");
        assert!(client.take_job().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_report_done_posts_result() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/job-done/job-1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = QueueClient::new(server.uri(), "key");
        let result = JobResult {
            result_url: "https://bucket.host/media/result.mp4".to_string(),
        };
        client.report_done("job-1", &result).await.unwrap();
    }

    #[tokio::test]
    async fn test_report_failed_posts_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/job-failed/job-1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = QueueClient::new(server.uri(), "key");
        client
            .report_failed("job-1", "Error processing request: boom")
            .await
            .unwrap();
    }
}
