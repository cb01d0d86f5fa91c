//! The job handler: validate, download, reconcile, infer, upload, clean up.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};
use validator::Validate;

use lipsync_media::{probe_duration, reconcile_duration};
use lipsync_models::{
    storage_key_from_url, InferenceArgs, JobId, JobRequest, JobResult, JobStage,
    DEFAULT_START_FRAME,
};
use lipsync_pipeline::LipsyncPipeline;
use lipsync_storage::ObjectStore;

use crate::error::{WorkerError, WorkerResult};

/// Handles one job end to end.
///
/// Generic over the storage and pipeline seams; both are externally
/// supplied capabilities.
pub struct JobHandler<S, P> {
    store: S,
    pipeline: P,
    work_root: PathBuf,
}

impl<S: ObjectStore, P: LipsyncPipeline> JobHandler<S, P> {
    pub fn new(store: S, pipeline: P, work_root: impl AsRef<Path>) -> Self {
        Self {
            store,
            pipeline,
            work_root: work_root.as_ref().to_path_buf(),
        }
    }

    /// Process a job request and return the result URL.
    ///
    /// Validation happens before any side effect. Each job gets a fresh
    /// uniquely-named working directory, removed best-effort on both the
    /// success and failure paths.
    pub async fn handle(&self, request: JobRequest) -> WorkerResult<JobResult> {
        let job_id = JobId::new();
        info!(job_id = %job_id, stage = %JobStage::Received, "Job received");

        // Reject malformed input before touching storage or disk.
        request
            .validate()
            .map_err(|e| WorkerError::invalid_input(e.to_string()))?;
        let video_key = storage_key_from_url(&request.source_video)
            .map_err(|e| WorkerError::invalid_input(e.to_string()))?;
        let audio_key = storage_key_from_url(&request.source_audio)
            .map_err(|e| WorkerError::invalid_input(e.to_string()))?;
        info!(job_id = %job_id, stage = %JobStage::Validated, "Input validated");

        let work_dir = self.work_root.join(format!("lipsync_{}", job_id));

        let result = self
            .run_job(&job_id, &request, &video_key, &audio_key, &work_dir)
            .await;

        // Best-effort cleanup on both paths; a crash before this point
        // leaves the directory behind.
        if work_dir.exists() {
            if let Err(e) = tokio::fs::remove_dir_all(&work_dir).await {
                warn!(job_id = %job_id, "Failed to remove working directory: {}", e);
            }
        }

        match result {
            Ok(result) => {
                info!(job_id = %job_id, stage = %JobStage::CleanedUp, "Job completed: {}", result.result_url);
                Ok(result)
            }
            Err(e) => {
                error!(job_id = %job_id, stage = %JobStage::Failed, "Job failed: {}", e);
                Err(e)
            }
        }
    }

    async fn run_job(
        &self,
        job_id: &JobId,
        request: &JobRequest,
        video_key: &str,
        audio_key: &str,
        work_dir: &Path,
    ) -> WorkerResult<JobResult> {
        tokio::fs::create_dir_all(work_dir).await?;

        info!(job_id = %job_id, stage = %JobStage::Downloading, "Downloading sources");
        let video_path = work_dir.join("video.mp4");
        let audio_path = work_dir.join("audio.mp3");
        self.store.get_file(video_key, &video_path).await?;
        self.store.get_file(audio_key, &audio_path).await?;

        info!(job_id = %job_id, stage = %JobStage::Reconciling, "Reconciling video duration");
        let audio_duration = probe_duration(&audio_path).await?;
        let reconciled =
            reconcile_duration(&video_path, work_dir, audio_duration, DEFAULT_START_FRAME).await?;

        info!(job_id = %job_id, stage = %JobStage::Inferring, "Running inference");
        let out_path = work_dir.join("result.mp4");
        let args = InferenceArgs::for_request(request, &reconciled, &audio_path, &out_path);
        let produced = self.pipeline.run(&args).await?;

        info!(job_id = %job_id, stage = %JobStage::Uploading, "Uploading result");
        let result_key = result_key_for(video_key);
        self.store.put_file(&produced, &result_key).await?;
        let result_url = self.store.url_for(&result_key).await?;

        Ok(JobResult { result_url })
    }
}

/// Key the result is uploaded under: `result.mp4` next to the source video.
fn result_key_for(video_key: &str) -> String {
    match video_key.rsplit_once('/') {
        Some((dir, _)) => format!("{}/result.mp4", dir),
        None => "result.mp4".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use lipsync_pipeline::{PipelineError, PipelineResult};
    use lipsync_storage::{StorageError, StorageResult};

    /// Store double that only counts how often it is touched.
    #[derive(Default)]
    struct CountingStore {
        calls: AtomicUsize,
    }

    impl CountingStore {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ObjectStore for CountingStore {
        async fn put_file(&self, _path: &Path, _key: &str) -> StorageResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn get_file(&self, key: &str, _path: &Path) -> StorageResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::not_found(key))
        }

        async fn list_keys(&self, _prefix: &str) -> StorageResult<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn delete_prefix(&self, _prefix: &str) -> StorageResult<u32> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(0)
        }

        async fn url_for(&self, key: &str) -> StorageResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("memory://{}", key))
        }
    }

    struct NeverPipeline;

    #[async_trait]
    impl LipsyncPipeline for NeverPipeline {
        async fn run(&self, args: &lipsync_models::InferenceArgs) -> PipelineResult<PathBuf> {
            Err(PipelineError::OutputMissing(args.video_out_path.clone()))
        }
    }

    fn handler_with_counting_store() -> (JobHandler<CountingStore, NeverPipeline>, PathBuf) {
        let work_root = std::env::temp_dir().join("lipsync-handler-tests");
        (
            JobHandler::new(CountingStore::default(), NeverPipeline, &work_root),
            work_root,
        )
    }

    #[tokio::test]
    async fn test_out_of_range_fidelity_rejected_before_storage() {
        let (handler, _) = handler_with_counting_store();

        let mut request = JobRequest::new(
            "https://f004.backblazeb2.com/file/bucket/media/v.mp4",
            "https://f004.backblazeb2.com/file/bucket/media/a.mp3",
        );
        request.codeformer_fidelity = 1.5;

        let err = handler.handle(request).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(handler.store.calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_source_url_rejected_before_storage() {
        let (handler, _) = handler_with_counting_store();

        let request = JobRequest::new(
            "https://example.com/not-a-bucket-url.mp4",
            "https://f004.backblazeb2.com/file/bucket/media/a.mp3",
        );

        let err = handler.handle(request).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(handler.store.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_source_object_fails_job() {
        let (handler, _) = handler_with_counting_store();

        let request = JobRequest::new(
            "https://f004.backblazeb2.com/file/bucket/media/v.mp4",
            "https://f004.backblazeb2.com/file/bucket/media/a.mp3",
        );

        let err = handler.handle(request).await.unwrap_err();
        assert!(matches!(err, WorkerError::Storage(StorageError::NotFound(_))));
        // The download was attempted, nothing after it
        assert_eq!(handler.store.calls(), 1);
    }

    #[test]
    fn test_result_key_next_to_video() {
        assert_eq!(result_key_for("media/jobs/v.mp4"), "media/jobs/result.mp4");
        assert_eq!(result_key_for("v.mp4"), "result.mp4");
    }
}
