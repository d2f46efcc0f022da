//! Job execution and the status state machine.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, warn};

use vproc_extractor::FrameExtractor;
use vproc_models::{package_name, Job, JobId, JobStatus, ProcessingOutcome};
use vproc_repo::JobRepository;
use vproc_storage::StorageGateway;

/// Work-queue entry describing one scheduled job.
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    pub job_id: JobId,
    /// Path of the stored upload.
    pub stored_path: PathBuf,
    /// Correlation tag naming the output package and scratch directory.
    pub tag: String,
}

/// Attempts to persist one status change before the row is left stale.
const STATUS_PERSIST_ATTEMPTS: u32 = 3;

/// Cap on the backoff between status persist attempts.
const MAX_STATUS_RETRY_BACKOFF_MS: u64 = 2000;

fn status_retry_backoff(attempt: u32) -> Duration {
    Duration::from_millis((100 * 2_u64.pow(attempt)).min(MAX_STATUS_RETRY_BACKOFF_MS))
}

/// Executes one job at a time against the storage, repository, and
/// extractor contracts.
///
/// Shared by the in-process worker pool and the out-of-process worker;
/// both produce identical status transitions and cleanup.
pub struct JobExecutor {
    storage: Arc<dyn StorageGateway>,
    repo: Arc<dyn JobRepository>,
    extractor: Arc<dyn FrameExtractor>,
}

impl JobExecutor {
    pub fn new(
        storage: Arc<dyn StorageGateway>,
        repo: Arc<dyn JobRepository>,
        extractor: Arc<dyn FrameExtractor>,
    ) -> Self {
        Self {
            storage,
            repo,
            extractor,
        }
    }

    /// Run one job to a terminal state.
    ///
    /// Never returns an error: asynchronous failures are only visible
    /// through the persisted job row, and the returned outcome serves
    /// callers that execute synchronously.
    pub async fn execute(&self, descriptor: JobDescriptor) -> ProcessingOutcome {
        let JobDescriptor {
            job_id,
            stored_path,
            tag,
        } = descriptor;

        let mut job = match self.repo.get(job_id).await {
            Ok(job) => job,
            Err(e) => {
                error!(%job_id, error = %e, "job not found at execution start");
                return ProcessingOutcome::failed(job_id, format!("Erro no processamento: {e}"));
            }
        };

        // Persist Processing immediately so a concurrent status query
        // observes the in-flight work.
        job.status = JobStatus::Processing;
        self.persist(&job).await;

        let frames = match self.extractor.extract_frames(&stored_path, &tag).await {
            Ok(frames) => frames,
            Err(e) => {
                // The extractor has already cleaned its partial output;
                // only the upload file remains to remove.
                return self
                    .fail(job, format!("Erro no processamento: {e}"), &stored_path)
                    .await;
            }
        };

        let package = package_name(&tag);
        if let Err(e) = self.storage.save_package(&package, &frames).await {
            return self
                .fail(job, format!("Erro ao criar ZIP: {e}"), &stored_path)
                .await;
        }

        // The job already succeeded from the caller's perspective; cleanup
        // of the upload and the extractor scratch directory is best-effort.
        self.cleanup_file(&stored_path).await;
        if let Some(scratch) = frames.first().and_then(|f| f.parent()) {
            self.cleanup_dir(scratch).await;
        }

        let count = frames.len() as u32;
        job.status = JobStatus::Completed;
        job.zip_path = Some(package.clone());
        job.frame_count = Some(count);
        job.message = format!("Processamento concluído! {count} frames extraídos.");
        self.persist(&job).await;

        info!(%job_id, frames = count, package = %package, "job completed");
        ProcessingOutcome::completed(job_id, package, count, job.message)
    }

    async fn fail(
        &self,
        mut job: Job,
        message: String,
        stored_path: &Path,
    ) -> ProcessingOutcome {
        job.status = JobStatus::Failed;
        job.message = message.clone();
        self.persist(&job).await;
        self.cleanup_file(stored_path).await;

        warn!(job_id = %job.id, message = %message, "job failed");
        ProcessingOutcome::failed(job.id, message)
    }

    /// Persist a status change with a bounded retry. Exhaustion leaves the
    /// row stale; the inconsistency is logged and accepted.
    async fn persist(&self, job: &Job) {
        for attempt in 0..STATUS_PERSIST_ATTEMPTS {
            match self.repo.update(job).await {
                Ok(()) => return,
                Err(e) if attempt + 1 < STATUS_PERSIST_ATTEMPTS => {
                    warn!(
                        job_id = %job.id,
                        status = %job.status,
                        attempt,
                        error = %e,
                        "status persist failed, retrying"
                    );
                    sleep(status_retry_backoff(attempt)).await;
                }
                Err(e) => {
                    error!(
                        job_id = %job.id,
                        status = %job.status,
                        error = %e,
                        "status persist failed, row left stale"
                    );
                }
            }
        }
    }

    async fn cleanup_file(&self, path: &Path) {
        if let Err(e) = self.storage.delete_file(path).await {
            warn!(path = %path.display(), error = %e, "failed to delete upload file");
        }
    }

    async fn cleanup_dir(&self, path: &Path) {
        if let Err(e) = self.storage.delete_dir(path).await {
            warn!(path = %path.display(), error = %e, "failed to delete scratch directory");
        }
    }
}
