//! Upload acceptance and scheduling.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use vproc_events::EventPublisher;
use vproc_extractor::FrameExtractor;
use vproc_models::{
    compose_stored_name, FileInfo, Job, NewJob, ProcessingOutcome, TAG_TIMESTAMP_FORMAT,
};
use vproc_repo::JobRepository;
use vproc_storage::{StorageGateway, UploadStream};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::executor::{JobDescriptor, JobExecutor};

/// Accepted upload file extensions (case-insensitive).
const VALID_EXTENSIONS: [&str; 7] = ["mp4", "avi", "mov", "mkv", "wmv", "flv", "webm"];

fn is_valid_video_file(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VALID_EXTENSIONS.iter().any(|v| ext.eq_ignore_ascii_case(v)))
        .unwrap_or(false)
}

struct WorkQueue {
    tx: mpsc::Sender<JobDescriptor>,
    workers: Vec<JoinHandle<()>>,
}

/// The job pipeline.
///
/// Owns the bounded work queue and its worker pool; collaborators are
/// injected as capability traits. Constructed once and kept alive for the
/// lifetime of the process.
pub struct JobPipeline {
    storage: Arc<dyn StorageGateway>,
    repo: Arc<dyn JobRepository>,
    publisher: Option<Arc<dyn EventPublisher>>,
    queue: Option<WorkQueue>,
    sequence: AtomicU64,
}

impl JobPipeline {
    /// Create the pipeline and start its worker pool.
    ///
    /// With `config.workers == 0` no pool is started; jobs are then only
    /// announced through `publisher` for an out-of-process worker.
    pub fn new(
        storage: Arc<dyn StorageGateway>,
        repo: Arc<dyn JobRepository>,
        extractor: Arc<dyn FrameExtractor>,
        publisher: Option<Arc<dyn EventPublisher>>,
        config: PipelineConfig,
    ) -> Self {
        let executor = Arc::new(JobExecutor::new(storage.clone(), repo.clone(), extractor));

        let queue = (config.workers > 0).then(|| {
            let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
            let rx = Arc::new(tokio::sync::Mutex::new(rx));

            let workers = (0..config.workers)
                .map(|worker| {
                    let rx = rx.clone();
                    let executor = executor.clone();
                    tokio::spawn(async move {
                        debug!(worker, "worker started");
                        loop {
                            // The receiver lock is released before execution
                            // starts, so workers run jobs concurrently.
                            let descriptor = { rx.lock().await.recv().await };
                            match descriptor {
                                Some(descriptor) => {
                                    executor.execute(descriptor).await;
                                }
                                None => break,
                            }
                        }
                        debug!(worker, "worker stopped");
                    })
                })
                .collect();

            WorkQueue { tx, workers }
        });

        Self {
            storage,
            repo,
            publisher,
            queue,
            sequence: AtomicU64::new(0),
        }
    }

    /// Accept an upload and schedule it for processing.
    ///
    /// An unsupported extension is a validation rejection: the returned
    /// outcome is negative but the call succeeds, and neither storage nor
    /// the repository is touched. Failures of the initial save or of the
    /// job-row creation are returned as errors; after a failed creation
    /// the just-saved file is deleted so no orphaned upload remains.
    pub async fn submit(
        &self,
        user_id: i64,
        filename: &str,
        data: UploadStream,
    ) -> PipelineResult<ProcessingOutcome> {
        if !is_valid_video_file(filename) {
            return Ok(ProcessingOutcome::rejected(format!(
                "Formato de arquivo não suportado. Use: {}",
                VALID_EXTENSIONS.join(", ")
            )));
        }

        let tag = self.next_tag();
        let stored_filename = compose_stored_name(&tag, filename);
        let stored_path = self.storage.save_upload(&stored_filename, data).await?;

        let job = match self
            .repo
            .create(NewJob {
                user_id,
                filename: filename.to_string(),
                stored_filename,
            })
            .await
        {
            Ok(job) => job,
            Err(e) => {
                // Compensating action: no stored file may outlive a failed
                // row creation.
                if let Err(delete_err) = self.storage.delete_file(&stored_path).await {
                    error!(
                        path = %stored_path.display(),
                        error = %delete_err,
                        "failed to delete orphaned upload"
                    );
                }
                return Err(e.into());
            }
        };

        if let Some(queue) = &self.queue {
            let descriptor = JobDescriptor {
                job_id: job.id,
                stored_path,
                tag,
            };
            // Backpressure: a full queue blocks the submitter here instead
            // of dropping the job.
            queue
                .tx
                .send(descriptor)
                .await
                .map_err(|_| PipelineError::QueueClosed)?;
        }

        if let Some(publisher) = &self.publisher {
            if let Err(e) = publisher
                .publish_upload_event(job.id, &job.stored_filename)
                .await
            {
                // Best-effort: the job row is already committed and must
                // not be rolled back.
                warn!(job_id = %job.id, error = %e, "upload event publication failed");
            }
        }

        Ok(ProcessingOutcome::queued(
            job.id,
            "Vídeo recebido e adicionado à fila de processamento!",
        ))
    }

    /// Jobs owned by `user_id`, newest first.
    pub async fn list_for_owner(&self, user_id: i64) -> PipelineResult<Vec<Job>> {
        Ok(self.repo.find_by_owner(user_id).await?)
    }

    /// Packaged output files.
    pub async fn list_packaged(&self) -> PipelineResult<Vec<FileInfo>> {
        Ok(self.storage.list_packages().await?)
    }

    /// Stop accepting in-process work and wait for in-flight jobs to
    /// finish.
    pub async fn shutdown(self) {
        if let Some(queue) = self.queue {
            drop(queue.tx);
            for handle in queue.workers {
                if let Err(e) = handle.await {
                    error!(error = %e, "worker task panicked");
                }
            }
        }
    }

    /// Correlation tag for one submission: timestamp plus a monotonic
    /// sequence number, unique across concurrent submissions sharing a
    /// second.
    fn next_tag(&self) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let timestamp = Utc::now().format(TAG_TIMESTAMP_FORMAT);
        format!("{timestamp}_{seq}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    use async_trait::async_trait;
    use vproc_events::{EventError, EventResult};
    use vproc_extractor::ExtractorResult;
    use vproc_models::{JobId, JobStatus};
    use vproc_repo::{InMemoryJobRepository, RepoError};
    use vproc_storage::{StorageError, StorageResult};

    mockall::mock! {
        pub Storage {}

        #[async_trait]
        impl StorageGateway for Storage {
            async fn save_upload(
                &self,
                filename: &str,
                data: UploadStream,
            ) -> StorageResult<PathBuf>;
            async fn save_package(
                &self,
                package_name: &str,
                sources: &[PathBuf],
            ) -> StorageResult<()>;
            async fn delete_file(&self, path: &Path) -> StorageResult<()>;
            async fn delete_dir(&self, path: &Path) -> StorageResult<()>;
            async fn list_packages(&self) -> StorageResult<Vec<FileInfo>>;
            fn resolve_output_path(&self, name: &str) -> PathBuf;
            fn resolve_upload_path(&self, name: &str) -> PathBuf;
        }
    }

    mockall::mock! {
        pub Extractor {}

        #[async_trait]
        impl FrameExtractor for Extractor {
            async fn extract_frames(
                &self,
                media_path: &Path,
                tag: &str,
            ) -> ExtractorResult<Vec<PathBuf>>;
        }
    }

    mockall::mock! {
        pub Publisher {}

        #[async_trait]
        impl EventPublisher for Publisher {
            async fn publish_upload_event(
                &self,
                job_id: JobId,
                stored_filename: &str,
            ) -> EventResult<()>;
        }
    }

    fn stream(bytes: &'static [u8]) -> UploadStream {
        Box::new(bytes)
    }

    /// Pipeline without workers so submissions stay Pending.
    fn pipeline(
        storage: MockStorage,
        repo: Arc<InMemoryJobRepository>,
        publisher: Option<Arc<dyn EventPublisher>>,
    ) -> JobPipeline {
        JobPipeline::new(
            Arc::new(storage),
            repo,
            Arc::new(MockExtractor::new()),
            publisher,
            PipelineConfig {
                workers: 0,
                queue_capacity: 100,
            },
        )
    }

    #[tokio::test]
    async fn submit_accepts_a_video_and_creates_a_pending_job() {
        let repo = Arc::new(InMemoryJobRepository::new());
        let mut storage = MockStorage::new();
        storage
            .expect_save_upload()
            .withf(|filename, _| {
                filename.ends_with("_video.mp4")
                    && vproc_models::correlation_tag(filename).is_some()
            })
            .once()
            .returning(|filename, _| Ok(PathBuf::from("/uploads").join(filename)));

        let mut publisher = MockPublisher::new();
        publisher
            .expect_publish_upload_event()
            .withf(|job_id, filename| {
                *job_id == JobId::new(1) && filename.ends_with("_video.mp4")
            })
            .once()
            .returning(|_, _| Ok(()));

        let pipeline = pipeline(storage, repo.clone(), Some(Arc::new(publisher)));
        let outcome = pipeline
            .submit(1, "video.mp4", stream(b"fake video content"))
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.job_id, Some(JobId::new(1)));
        assert!(outcome.message.contains("fila de processamento"));

        let jobs = repo.find_by_owner(1).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].status, JobStatus::Pending);
        assert_eq!(jobs[0].filename, "video.mp4");
    }

    #[tokio::test]
    async fn unsupported_extension_is_rejected_without_side_effects() {
        // No expectations: any storage or publisher call would panic.
        let repo = Arc::new(InMemoryJobRepository::new());
        let pipeline = pipeline(MockStorage::new(), repo.clone(), None);

        let outcome = pipeline
            .submit(1, "doc.pdf", stream(b"pdf"))
            .await
            .unwrap();

        assert!(!outcome.success);
        assert!(outcome.message.contains("não suportado"));
        assert!(outcome.job_id.is_none());
        assert!(repo.find_by_owner(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_is_returned_to_the_caller() {
        let repo = Arc::new(InMemoryJobRepository::new());
        let mut storage = MockStorage::new();
        storage
            .expect_save_upload()
            .once()
            .returning(|_, _| Err(StorageError::upload_failed("disk full")));

        let pipeline = pipeline(storage, repo.clone(), None);
        let err = pipeline
            .submit(1, "video.mp4", stream(b"video"))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Storage(_)));
        assert!(repo.find_by_owner(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_row_creation_deletes_the_stored_file() {
        struct FailingRepo;

        #[async_trait]
        impl JobRepository for FailingRepo {
            async fn create(&self, _job: NewJob) -> vproc_repo::RepoResult<Job> {
                Err(RepoError::CreateFailed("db down".to_string()))
            }
            async fn update(&self, _job: &Job) -> vproc_repo::RepoResult<()> {
                unreachable!()
            }
            async fn get(&self, id: JobId) -> vproc_repo::RepoResult<Job> {
                Err(RepoError::NotFound(id))
            }
            async fn find_by_owner(&self, _user_id: i64) -> vproc_repo::RepoResult<Vec<Job>> {
                Ok(Vec::new())
            }
        }

        let mut storage = MockStorage::new();
        storage
            .expect_save_upload()
            .once()
            .returning(|filename, _| Ok(PathBuf::from("/uploads").join(filename)));
        storage
            .expect_delete_file()
            .withf(|path: &Path| path.starts_with("/uploads"))
            .once()
            .returning(|_| Ok(()));

        let pipeline = JobPipeline::new(
            Arc::new(storage),
            Arc::new(FailingRepo),
            Arc::new(MockExtractor::new()),
            None,
            PipelineConfig {
                workers: 0,
                queue_capacity: 100,
            },
        );

        let err = pipeline
            .submit(1, "video.mp4", stream(b"video"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Repo(_)));
    }

    #[tokio::test]
    async fn publication_failure_does_not_change_the_outcome() {
        let repo = Arc::new(InMemoryJobRepository::new());
        let mut storage = MockStorage::new();
        storage
            .expect_save_upload()
            .once()
            .returning(|filename, _| Ok(PathBuf::from("/uploads").join(filename)));

        let mut publisher = MockPublisher::new();
        publisher
            .expect_publish_upload_event()
            .once()
            .returning(|_, _| Err(EventError::PublishFailed("nats down".to_string())));

        let pipeline = pipeline(storage, repo.clone(), Some(Arc::new(publisher)));
        let outcome = pipeline
            .submit(1, "video.mp4", stream(b"video"))
            .await
            .unwrap();

        assert!(outcome.success);
        let jobs = repo.find_by_owner(1).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn concurrent_submissions_get_distinct_stored_names() {
        let repo = Arc::new(InMemoryJobRepository::new());
        let mut storage = MockStorage::new();
        storage
            .expect_save_upload()
            .times(2)
            .returning(|filename, _| Ok(PathBuf::from("/uploads").join(filename)));

        let pipeline = pipeline(storage, repo.clone(), None);
        pipeline
            .submit(1, "video.mp4", stream(b"a"))
            .await
            .unwrap();
        pipeline
            .submit(1, "video.mp4", stream(b"b"))
            .await
            .unwrap();

        let jobs = repo.find_by_owner(1).await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert_ne!(jobs[0].stored_filename, jobs[1].stored_filename);
    }

    #[test]
    fn extension_allow_list_is_case_insensitive() {
        let cases = [
            ("video.mp4", true),
            ("VIDEO.MP4", true),
            ("movie.avi", true),
            ("clip.mov", true),
            ("test.mkv", true),
            ("show.wmv", true),
            ("old.flv", true),
            ("modern.webm", true),
            ("document.pdf", false),
            ("image.jpg", false),
            ("archive.zip", false),
            ("noext", false),
        ];

        for (filename, want) in cases {
            assert_eq!(is_valid_video_file(filename), want, "{filename}");
        }
    }
}
