//! Upload event consumer loop.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info, warn};

use vproc_events::UploadEventStream;
use vproc_extractor::FrameExtractor;
use vproc_models::{correlation_tag, ProcessingOutcome, UploadEvent};
use vproc_pipeline::{JobDescriptor, JobExecutor};
use vproc_repo::JobRepository;
use vproc_storage::StorageGateway;

/// Worker consuming upload events and executing the jobs they announce.
pub struct UploadWorker {
    stream: UploadEventStream,
    executor: JobExecutor,
    storage: Arc<dyn StorageGateway>,
    shutdown: watch::Sender<bool>,
}

impl UploadWorker {
    pub fn new(
        stream: UploadEventStream,
        storage: Arc<dyn StorageGateway>,
        repo: Arc<dyn JobRepository>,
        extractor: Arc<dyn FrameExtractor>,
    ) -> Self {
        let executor = JobExecutor::new(storage.clone(), repo, extractor);
        let (shutdown, _) = watch::channel(false);

        Self {
            stream,
            executor,
            storage,
            shutdown,
        }
    }

    /// Consume upload events until shutdown is signalled.
    pub async fn run(&self) -> Result<()> {
        self.stream
            .init()
            .await
            .context("failed to initialize the upload event stream")?;
        info!("upload worker started");

        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("shutdown signal received, stopping worker");
                        break;
                    }
                }
                next = self.stream.read_next() => {
                    match next {
                        Ok(Some((message_id, event))) => {
                            self.process_event(&event).await;
                            if let Err(e) = self.stream.ack(&message_id).await {
                                warn!(message_id = %message_id, error = %e, "failed to acknowledge event");
                            }
                        }
                        // The blocking read timed out; poll again.
                        Ok(None) => {}
                        Err(e) => {
                            error!(error = %e, "failed to read upload events");
                            sleep(Duration::from_secs(1)).await;
                        }
                    }
                }
            }
        }

        info!("upload worker stopped");
        Ok(())
    }

    /// Signal shutdown. An in-flight job finishes before the loop exits.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Execute the job a single upload event announces.
    ///
    /// The event carries only the job identity and the stored filename;
    /// job state is re-fetched from the repository, and the upload path
    /// and correlation tag are derived from the stored filename.
    pub async fn process_event(&self, event: &UploadEvent) -> ProcessingOutcome {
        let Some(tag) = correlation_tag(&event.filename) else {
            warn!(
                job_id = %event.job_id,
                filename = %event.filename,
                "event carries a filename without a correlation tag"
            );
            return ProcessingOutcome::failed(
                event.job_id,
                format!("Erro no processamento: nome de arquivo inválido: {}", event.filename),
            );
        };

        let descriptor = JobDescriptor {
            job_id: event.job_id,
            stored_path: self.storage.resolve_upload_path(&event.filename),
            tag: tag.to_string(),
        };
        self.executor.execute(descriptor).await
    }
}
