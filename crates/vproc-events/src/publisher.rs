//! Event publisher capability trait.

use async_trait::async_trait;

use vproc_models::JobId;

use crate::error::EventResult;

/// Best-effort notification channel announcing "a job exists and should be
/// processed".
///
/// The pipeline logs a non-ok result and moves on; a failed publish never
/// alters the outcome of the submit that triggered it and never rolls back
/// the already-committed job row.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish_upload_event(
        &self,
        job_id: JobId,
        stored_filename: &str,
    ) -> EventResult<()>;
}

/// Publisher that drops every event. Stands in when no out-of-process
/// consumer is deployed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventPublisher;

#[async_trait]
impl EventPublisher for NoopEventPublisher {
    async fn publish_upload_event(
        &self,
        _job_id: JobId,
        _stored_filename: &str,
    ) -> EventResult<()> {
        Ok(())
    }
}
