//! Upload event published when a job is created.

use serde::{Deserialize, Serialize};

use crate::job::JobId;

/// Wire-level notification that a job exists and should be processed.
///
/// Carries only the job identity and the stored filename; a consumer must
/// re-fetch job state from the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadEvent {
    pub job_id: JobId,
    pub filename: String,
}

impl UploadEvent {
    pub fn new(job_id: JobId, filename: impl Into<String>) -> Self {
        Self {
            job_id,
            filename: filename.into(),
        }
    }
}
