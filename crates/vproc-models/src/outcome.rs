//! Result of one processing attempt.

use serde::{Deserialize, Serialize};

use crate::job::JobId;

/// Outcome reported to a submitter.
///
/// For asynchronous processing this is the "queued" acknowledgement and the
/// final state is observed through the job row; for synchronous execution it
/// carries the full result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_count: Option<u32>,
}

impl ProcessingOutcome {
    /// Negative outcome with no side effects (e.g. validation rejection).
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            job_id: None,
            zip_path: None,
            frame_count: None,
        }
    }

    /// Job accepted and handed to the scheduling path.
    pub fn queued(job_id: JobId, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            job_id: Some(job_id),
            zip_path: None,
            frame_count: None,
        }
    }

    /// Execution finished successfully.
    pub fn completed(
        job_id: JobId,
        zip_path: impl Into<String>,
        frame_count: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            message: message.into(),
            job_id: Some(job_id),
            zip_path: Some(zip_path.into()),
            frame_count: Some(frame_count),
        }
    }

    /// Execution finished with a terminal failure.
    pub fn failed(job_id: JobId, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            job_id: Some(job_id),
            zip_path: None,
            frame_count: None,
        }
    }
}
