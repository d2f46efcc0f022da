//! Job repository capability trait.

use async_trait::async_trait;

use vproc_models::{Job, JobId, NewJob};

use crate::error::RepoResult;

/// Durable record of each job's identity, owner, and status.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Create a job in `Pending` status and return the stored row with its
    /// assigned identity.
    async fn create(&self, job: NewJob) -> RepoResult<Job>;

    /// Overwrite the row identified by `job.id` with the given state.
    ///
    /// Implementations reject status changes that violate the lifecycle
    /// ordering (see [`JobStatus::can_transition_to`]).
    ///
    /// [`JobStatus::can_transition_to`]: vproc_models::JobStatus::can_transition_to
    async fn update(&self, job: &Job) -> RepoResult<()>;

    /// Fetch a single job by identity.
    async fn get(&self, id: JobId) -> RepoResult<Job>;

    /// All jobs owned by `user_id`, newest first.
    async fn find_by_owner(&self, user_id: i64) -> RepoResult<Vec<Job>>;
}
