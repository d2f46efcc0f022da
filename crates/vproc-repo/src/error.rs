//! Repository error types.

use thiserror::Error;

use vproc_models::JobId;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("job {0} not found")]
    NotFound(JobId),

    #[error("create failed: {0}")]
    CreateFailed(String),

    #[error("update failed: {0}")]
    UpdateFailed(String),

    #[error("query failed: {0}")]
    QueryFailed(String),
}
