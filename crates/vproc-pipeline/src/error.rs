//! Pipeline error types.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("storage error: {0}")]
    Storage(#[from] vproc_storage::StorageError),

    #[error("repository error: {0}")]
    Repo(#[from] vproc_repo::RepoError),

    #[error("work queue is closed")]
    QueueClosed,
}
