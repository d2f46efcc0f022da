//! Storage error types.

use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("packaging failed: {0}")]
    PackageFailed(String),

    #[error("delete failed: {0}")]
    DeleteFailed(String),

    #[error("listing failed: {0}")]
    ListFailed(String),

    #[error("invalid filename: {0}")]
    InvalidName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn upload_failed(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }

    pub fn package_failed(msg: impl Into<String>) -> Self {
        Self::PackageFailed(msg.into())
    }
}
