//! Extractor error types.

use std::path::PathBuf;

use thiserror::Error;

pub type ExtractorResult<T> = Result<T, ExtractorError>;

#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("extraction failed: {message}")]
    ExtractionFailed {
        message: String,
        exit_code: Option<i32>,
    },

    #[error("invalid video file: {0}")]
    InvalidVideo(String),

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractorError {
    pub fn extraction_failed(message: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self::ExtractionFailed {
            message: message.into(),
            exit_code,
        }
    }
}
