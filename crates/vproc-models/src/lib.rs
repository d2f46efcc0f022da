//! Shared data models for the vproc backend.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs and their status lifecycle
//! - Processing outcomes returned to submitters
//! - Upload events published for out-of-process workers
//! - Output file metadata and stored-filename naming

pub mod event;
pub mod file;
pub mod job;
pub mod naming;
pub mod outcome;

// Re-export common types
pub use event::UploadEvent;
pub use file::FileInfo;
pub use job::{Job, JobId, JobStatus, NewJob};
pub use naming::{compose_stored_name, correlation_tag, package_name, TAG_TIMESTAMP_FORMAT};
pub use outcome::ProcessingOutcome;
