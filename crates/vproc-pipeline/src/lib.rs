//! Asynchronous upload job pipeline.
//!
//! This crate provides:
//! - [`JobPipeline`]: accepts uploads, validates them, persists a job row,
//!   and schedules execution
//! - A fixed-size worker pool consuming a bounded work queue
//! - [`JobExecutor`]: the execution routine and status state machine,
//!   shared with the out-of-process worker
//!
//! Collaborators (storage, repository, extractor, publisher) are injected
//! as capability traits at construction time; the pipeline instance owns
//! the queue and its workers for the lifetime of the process.

pub mod config;
pub mod error;
pub mod executor;
pub mod pipeline;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use executor::{JobDescriptor, JobExecutor};
pub use pipeline::JobPipeline;
