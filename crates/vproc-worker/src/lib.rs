//! Out-of-process upload worker.
//!
//! Consumes [`UploadEvent`](vproc_models::UploadEvent)s from the Redis
//! stream and drives the same execution routine as the in-process pool, so
//! both scheduling modes produce identical status transitions and cleanup.
//! Deployments construct an [`UploadWorker`] with their storage,
//! repository, and extractor adapters and call [`UploadWorker::run`].

pub mod worker;

pub use worker::UploadWorker;
