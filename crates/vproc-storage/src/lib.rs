//! Storage gateway for uploads and packaged outputs.
//!
//! This crate provides:
//! - The [`StorageGateway`] capability trait consumed by the pipeline
//! - [`LocalStorage`], a filesystem implementation with ZIP packaging
//! - Idempotent file and directory deletion

pub mod error;
pub mod gateway;
pub mod local;

pub use error::{StorageError, StorageResult};
pub use gateway::{StorageGateway, UploadStream};
pub use local::LocalStorage;
