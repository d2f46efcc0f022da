//! Storage capability trait.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncRead;

use vproc_models::FileInfo;

use crate::error::StorageResult;

/// Boxed byte stream accepted by [`StorageGateway::save_upload`].
pub type UploadStream = Box<dyn AsyncRead + Send + Unpin>;

/// Durable byte storage for uploads and packaged outputs.
///
/// The pipeline treats every operation as fallible and assumes nothing
/// beyond "the call returned without error". Implementations provide their
/// own internal concurrency safety; the pipeline issues independent,
/// per-job calls only.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Persist an upload stream under `filename` and return the path the
    /// bytes were stored at.
    async fn save_upload(&self, filename: &str, data: UploadStream) -> StorageResult<PathBuf>;

    /// Package `sources` into a single archive named `package_name` in the
    /// output area. An empty source list produces a valid empty archive.
    async fn save_package(&self, package_name: &str, sources: &[PathBuf]) -> StorageResult<()>;

    /// Delete a stored file. Deleting a missing path is not an error.
    async fn delete_file(&self, path: &Path) -> StorageResult<()>;

    /// Recursively delete a directory. Deleting a missing path is not an
    /// error.
    async fn delete_dir(&self, path: &Path) -> StorageResult<()>;

    /// List packaged output files.
    async fn list_packages(&self) -> StorageResult<Vec<FileInfo>>;

    /// Path a packaged output named `name` resolves to.
    fn resolve_output_path(&self, name: &str) -> PathBuf;

    /// Path a stored upload named `name` resolves to.
    fn resolve_upload_path(&self, name: &str) -> PathBuf;
}
