//! Local filesystem storage implementation.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::debug;

use vproc_models::FileInfo;

use crate::error::{StorageError, StorageResult};
use crate::gateway::{StorageGateway, UploadStream};

/// Filesystem storage gateway.
///
/// Uploads land in `uploads_dir`, packaged archives in `outputs_dir`. Both
/// directories are created at construction time.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    uploads_dir: PathBuf,
    outputs_dir: PathBuf,
}

impl LocalStorage {
    pub async fn new(
        uploads_dir: impl Into<PathBuf>,
        outputs_dir: impl Into<PathBuf>,
    ) -> StorageResult<Self> {
        let uploads_dir = uploads_dir.into();
        let outputs_dir = outputs_dir.into();

        for dir in [&uploads_dir, &outputs_dir] {
            fs::create_dir_all(dir).await.map_err(|e| {
                StorageError::upload_failed(format!(
                    "failed to create storage directory {}: {e}",
                    dir.display()
                ))
            })?;
        }

        Ok(Self {
            uploads_dir,
            outputs_dir,
        })
    }

    /// Reject names that would escape the storage directories.
    fn sanitize<'a>(&self, name: &'a str) -> StorageResult<&'a str> {
        if name.is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name.contains("..")
        {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(name)
    }
}

#[async_trait]
impl StorageGateway for LocalStorage {
    async fn save_upload(&self, filename: &str, data: UploadStream) -> StorageResult<PathBuf> {
        let name = self.sanitize(filename)?;
        let path = self.uploads_dir.join(name);

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::upload_failed(format!("failed to create {}: {e}", path.display()))
        })?;

        let mut data = data;
        let written = tokio::io::copy(&mut data, &mut file).await.map_err(|e| {
            StorageError::upload_failed(format!("failed to write {}: {e}", path.display()))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::upload_failed(format!("failed to sync {}: {e}", path.display()))
        })?;

        debug!(path = %path.display(), bytes = written, "upload stored");
        Ok(path)
    }

    async fn save_package(&self, package_name: &str, sources: &[PathBuf]) -> StorageResult<()> {
        let name = self.sanitize(package_name)?;
        let dest = self.outputs_dir.join(name);
        let sources = sources.to_vec();

        // The zip writer is synchronous; archive on the blocking pool.
        let entries = tokio::task::spawn_blocking(move || write_zip(&dest, &sources))
            .await
            .map_err(|e| StorageError::package_failed(format!("packaging task aborted: {e}")))??;

        debug!(package = name, entries, "package written");
        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> StorageResult<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "{}: {e}",
                path.display()
            ))),
        }
    }

    async fn delete_dir(&self, path: &Path) -> StorageResult<()> {
        match fs::remove_dir_all(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "{}: {e}",
                path.display()
            ))),
        }
    }

    async fn list_packages(&self) -> StorageResult<Vec<FileInfo>> {
        let mut entries = fs::read_dir(&self.outputs_dir)
            .await
            .map_err(|e| StorageError::ListFailed(e.to_string()))?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::ListFailed(e.to_string()))?
        {
            let meta = entry
                .metadata()
                .await
                .map_err(|e| StorageError::ListFailed(e.to_string()))?;
            if !meta.is_file() {
                continue;
            }

            // Creation time is unavailable on some filesystems.
            let created_at = meta
                .created()
                .or_else(|_| meta.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            files.push(FileInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: meta.len(),
                created_at,
            });
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    fn resolve_output_path(&self, name: &str) -> PathBuf {
        self.outputs_dir.join(name)
    }

    fn resolve_upload_path(&self, name: &str) -> PathBuf {
        self.uploads_dir.join(name)
    }
}

/// Write `sources` into a ZIP archive at `dest`, returning the entry count.
fn write_zip(dest: &Path, sources: &[PathBuf]) -> StorageResult<usize> {
    use zip::write::{FileOptions, ZipWriter};
    use zip::CompressionMethod;

    let file = std::fs::File::create(dest).map_err(|e| {
        StorageError::package_failed(format!("failed to create {}: {e}", dest.display()))
    })?;
    let mut archive = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for (index, source) in sources.iter().enumerate() {
        let data = std::fs::read(source).map_err(|e| {
            StorageError::package_failed(format!("failed to read {}: {e}", source.display()))
        })?;

        let entry = entry_name(source, index);
        archive.start_file(&entry, options).map_err(|e| {
            StorageError::package_failed(format!("failed to add {entry}: {e}"))
        })?;
        archive.write_all(&data).map_err(|e| {
            StorageError::package_failed(format!("failed to write {entry}: {e}"))
        })?;
    }

    archive
        .finish()
        .map_err(|e| StorageError::package_failed(format!("failed to finalize archive: {e}")))?;
    Ok(sources.len())
}

/// Archive entry name for a source path. Strips directory components so a
/// crafted path cannot traverse outside the archive root.
fn entry_name(path: &Path, index: usize) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| format!("frame_{index}"))
}
