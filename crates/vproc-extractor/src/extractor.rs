//! Frame extractor capability trait.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::ExtractorResult;

/// Black-box transformation step that turns a stored media file into a
/// sequence of frame files.
///
/// Contract:
/// - On error, any partial on-disk output attributable to the call has
///   already been cleaned up by the extractor itself; the caller only
///   removes the uploaded media file.
/// - On success, every returned path exists and all paths share a common
///   parent directory: the job's scratch directory, which the caller
///   removes after packaging.
/// - An empty output sequence without an error is a valid result.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Extract frames from the media at `media_path`. The correlation `tag`
    /// names the scratch directory deterministically.
    async fn extract_frames(&self, media_path: &Path, tag: &str)
        -> ExtractorResult<Vec<PathBuf>>;
}
