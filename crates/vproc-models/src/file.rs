//! Output file metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for a packaged output file, as returned by storage listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    #[serde(rename = "filename")]
    pub name: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}
