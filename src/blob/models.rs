//! Data models for blob storage operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Information about a stored blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobInfo {
    pub name: String,
    pub size: u64,
    pub content_type: String,
    pub last_modified: DateTime<Utc>,
    pub etag: String,
}

/// Entry of a hierarchical container listing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BlobListItem {
    /// Virtual directory; `prefix` ends with `/`
    Directory { prefix: String },
    Blob(BlobInfo),
}

impl BlobListItem {
    pub fn name(&self) -> &str {
        match self {
            Self::Directory { prefix } => prefix,
            Self::Blob(info) => &info.name,
        }
    }
}

/// Order a listing for display: directories first, then blobs, each by name.
pub fn sort_listing(items: &mut [BlobListItem]) {
    items.sort_by(|a, b| {
        let a_dir = matches!(a, BlobListItem::Directory { .. });
        let b_dir = matches!(b, BlobListItem::Directory { .. });
        b_dir.cmp(&a_dir).then_with(|| a.name().cmp(b.name()))
    });
}
