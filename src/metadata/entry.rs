//! Metadata entry types

use serde::{Deserialize, Serialize};

/// Version and content type recorded for one document or folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Starts at 1 on first write, +1 on every update.
    pub version: u64,
    /// Set for documents only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl MetadataEntry {
    pub fn first(content_type: Option<String>) -> Self {
        Self {
            version: 1,
            content_type,
        }
    }

    /// The entry after one more update, or `None` if the version would overflow.
    pub fn next(&self, content_type: Option<String>) -> Option<Self> {
        Some(Self {
            version: self.version.checked_add(1)?,
            content_type,
        })
    }
}
