//! Folder description documents

use serde::Serialize;
use std::collections::BTreeMap;

/// `@context` marker of a remoteStorage folder description.
pub const FOLDER_DESCRIPTION_CONTEXT: &str = "http://remotestorage.io/spec/folder-description";

/// Content type under which a serialized listing is served.
pub const FOLDER_DESCRIPTION_CONTENT_TYPE: &str = "application/ld+json";

/// One child in a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingItem {
    /// `null` when the child has no metadata entry.
    #[serde(rename = "ETag")]
    pub etag: Option<u64>,
    /// Documents only; never present for sub-folders.
    #[serde(rename = "Content-Type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderListing {
    #[serde(rename = "@context")]
    pub context: &'static str,
    pub items: BTreeMap<String, ListingItem>,
}

impl FolderListing {
    pub fn new(items: BTreeMap<String, ListingItem>) -> Self {
        Self {
            context: FOLDER_DESCRIPTION_CONTEXT,
            items,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
