//! Metadata store contract and its table-backed implementation

use log::debug;
use std::sync::Arc;

use crate::error::MetadataError;
use crate::metadata::database::MetadataDatabase;
use crate::metadata::entry::MetadataEntry;
use crate::path::StoragePath;

/// Persistent mapping from path to (version, content type).
///
/// Every update bumps the version by exactly one; increments on the same path
/// must be atomic so concurrent writers never skip or repeat a version.
pub trait MetadataStore: Send + Sync {
    fn get_entry(&self, path: &StoragePath) -> Result<Option<MetadataEntry>, MetadataError>;

    fn get_version(&self, path: &StoragePath) -> Result<Option<u64>, MetadataError> {
        Ok(self.get_entry(path)?.map(|entry| entry.version))
    }

    fn get_content_type(&self, path: &StoragePath) -> Result<Option<String>, MetadataError> {
        Ok(self.get_entry(path)?.and_then(|entry| entry.content_type))
    }

    /// Creates the entry at version 1 or bumps it, replacing the content type.
    /// Returns the new version.
    fn update_document(&self, path: &StoragePath, content_type: &str) -> Result<u64, MetadataError>;

    /// Creates the entry at version 1 or bumps it. Never sets a content type.
    fn update_folder(&self, path: &StoragePath) -> Result<u64, MetadataError>;

    /// Removes the entry. Removing a missing entry succeeds.
    fn delete_entry(&self, path: &StoragePath) -> Result<(), MetadataError>;
}

/// [`MetadataStore`] over a shared [`MetadataDatabase`].
#[derive(Clone)]
pub struct DatabaseMetadataStore {
    database: Arc<MetadataDatabase>,
}

impl DatabaseMetadataStore {
    pub fn new(database: Arc<MetadataDatabase>) -> Self {
        Self { database }
    }

    pub fn database(&self) -> &Arc<MetadataDatabase> {
        &self.database
    }
}

fn bump(
    path: &StoragePath,
    current: Option<&MetadataEntry>,
    content_type: Option<String>,
) -> Result<MetadataEntry, MetadataError> {
    match current {
        None => Ok(MetadataEntry::first(content_type)),
        Some(entry) => entry
            .next(content_type)
            .ok_or_else(|| MetadataError::VersionOverflow(path.to_string())),
    }
}

impl MetadataStore for DatabaseMetadataStore {
    fn get_entry(&self, path: &StoragePath) -> Result<Option<MetadataEntry>, MetadataError> {
        self.database.get(path.as_str())
    }

    fn update_document(&self, path: &StoragePath, content_type: &str) -> Result<u64, MetadataError> {
        let entry = self.database.update(path.as_str(), |current| {
            bump(path, current, Some(content_type.to_string()))
        })?;
        debug!("Document {} at version {}", path, entry.version);
        Ok(entry.version)
    }

    fn update_folder(&self, path: &StoragePath) -> Result<u64, MetadataError> {
        let entry = self.database.update(path.as_str(), |current| {
            let content_type = current.and_then(|entry| entry.content_type.clone());
            bump(path, current, content_type)
        })?;
        debug!("Folder {} at version {}", path, entry.version);
        Ok(entry.version)
    }

    fn delete_entry(&self, path: &StoragePath) -> Result<(), MetadataError> {
        if self.database.remove(path.as_str())? {
            debug!("Removed metadata for {}", path);
        }
        Ok(())
    }
}
