//! In-memory document store
//!
//! Same contract as the filesystem store over a sorted map. Folders exist
//! implicitly while at least one document lives below them.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::document::store::{DocumentStore, FolderEntries};
use crate::error::DocumentError;
use crate::path::{PathKind, StoragePath};

#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<BTreeMap<StoragePath, Vec<u8>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn has_descendants(documents: &BTreeMap<StoragePath, Vec<u8>>, folder: &StoragePath) -> bool {
    documents
        .keys()
        .any(|key| key.as_str().starts_with(folder.as_str()))
}

impl DocumentStore for MemoryDocumentStore {
    fn put_document(&self, path: &StoragePath, data: &[u8]) -> Result<Vec<StoragePath>, DocumentError> {
        if !path.is_document() {
            return Err(DocumentError::NotADocument(path.to_string()));
        }

        let mut documents = self
            .documents
            .write()
            .map_err(|_| DocumentError::LockPoisoned)?;

        // A name is either a document or a folder, never both.
        let as_folder = format!("{}/", path.as_str());
        if documents.keys().any(|key| key.as_str().starts_with(&as_folder)) {
            return Err(DocumentError::NotADocument(path.to_string()));
        }
        for folder in path.folder_tree_from_module_root() {
            let as_document = folder.as_str().trim_end_matches('/');
            if documents.keys().any(|key| key.as_str() == as_document) {
                return Err(DocumentError::NotAFolder(folder.to_string()));
            }
        }

        documents.insert(path.clone(), data.to_vec());
        Ok(path.folder_tree_from_root())
    }

    fn delete_document(&self, path: &StoragePath) -> Result<Vec<StoragePath>, DocumentError> {
        let mut documents = self
            .documents
            .write()
            .map_err(|_| DocumentError::LockPoisoned)?;
        if documents.remove(path).is_none() {
            return Err(DocumentError::NotFound(path.to_string()));
        }

        let mut deleted = vec![path.clone()];
        for folder in path.folder_tree_from_module_root().into_iter().rev() {
            if has_descendants(&documents, &folder) {
                break;
            }
            deleted.push(folder);
        }
        Ok(deleted)
    }

    fn get_document(&self, path: &StoragePath) -> Result<Vec<u8>, DocumentError> {
        let documents = self
            .documents
            .read()
            .map_err(|_| DocumentError::LockPoisoned)?;
        documents
            .get(path)
            .cloned()
            .ok_or_else(|| DocumentError::NotFound(path.to_string()))
    }

    fn get_folder(&self, path: &StoragePath) -> Result<FolderEntries, DocumentError> {
        if !path.is_folder() {
            return Err(DocumentError::NotAFolder(path.to_string()));
        }

        let documents = self
            .documents
            .read()
            .map_err(|_| DocumentError::LockPoisoned)?;
        let prefix = path.as_str();

        let mut listing = FolderEntries::new();
        for key in documents.keys() {
            let Some(rest) = key.as_str().strip_prefix(prefix) else {
                continue;
            };
            match rest.find('/') {
                Some(end) => listing.insert(rest[..=end].to_string(), PathKind::Folder),
                None => listing.insert(rest.to_string(), PathKind::Document),
            };
        }
        Ok(listing)
    }
}
