//! Document store contract

use std::collections::BTreeMap;

use crate::error::DocumentError;
use crate::path::{PathKind, StoragePath};

/// Children of a folder, keyed by listing name (`foo.txt`, `bar/`).
pub type FolderEntries = BTreeMap<String, PathKind>;

/// Persistent mapping from document path to bytes.
pub trait DocumentStore: Send + Sync {
    /// Stores `data` at `path` and returns every folder whose listing changed,
    /// at least `path.folder_tree_from_root()`.
    fn put_document(&self, path: &StoragePath, data: &[u8]) -> Result<Vec<StoragePath>, DocumentError>;

    /// Removes the document and returns it together with every folder removed
    /// because it became empty.
    fn delete_document(&self, path: &StoragePath) -> Result<Vec<StoragePath>, DocumentError>;

    fn get_document(&self, path: &StoragePath) -> Result<Vec<u8>, DocumentError>;

    /// Lists the children of a folder. A folder that does not exist is empty.
    fn get_folder(&self, path: &StoragePath) -> Result<FolderEntries, DocumentError>;
}
