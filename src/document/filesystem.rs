//! Filesystem document store
//!
//! Maps `/user/[public/]module/...` onto `<root>/user/[public/]module/...`.
//! Uploads are written to a temporary sibling file first, then renamed into
//! place, so readers never observe a partial document.

use log::{error, info, warn};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::document::store::{DocumentStore, FolderEntries};
use crate::error::DocumentError;
use crate::path::validation::is_safe_segment;
use crate::path::{PathKind, StoragePath};

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_MS: u64 = 100;

/// Prefix of in-flight upload files; hidden from listings.
pub const TEMP_PREFIX: &str = ".upload-";

pub struct FilesystemDocumentStore {
    root: PathBuf,
}

impl FilesystemDocumentStore {
    /// Opens the store, creating `root` if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, DocumentError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        info!("Document root directory: {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn real_path(&self, path: &StoragePath) -> PathBuf {
        let mut real = self.root.clone();
        for segment in path.as_str().split('/').filter(|s| !s.is_empty()) {
            real.push(segment);
        }
        real
    }

    fn is_file(real: &Path) -> bool {
        fs::metadata(real).map(|m| m.is_file()).unwrap_or(false)
    }

    fn is_empty_dir(real: &Path) -> io::Result<bool> {
        Ok(fs::read_dir(real)?.next().is_none())
    }
}

/// Runs `op`, retrying transient permission errors with a linear backoff.
fn with_retries<T>(what: &str, mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut attempt = 1;
    loop {
        match op() {
            Err(e) if attempt < MAX_RETRIES && e.kind() == io::ErrorKind::PermissionDenied => {
                warn!(
                    "Transient error during {} (attempt {}/{}): {}. Retrying...",
                    what, attempt, MAX_RETRIES, e
                );
                thread::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64));
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Writes into a fresh temporary file beside `real`, then renames it over
/// `real`. Each write gets its own temporary file; the last rename wins.
fn write_atomically(real: &Path, data: &[u8]) -> io::Result<()> {
    let parent = real
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "document has no parent"))?;

    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(parent)?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;
    temp.persist(real).map_err(|e| e.error)?;
    Ok(())
}

impl DocumentStore for FilesystemDocumentStore {
    fn put_document(&self, path: &StoragePath, data: &[u8]) -> Result<Vec<StoragePath>, DocumentError> {
        if !path.is_document() {
            return Err(DocumentError::NotADocument(path.to_string()));
        }

        let real = self.real_path(path);
        if real.is_dir() {
            return Err(DocumentError::NotADocument(path.to_string()));
        }
        for folder in path.folder_tree_from_module_root() {
            if Self::is_file(&self.real_path(&folder)) {
                return Err(DocumentError::NotAFolder(folder.to_string()));
            }
        }
        if let Some(parent) = real.parent() {
            fs::create_dir_all(parent)?;
        }

        with_retries("document write", || write_atomically(&real, data)).map_err(|e| {
            error!("Failed to store {} (real: {}): {}", path, real.display(), e);
            DocumentError::from(e)
        })?;

        info!(
            "Stored {} ({} bytes, real: {})",
            path,
            data.len(),
            real.display()
        );
        Ok(path.folder_tree_from_root())
    }

    fn delete_document(&self, path: &StoragePath) -> Result<Vec<StoragePath>, DocumentError> {
        if !path.is_document() {
            return Err(DocumentError::NotADocument(path.to_string()));
        }

        let real = self.real_path(path);
        if !Self::is_file(&real) {
            return Err(DocumentError::NotFound(path.to_string()));
        }

        with_retries("document delete", || fs::remove_file(&real)).map_err(|e| {
            error!("Failed to delete {} (real: {}): {}", path, real.display(), e);
            DocumentError::from(e)
        })?;

        let mut deleted = vec![path.clone()];

        // Prune folders that became empty, stopping at the first one still in use.
        for folder in path.folder_tree_from_module_root().into_iter().rev() {
            let real_folder = self.real_path(&folder);
            match Self::is_empty_dir(&real_folder).and_then(|empty| {
                if empty {
                    fs::remove_dir(&real_folder).map(|_| true)
                } else {
                    Ok(false)
                }
            }) {
                Ok(true) => deleted.push(folder),
                Ok(false) => break,
                Err(e) => {
                    warn!("Could not prune folder {}: {}", folder, e);
                    break;
                }
            }
        }

        info!(
            "Deleted {} ({} empty folders removed)",
            path,
            deleted.len() - 1
        );
        Ok(deleted)
    }

    fn get_document(&self, path: &StoragePath) -> Result<Vec<u8>, DocumentError> {
        if !path.is_document() {
            return Err(DocumentError::NotADocument(path.to_string()));
        }

        let real = self.real_path(path);
        if !Self::is_file(&real) {
            return Err(DocumentError::NotFound(path.to_string()));
        }

        match fs::read(&real) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(DocumentError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_folder(&self, path: &StoragePath) -> Result<FolderEntries, DocumentError> {
        if !path.is_folder() {
            return Err(DocumentError::NotAFolder(path.to_string()));
        }

        let real = self.real_path(path);
        let entries = match with_retries("folder listing", || fs::read_dir(&real)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(FolderEntries::new()),
            Err(e) if e.kind() == io::ErrorKind::NotADirectory => {
                return Err(DocumentError::NotAFolder(path.to_string()));
            }
            Err(e) => {
                error!("Failed to list {} (real: {}): {}", path, real.display(), e);
                return Err(e.into());
            }
        };

        let mut listing = FolderEntries::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(TEMP_PREFIX) {
                continue;
            }
            if !is_safe_segment(&name) {
                warn!("Skipping unaddressable entry {:?} in {}", name, path);
                continue;
            }

            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                listing.insert(format!("{}/", name), PathKind::Folder);
            } else if file_type.is_file() {
                if path.module_name().is_none() {
                    warn!("Skipping stray file {:?} above module level in {}", name, path);
                    continue;
                }
                listing.insert(name, PathKind::Document);
            }
        }

        Ok(listing)
    }
}
