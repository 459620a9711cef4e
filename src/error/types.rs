//! Error types
//!
//! Defines domain-specific error types for each layer of the storage service.

use std::fmt;
use std::io;

/// Path parsing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    MissingLeadingSlash(String),
    EmptySegment(String),
    NoUserId(String),
    NoModule(String),
    DocumentOutsideModule(String),
    InvalidSegment { path: String, segment: String },
    InvalidChildName(String),
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::MissingLeadingSlash(p) => write!(f, "path must start with '/': {}", p),
            PathError::EmptySegment(p) => write!(f, "path contains an empty segment: {}", p),
            PathError::NoUserId(p) => write!(f, "no user id specified: {}", p),
            PathError::NoModule(p) => write!(f, "no module specified: {}", p),
            PathError::DocumentOutsideModule(p) => {
                write!(f, "document must be inside a module folder: {}", p)
            }
            PathError::InvalidSegment { path, segment } => {
                write!(f, "invalid segment '{}' in path: {}", segment, path)
            }
            PathError::InvalidChildName(n) => write!(f, "invalid child name: {}", n),
        }
    }
}

impl std::error::Error for PathError {}

/// Metadata store errors
#[derive(Debug)]
pub enum MetadataError {
    IoError(io::Error),
    Serialization(serde_json::Error),
    VersionOverflow(String),
    LockPoisoned,
    Closed,
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataError::IoError(e) => write!(f, "IO error: {}", e),
            MetadataError::Serialization(e) => write!(f, "Metadata table is corrupt: {}", e),
            MetadataError::VersionOverflow(p) => write!(f, "Version overflow for {}", p),
            MetadataError::LockPoisoned => write!(f, "Metadata table lock poisoned"),
            MetadataError::Closed => write!(f, "Metadata table is closed"),
        }
    }
}

impl std::error::Error for MetadataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MetadataError::IoError(e) => Some(e),
            MetadataError::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MetadataError {
    fn from(error: io::Error) -> Self {
        MetadataError::IoError(error)
    }
}

impl From<serde_json::Error> for MetadataError {
    fn from(error: serde_json::Error) -> Self {
        MetadataError::Serialization(error)
    }
}

/// Document store errors
#[derive(Debug)]
pub enum DocumentError {
    NotFound(String),
    NotADocument(String),
    NotAFolder(String),
    IoError(io::Error),
    LockPoisoned,
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::NotFound(p) => write!(f, "Document not found: {}", p),
            DocumentError::NotADocument(p) => write!(f, "Not a document: {}", p),
            DocumentError::NotAFolder(p) => write!(f, "Not a folder: {}", p),
            DocumentError::IoError(e) => write!(f, "IO error: {}", e),
            DocumentError::LockPoisoned => write!(f, "Document store lock poisoned"),
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DocumentError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DocumentError {
    fn from(error: io::Error) -> Self {
        DocumentError::IoError(error)
    }
}

/// Errors surfaced by [`RemoteStorage`](crate::storage::RemoteStorage) operations
#[derive(Debug)]
pub enum RemoteStorageError {
    InvalidPath(PathError),
    NotFound(String),
    NotADocument(String),
    NotAFolder(String),
    Metadata(MetadataError),
    Document(DocumentError),
}

impl fmt::Display for RemoteStorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteStorageError::InvalidPath(e) => write!(f, "Invalid path: {}", e),
            RemoteStorageError::NotFound(p) => write!(f, "Not found: {}", p),
            RemoteStorageError::NotADocument(p) => write!(f, "Not a document: {}", p),
            RemoteStorageError::NotAFolder(p) => write!(f, "Not a folder: {}", p),
            RemoteStorageError::Metadata(e) => write!(f, "Metadata store error: {}", e),
            RemoteStorageError::Document(e) => write!(f, "Document store error: {}", e),
        }
    }
}

impl std::error::Error for RemoteStorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RemoteStorageError::InvalidPath(e) => Some(e),
            RemoteStorageError::Metadata(e) => Some(e),
            RemoteStorageError::Document(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PathError> for RemoteStorageError {
    fn from(error: PathError) -> Self {
        RemoteStorageError::InvalidPath(error)
    }
}

impl From<MetadataError> for RemoteStorageError {
    fn from(error: MetadataError) -> Self {
        RemoteStorageError::Metadata(error)
    }
}

// A missing document is reported as NotFound; every other store failure is wrapped as-is.
impl From<DocumentError> for RemoteStorageError {
    fn from(error: DocumentError) -> Self {
        match error {
            DocumentError::NotFound(p) => RemoteStorageError::NotFound(p),
            other => RemoteStorageError::Document(other),
        }
    }
}
