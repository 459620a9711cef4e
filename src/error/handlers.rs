//! Error handlers
//!
//! Maps storage errors onto access-protocol status codes.

use crate::error::types::{DocumentError, RemoteStorageError};
use crate::protocol::responses::{BAD_REQUEST, INTERNAL_ERROR, NOT_FOUND};
use log::{error, warn};

/// Log a storage error at a level matching its severity
pub fn handle_error(err: &RemoteStorageError) {
    match error_to_status_code(err) {
        INTERNAL_ERROR => error!("Storage failure: {}", err),
        _ => warn!("Request rejected: {}", err),
    }
}

/// Convert error to a protocol status code
pub fn error_to_status_code(err: &RemoteStorageError) -> u16 {
    match err {
        RemoteStorageError::InvalidPath(_) => BAD_REQUEST,
        RemoteStorageError::NotADocument(_) => BAD_REQUEST,
        RemoteStorageError::NotAFolder(_) => BAD_REQUEST,
        RemoteStorageError::NotFound(_) => NOT_FOUND,
        RemoteStorageError::Document(DocumentError::NotADocument(_)) => BAD_REQUEST,
        RemoteStorageError::Document(DocumentError::NotAFolder(_)) => BAD_REQUEST,
        RemoteStorageError::Document(_) => INTERNAL_ERROR,
        RemoteStorageError::Metadata(_) => INTERNAL_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::types::{MetadataError, PathError};

    #[test]
    fn test_status_codes() {
        let invalid = RemoteStorageError::from(PathError::NoModule("/admin/".into()));
        assert_eq!(error_to_status_code(&invalid), BAD_REQUEST);

        let missing = RemoteStorageError::from(DocumentError::NotFound("/a/b/c".into()));
        assert!(matches!(missing, RemoteStorageError::NotFound(_)));
        assert_eq!(error_to_status_code(&missing), NOT_FOUND);

        let closed = RemoteStorageError::from(MetadataError::Closed);
        assert_eq!(error_to_status_code(&closed), INTERNAL_ERROR);
    }
}
