//! Request parsing
//!
//! Splits request lines into commands and resolves request paths.

pub use crate::protocol::commands::parse_command;

use crate::error::PathError;
use crate::path::{PUBLIC_SEGMENT, StoragePath};

/// Resolves a request path. Besides everything [`StoragePath::parse`] accepts,
/// the user roots `/<user>/` and `/<user>/public/` are allowed so a client can
/// list its modules.
pub fn resolve_path(raw: &str) -> Result<StoragePath, PathError> {
    match StoragePath::parse(raw) {
        Err(PathError::NoModule(_)) if raw.ends_with('/') => {
            let trimmed = raw.trim_matches('/');
            match trimmed.split_once('/') {
                None => StoragePath::user_root(trimmed, false),
                Some((user_id, PUBLIC_SEGMENT)) => StoragePath::user_root(user_id, true),
                Some(_) => Err(PathError::NoModule(raw.to_string())),
            }
        }
        other => other,
    }
}
