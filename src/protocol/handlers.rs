//! Command handlers
//!
//! Each handler validates its path argument, calls into [`RemoteStorage`] and
//! turns the outcome into a status line plus optional payload. Handlers block
//! on the stores and are run off the async runtime by the session loop.

use crate::document::DocumentStore;
use crate::error::RemoteStorageError;
use crate::error::handlers::{error_to_status_code, handle_error};
use crate::metadata::MetadataStore;
use crate::protocol::parser::resolve_path;
use crate::protocol::responses::{
    ABSENT, CREATED, GOODBYE, INTERNAL_ERROR, NOT_FOUND, OK, format_response,
};
use crate::protocol::{Command, CommandResult, CommandStatus};
use crate::storage::{FOLDER_DESCRIPTION_CONTENT_TYPE, RemoteStorage};
use log::error;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Dispatches a parsed command to its handler.
///
/// `body` carries the bytes that followed a `PUT` request line.
pub fn handle_command<M: MetadataStore, D: DocumentStore>(
    storage: &RemoteStorage<M, D>,
    command: &Command,
    body: Option<&[u8]>,
) -> CommandResult {
    match command {
        Command::QUIT => handle_cmd_quit(),
        Command::GET(path) => handle_cmd_get(storage, path),
        Command::HEAD(path) => handle_cmd_head(storage, path),
        Command::DELETE(path) => handle_cmd_delete(storage, path),
        Command::PUT {
            path, content_type, ..
        } => handle_cmd_put(storage, path, content_type, body.unwrap_or_default()),
        Command::UNKNOWN => handle_cmd_unknown(),
    }
}

fn success(message: String, data: Option<Vec<u8>>) -> CommandResult {
    CommandResult {
        status: CommandStatus::Success,
        message: Some(message),
        data,
    }
}

fn failure(err: RemoteStorageError) -> CommandResult {
    handle_error(&err);
    let text = err.to_string();
    CommandResult {
        message: Some(format_response(error_to_status_code(&err), &text)),
        status: CommandStatus::Failure(text),
        data: None,
    }
}

fn etag_token(version: Option<u64>) -> String {
    version.map_or_else(|| ABSENT.to_string(), |v| v.to_string())
}

/// Handles the QUIT command: signals connection close.
fn handle_cmd_quit() -> CommandResult {
    CommandResult {
        status: CommandStatus::CloseConnection,
        message: Some(format_response(GOODBYE, "Goodbye")),
        data: None,
    }
}

/// Handles the GET command.
///
/// Documents: `200 <length> <etag> <content-type>` followed by the bytes.
/// Folders: `200 <length> <etag> application/ld+json` followed by the listing.
fn handle_cmd_get<M: MetadataStore, D: DocumentStore>(
    storage: &RemoteStorage<M, D>,
    raw_path: &str,
) -> CommandResult {
    let path = match resolve_path(raw_path) {
        Ok(path) => path,
        Err(e) => return failure(e.into()),
    };

    let outcome = if path.is_folder() {
        storage.get_folder(&path).and_then(|listing| {
            let json = listing.to_json().map_err(|e| {
                error!("Failed to serialize listing of {}: {}", path, e);
                RemoteStorageError::Metadata(e.into())
            })?;
            Ok((json.into_bytes(), FOLDER_DESCRIPTION_CONTENT_TYPE.to_string()))
        })
    } else {
        storage.get_document(&path).and_then(|data| {
            let content_type = storage
                .get_content_type(&path)?
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
            Ok((data, content_type))
        })
    };

    let (data, content_type) = match outcome {
        Ok(found) => found,
        Err(e) => return failure(e),
    };

    match storage.get_version(&path) {
        Ok(version) => success(
            format_response(
                OK,
                &format!("{} {} {}", data.len(), etag_token(version), content_type),
            ),
            Some(data),
        ),
        Err(e) => failure(e),
    }
}

/// Handles the HEAD command: `200 <etag> <content-type|->`.
fn handle_cmd_head<M: MetadataStore, D: DocumentStore>(
    storage: &RemoteStorage<M, D>,
    raw_path: &str,
) -> CommandResult {
    let path = match resolve_path(raw_path) {
        Ok(path) => path,
        Err(e) => return failure(e.into()),
    };

    let version = match storage.get_version(&path) {
        Ok(Some(version)) => version,
        Ok(None) => {
            return CommandResult {
                status: CommandStatus::Failure("No entry".into()),
                message: Some(format_response(NOT_FOUND, &format!("No entry for {}", path))),
                data: None,
            };
        }
        Err(e) => return failure(e),
    };

    match storage.get_content_type(&path) {
        Ok(content_type) => success(
            format_response(
                OK,
                &format!("{} {}", version, content_type.as_deref().unwrap_or(ABSENT)),
            ),
            None,
        ),
        Err(e) => failure(e),
    }
}

/// Handles the PUT command: `201 <etag>` with the document's new version.
fn handle_cmd_put<M: MetadataStore, D: DocumentStore>(
    storage: &RemoteStorage<M, D>,
    raw_path: &str,
    content_type: &str,
    body: &[u8],
) -> CommandResult {
    let path = match resolve_path(raw_path) {
        Ok(path) => path,
        Err(e) => return failure(e.into()),
    };

    match storage.put_document(&path, content_type, body) {
        Ok(version) => success(format_response(CREATED, &version.to_string()), None),
        Err(e) => failure(e),
    }
}

/// Handles the DELETE command.
fn handle_cmd_delete<M: MetadataStore, D: DocumentStore>(
    storage: &RemoteStorage<M, D>,
    raw_path: &str,
) -> CommandResult {
    let path = match resolve_path(raw_path) {
        Ok(path) => path,
        Err(e) => return failure(e.into()),
    };

    match storage.delete_document(&path) {
        Ok(()) => success(format_response(OK, "Deleted"), None),
        Err(e) => failure(e),
    }
}

/// Handles unknown or unsupported commands: returns error response.
fn handle_cmd_unknown() -> CommandResult {
    CommandResult {
        status: CommandStatus::Failure("Unknown command".into()),
        message: Some(format_response(
            INTERNAL_ERROR,
            "Syntax error, command unrecognized",
        )),
        data: None,
    }
}
