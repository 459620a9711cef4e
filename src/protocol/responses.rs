//! Protocol responses
//!
//! Defines status codes and formatting.

pub const OK: u16 = 200;
pub const CREATED: u16 = 201;
pub const READY: u16 = 220;
pub const GOODBYE: u16 = 221;
pub const BAD_REQUEST: u16 = 400;
pub const NOT_FOUND: u16 = 404;
pub const PAYLOAD_TOO_LARGE: u16 = 413;
pub const TOO_MANY_CONNECTIONS: u16 = 421;
pub const INTERNAL_ERROR: u16 = 500;

/// Placeholder for an absent ETag or content type in a status line.
pub const ABSENT: &str = "-";

/// Format a status line
pub fn format_response(code: u16, message: &str) -> String {
    format!("{} {}\r\n", code, message)
}
