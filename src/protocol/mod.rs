//! Access protocol implementation
//!
//! A line-oriented request protocol over the storage core: command parsing,
//! dispatch and response formatting.

pub mod commands;
pub mod handlers;
pub mod parser;
pub mod responses;

pub use commands::{Command, CommandResult, CommandStatus};
pub use handlers::handle_command;
pub use parser::{parse_command, resolve_path};
