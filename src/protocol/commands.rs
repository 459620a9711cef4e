//! Module `commands`
//!
//! Defines the access-protocol commands, their outcome status and the
//! result structure handlers return.

/// A command parsed from one request line.
///
/// Commands that take a path keep it as the raw string; it is validated by the
/// handler so a malformed path gets its own status code.
#[derive(Debug, PartialEq)]
pub enum Command {
    QUIT,
    GET(String),    // Document bytes or folder listing
    HEAD(String),   // Version and content type only
    DELETE(String), // Delete a document
    PUT {
        path: String,
        content_type: String,
        length: u64, // Body bytes following the request line
    },
    UNKNOWN, // Unknown command or malformed arguments
}

/// Represents the outcome status of executing a command.
#[derive(Debug, PartialEq)]
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

/// Struct encapsulating the full result of a command execution.
#[derive(Debug)]
pub struct CommandResult {
    pub status: CommandStatus,
    /// Status line sent back to the client
    pub message: Option<String>,
    /// Payload written after the status line
    pub data: Option<Vec<u8>>,
}

/// Parses a raw request line into a `Command`.
///
/// Returns `UNKNOWN` if a known command is misused. `PUT` takes
/// `<path> <content-type> <length>`; the content type may contain spaces.
pub fn parse_command(raw: &str) -> Command {
    let trimmed = raw.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("").to_ascii_uppercase();
    let arg = parts.next().unwrap_or("").trim();

    match cmd.as_str() {
        "QUIT" | "Q" => Command::QUIT,
        "GET" if is_single_token(arg) => Command::GET(arg.to_string()),
        "HEAD" if is_single_token(arg) => Command::HEAD(arg.to_string()),
        "DELETE" | "DEL" if is_single_token(arg) => Command::DELETE(arg.to_string()),
        "PUT" => parse_put(arg).unwrap_or(Command::UNKNOWN),
        _ => Command::UNKNOWN,
    }
}

fn is_single_token(arg: &str) -> bool {
    !arg.is_empty() && !arg.contains(char::is_whitespace)
}

fn parse_put(arg: &str) -> Option<Command> {
    let tokens: Vec<&str> = arg.split_whitespace().collect();
    if tokens.len() < 3 {
        return None;
    }

    let length = tokens[tokens.len() - 1].parse::<u64>().ok()?;
    Some(Command::PUT {
        path: tokens[0].to_string(),
        content_type: tokens[1..tokens.len() - 1].join(" "),
        length,
    })
}
