//! Client session loop
//!
//! Reads one command line at a time, reads the body of a `PUT`, and writes the
//! status line followed by any payload. Command lines are read at most
//! `max_command_length` bytes at a time; a longer line ends the session. Store calls block, so they run on the
//! blocking thread pool.

use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;

use crate::config::ServerConfig;
use crate::document::DocumentStore;
use crate::metadata::MetadataStore;
use crate::protocol::responses::{INTERNAL_ERROR, PAYLOAD_TOO_LARGE, format_response};
use crate::protocol::{Command, CommandResult, CommandStatus, handle_command, parse_command};
use crate::server::registry::SessionRegistry;
use crate::storage::RemoteStorage;

/// Serves one client until it quits, disconnects or breaks the protocol.
pub async fn handle_session<M, D>(
    stream: TcpStream,
    client_addr: SocketAddr,
    storage: Arc<RemoteStorage<M, D>>,
    config: Arc<ServerConfig>,
    sessions: &SessionRegistry,
) where
    M: MetadataStore + 'static,
    D: DocumentStore + 'static,
{
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();

    let line_limit = config.max_command_length as u64 + 1;

    loop {
        line.clear();
        match (&mut reader).take(line_limit).read_line(&mut line).await {
            Ok(0) => {
                info!("Connection closed by client {}", client_addr);
                break;
            }
            Ok(_) => {
                // Unread bytes of the line, or a body it announced, would be parsed
                // as commands.
                if line.len() > config.max_command_length {
                    warn!("Command line from {} too long, closing", client_addr);
                    let _ = write_half.write_all(b"500 Command too long\r\n").await;
                    break;
                }

                let trimmed = line.trim_end_matches(['\r', '\n']);
                let command = parse_command(trimmed);
                info!("Received from {}: {:?}", client_addr, &command);
                sessions.record_command(&client_addr).await;

                let body = match &command {
                    Command::PUT { path, length, .. } => {
                        if *length > config.max_document_size {
                            warn!(
                                "Rejecting {} byte body for {} from {}",
                                length, path, client_addr
                            );
                            let msg = format_response(
                                PAYLOAD_TOO_LARGE,
                                &format!("Document exceeds {} bytes", config.max_document_size),
                            );
                            let _ = write_half.write_all(msg.as_bytes()).await;
                            break;
                        }

                        let mut body = vec![0u8; *length as usize];
                        if let Err(e) = reader.read_exact(&mut body).await {
                            error!("Failed to read body from {}: {}", client_addr, e);
                            break;
                        }
                        Some(body)
                    }
                    _ => None,
                };

                let worker_storage = Arc::clone(&storage);
                let result = tokio::task::spawn_blocking(move || {
                    handle_command(&worker_storage, &command, body.as_deref())
                })
                .await;

                let result = match result {
                    Ok(result) => result,
                    Err(e) => {
                        error!("Command task for {} failed: {}", client_addr, e);
                        let msg = format_response(INTERNAL_ERROR, "Internal server error");
                        let _ = write_half.write_all(msg.as_bytes()).await;
                        continue;
                    }
                };

                let close = result.status == CommandStatus::CloseConnection;
                if let Err(e) = send_result(&mut write_half, &result).await {
                    error!("Failed to write response to {}: {}", client_addr, e);
                    break;
                }
                if close {
                    info!("Client {} requested to quit", client_addr);
                    break;
                }
            }
            Err(e) => {
                error!("Failed to read from {}: {}", client_addr, e);
                break;
            }
        }
    }
}

async fn send_result(
    write_half: &mut OwnedWriteHalf,
    result: &CommandResult,
) -> std::io::Result<()> {
    if let Some(msg) = &result.message {
        write_half.write_all(msg.as_bytes()).await?;
    }
    if let Some(data) = &result.data {
        write_half.write_all(data).await?;
    }
    write_half.flush().await
}
