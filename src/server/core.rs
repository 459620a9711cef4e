use log::{error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

use crate::config::ServerConfig;
use crate::document::DocumentStore;
use crate::metadata::MetadataStore;
use crate::protocol::responses::{READY, TOO_MANY_CONNECTIONS, format_response};
use crate::server::registry::SessionRegistry;
use crate::server::session::handle_session;
use crate::storage::RemoteStorage;

pub struct Server<M, D> {
    sessions: SessionRegistry,
    storage: Arc<RemoteStorage<M, D>>,
    listener: TcpListener,
    config: Arc<ServerConfig>,
}

impl<M, D> Server<M, D>
where
    M: MetadataStore + 'static,
    D: DocumentStore + 'static,
{
    /// Binds the listener described by `config`.
    pub async fn bind(
        config: ServerConfig,
        storage: Arc<RemoteStorage<M, D>>,
    ) -> io::Result<Self> {
        let socket = config.socket_addr();
        let listener = TcpListener::bind(&socket).await.map_err(|e| {
            error!("Failed to bind to {}: {}", socket, e);
            e
        })?;
        info!("Server bound to {}", listener.local_addr()?);

        Ok(Self {
            sessions: SessionRegistry::new(),
            storage,
            listener,
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop. Each client gets its own task.
    pub async fn start(&self) {
        info!(
            "Starting remote storage service on {} (max {} clients)",
            self.config.socket_addr(),
            self.config.max_clients
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let sessions = self.sessions.clone();
                    let storage = Arc::clone(&self.storage);
                    let config = Arc::clone(&self.config);

                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_new_client(stream, addr, sessions, storage, config).await
                        {
                            warn!("Failed to handle client {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}

/// Registers a new client, greets it and hands it to the session loop.
async fn handle_new_client<M, D>(
    mut stream: TcpStream,
    client_addr: SocketAddr,
    sessions: SessionRegistry,
    storage: Arc<RemoteStorage<M, D>>,
    config: Arc<ServerConfig>,
) -> io::Result<()>
where
    M: MetadataStore + 'static,
    D: DocumentStore + 'static,
{
    if !sessions.try_register(client_addr, config.max_clients).await {
        warn!("Rejecting {}: connection limit reached", client_addr);
        stream
            .write_all(
                format_response(TOO_MANY_CONNECTIONS, "Too many connections. Try again later.")
                    .as_bytes(),
            )
            .await?;
        return Ok(());
    }

    let greeting = stream
        .write_all(format_response(READY, "remoteStorage service ready").as_bytes())
        .await;
    if let Err(e) = greeting {
        sessions.remove(&client_addr).await;
        return Err(e);
    }

    handle_session(stream, client_addr, storage, config, &sessions).await;
    sessions.remove(&client_addr).await;
    Ok(())
}
