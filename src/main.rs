//! remoteStorage access service - Entry Point
//!
//! Serves versioned documents and folder listings over a line protocol.

use log::{error, info};
use std::process;
use std::sync::Arc;

use remote_storage::config::ServerConfig;
use remote_storage::document::FilesystemDocumentStore;
use remote_storage::metadata::{DatabaseMetadataStore, MetadataDatabase};
use remote_storage::utils::setup_logging;
use remote_storage::{RemoteStorage, Server};

#[tokio::main]
async fn main() {
    setup_logging();

    info!("Launching remote storage service...");

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    let database = match MetadataDatabase::open(config.metadata_file_path()) {
        Ok(database) => Arc::new(database),
        Err(e) => {
            error!("Failed to open metadata database: {}", e);
            process::exit(1);
        }
    };

    let documents = match FilesystemDocumentStore::new(config.storage_root_path()) {
        Ok(documents) => documents,
        Err(e) => {
            error!("Failed to prepare storage root: {}", e);
            process::exit(1);
        }
    };

    let storage = Arc::new(RemoteStorage::new(
        DatabaseMetadataStore::new(Arc::clone(&database)),
        documents,
    ));

    let server = match Server::bind(config, storage).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            process::exit(1);
        }
    };

    tokio::select! {
        _ = server.start() => {}
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down");
        }
    }

    if let Err(e) = database.close() {
        error!("Failed to close metadata database: {}", e);
        process::exit(1);
    }
}
