//! Configuration management for the remote storage service
//!
//! Settings come from `config.toml` with `REMOTE_STORAGE_*` environment
//! overrides; anything left unset falls back to [`ServerConfig::default`].

use config::{Config, ConfigError, Environment, File};
use log::{info, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Locations searched for the configuration file, in order.
const CONFIG_PATHS: [&str; 2] = [
    "remote-storage/config.toml", // container layout
    "config.toml",                // local development
];

const ENV_PREFIX: &str = "REMOTE_STORAGE";

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// IP address the access service binds to
    pub bind_address: String,

    /// Port of the access service; 0 picks a free port
    pub port: u16,

    /// Directory holding document bytes
    pub storage_root: String,

    /// JSON file holding the metadata table
    pub metadata_file: String,

    /// Maximum concurrent sessions
    pub max_clients: usize,

    /// Largest accepted document body in bytes
    pub max_document_size: u64,

    /// Longest accepted command line in bytes
    pub max_command_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8421,
            storage_root: "./storage_root".to_string(),
            metadata_file: "./metadata.json".to_string(),
            max_clients: 10,
            max_document_size: 100 * 1024 * 1024,
            max_command_length: 2048,
        }
    }
}

impl ServerConfig {
    /// Load configuration from the first config file found, with environment
    /// overrides. Without a config file only defaults and environment apply.
    pub fn load() -> Result<Self, ConfigError> {
        match CONFIG_PATHS.iter().map(Path::new).find(|p| p.is_file()) {
            Some(path) => Self::load_from(path),
            None => {
                warn!("No config file found (tried {CONFIG_PATHS:?}), using defaults");
                let settings = Config::builder().add_source(environment()).build()?;
                let config: ServerConfig = settings.try_deserialize()?;
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Load configuration from `path`, with environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path))
            .add_source(environment())
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.is_empty() {
            return Err(ConfigError::Message("bind_address cannot be empty".into()));
        }

        if self.storage_root.is_empty() {
            return Err(ConfigError::Message("storage_root cannot be empty".into()));
        }

        if self.metadata_file.is_empty() {
            return Err(ConfigError::Message("metadata_file cannot be empty".into()));
        }

        if self.max_clients == 0 {
            return Err(ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.max_document_size == 0 {
            return Err(ConfigError::Message(
                "max_document_size must be greater than 0".into(),
            ));
        }

        if self.max_command_length < 16 {
            return Err(ConfigError::Message(
                "max_command_length must be at least 16".into(),
            ));
        }

        Ok(())
    }

    /// Bind address and port as a socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn storage_root_path(&self) -> PathBuf {
        PathBuf::from(&self.storage_root)
    }

    pub fn metadata_file_path(&self) -> PathBuf {
        PathBuf::from(&self.metadata_file)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX).try_parsing(true)
}
