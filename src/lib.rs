pub mod config;
pub mod document;
pub mod error;
pub mod metadata;
pub mod path;
pub mod protocol;
pub mod server;
pub mod storage;
pub mod utils;

pub use path::StoragePath;
pub use server::Server;
pub use storage::RemoteStorage;
