//! Document storage
//!
//! Byte storage for documents. Writes and deletes report which folders they
//! touched so the metadata layer can version them.

pub mod filesystem;
pub mod memory;
pub mod store;

pub use filesystem::FilesystemDocumentStore;
pub use memory::MemoryDocumentStore;
pub use store::{DocumentStore, FolderEntries};
