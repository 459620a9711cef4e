//! Metadata storage
//!
//! Tracks the version (ETag) and content type of every stored path.

pub mod database;
pub mod entry;
pub mod store;

pub use database::MetadataDatabase;
pub use entry::MetadataEntry;
pub use store::{DatabaseMetadataStore, MetadataStore};
