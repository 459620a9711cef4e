//! Remote storage orchestration
//!
//! Keeps document bytes and per-path versions consistent and builds folder
//! listings.

pub mod core;
pub mod listing;

pub use self::core::RemoteStorage;
pub use listing::{FolderListing, ListingItem, FOLDER_DESCRIPTION_CONTENT_TYPE};
