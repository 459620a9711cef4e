//! Storage path model
//!
//! Parses and decomposes `/user/[public/]module/...` paths and enumerates
//! their ancestor folders.

pub mod storage_path;
pub mod validation;

pub use storage_path::{PUBLIC_SEGMENT, PathKind, StoragePath};
