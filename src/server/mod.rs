//! Server core functionality
//!
//! Accept loop, session handling and session bookkeeping for the access
//! service.

pub mod core;
pub mod registry;
pub mod session;

pub use self::core::Server;
pub use registry::SessionRegistry;
