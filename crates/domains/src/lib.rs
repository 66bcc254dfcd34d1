//! The central domain logic and interface definitions for Quill.
//!
//! Everything here is I/O-free: entities, the permission bitmask, pagination
//! math, the port traits the adapter crates implement, and the error type
//! shared across the workspace.

pub mod error;
pub mod models;
pub mod page;
pub mod ports;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use page::*;
pub use ports::*;
