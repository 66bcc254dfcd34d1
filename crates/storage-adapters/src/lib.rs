//! # storage-adapters
//!
//! sqlx/SQLite implementations of the `domains` port traits, mapping between
//! the relational model and the domain models.

mod db;
mod posts;
mod users;

pub use db::{connect, connect_memory};
pub use posts::SqlitePostStore;
pub use users::SqliteUserStore;

use domains::AppError;
use uuid::Uuid;

// Helpers for UUID conversion
pub(crate) fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

pub(crate) fn blob_to_uuid(blob: &[u8]) -> Uuid {
    Uuid::from_slice(blob).unwrap_or_default()
}

/// Maps sqlx errors at the port boundary. Unique-constraint hits become
/// `Conflict` so callers can distinguish duplicates from real failures.
pub(crate) fn map_db(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return AppError::Conflict(db.message().to_string());
        }
    }
    AppError::internal(err)
}
