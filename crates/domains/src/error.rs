use thiserror::Error;

/// The error type shared across the workspace. Adapters map their library
/// errors into these variants at the boundary; the web layer maps them to
/// HTTP responses.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(what: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound(what.into(), id.to_string())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
