//! Error types for cloudstub

use thiserror::Error;

/// Result type alias for cloudstub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in cloudstub operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Carries either `namespace/name` or a missing source path
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object identity: {0}")]
    InvalidIdentity(String),

    #[error("Invalid presigned URL: {0}")]
    InvalidUrl(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// True for the `NotFound` variant
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
