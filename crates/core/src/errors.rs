//! Error types shared across the Moneta crates.

use thiserror::Error;

/// Result type alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Database-level failure detail.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database error: {0}")]
    Internal(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Connection pool exhausted: {0}")]
    PoolExhausted(String),
}

/// Top-level error for the sync service.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// Missing or invalid deployment configuration (e.g. remote credentials).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Caller is not allowed to trigger the operation.
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// Remote Zenith instance returned an error or was unreachable.
    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization(message.into())
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote(message.into())
    }
}
