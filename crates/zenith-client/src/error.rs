//! Error types for the Zenith API client.

use thiserror::Error;

/// Result type alias for Zenith client operations.
pub type Result<T> = std::result::Result<T, ZenithClientError>;

/// Errors that can occur while talking to a Zenith instance.
#[derive(Debug, Error)]
pub enum ZenithClientError {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Error response from the Zenith instance
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid request (bad base URL, etc.)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication error (missing or malformed service token)
    #[error("Authentication error: {0}")]
    Auth(String),
}

impl ZenithClientError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// HTTP status if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ZenithClientError> for moneta_core::Error {
    fn from(err: ZenithClientError) -> Self {
        match err {
            ZenithClientError::Auth(msg) => moneta_core::Error::authorization(msg),
            other => moneta_core::Error::remote(other.to_string()),
        }
    }
}
