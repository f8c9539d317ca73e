//! Error types for the Google Workspace adapter.

use thiserror::Error;

/// Result type alias using `GwsError`.
pub type GwsResult<T> = Result<T, GwsError>;

/// Errors that can occur when interacting with the Workspace directory.
#[derive(Debug, Error)]
pub enum GwsError {
    /// Service-account key or client configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Token grant failed.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Service-account assertion could not be signed.
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// HTTP transport error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A group was addressed with an empty id.
    #[error("group id is empty")]
    GroupIdEmpty,

    /// Directory API failure.
    #[error("directory api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Addressed entity does not exist upstream.
    #[error("not found: {0}")]
    NotFound(String),
}

impl GwsError {
    pub(crate) fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => GwsError::Auth(message),
            404 => GwsError::NotFound(message),
            _ => GwsError::Api { status, message },
        }
    }
}
