//! Error types for the SCIM target adapter.

use thiserror::Error;

/// Result type alias using `ScimError`.
pub type ScimResult<T> = Result<T, ScimError>;

/// Errors that can occur when talking to the SCIM target.
#[derive(Debug, Error)]
pub enum ScimError {
    /// Endpoint or client configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP transport error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint URL could not be parsed.
    #[error("url error: {0}")]
    Url(#[from] url::ParseError),

    /// Response body could not be decoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bearer token rejected.
    #[error("authentication rejected by the scim endpoint: {0}")]
    Auth(String),

    /// Resource does not exist on the target.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Resource already exists on the target (create conflict).
    #[error("resource already exists: {0}")]
    Conflict(String),

    /// Target rejected the request rate.
    #[error("rate limited by the scim endpoint")]
    RateLimited,

    /// Any other API failure.
    #[error("scim api error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl ScimError {
    /// Classify a non-success response by status.
    pub(crate) fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => ScimError::Auth(message),
            404 => ScimError::NotFound(message),
            409 => ScimError::Conflict(message),
            429 => ScimError::RateLimited,
            _ => ScimError::Api { status, message },
        }
    }
}
