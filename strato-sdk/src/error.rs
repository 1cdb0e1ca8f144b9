//! Client error types.

use thiserror::Error;

/// Errors surfaced by the API client.
///
/// None of these are retried anywhere in the SDK; the convergence poller only
/// retries the "state not yet reached" condition, which is not an error.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Resource not found (404). First-class: delete-then-get scenarios
    /// assert this variant explicitly.
    #[error("not found: {0}")]
    NotFound(String),

    /// Conflict with an existing resource (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other non-success API response.
    #[error("api error {status}: {message}")]
    Api { status: u16, message: String },

    /// Connection or protocol failure before a response was produced.
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not match the expected shape.
    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
