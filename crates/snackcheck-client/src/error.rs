//! Error types for snackcheck-client

use thiserror::Error;

/// Errors that can occur while talking to the Application Under Test
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport-level failure (connection refused, TLS, non-GraphQL status)
    #[error("HTTP error: {0}")]
    Http(String),

    /// The GraphQL endpoint answered with one or more errors
    #[error("Request rejected: {message}")]
    Rejected { message: String },

    /// No token is configured for a role
    #[error("No token configured for role '{role}'")]
    MissingToken { role: String },

    /// The response body was not a GraphQL response
    #[error("Invalid GraphQL response: {0}")]
    InvalidResponse(String),

    /// The endpoint did not answer the readiness probe
    #[error("Application not ready at {url}: {reason}")]
    NotReady { url: String, reason: String },
}

impl ClientError {
    /// Whether the command boundary refused the request (as opposed to a
    /// transport failure).
    pub fn is_rejection(&self) -> bool {
        matches!(self, ClientError::Rejected { .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::InvalidResponse(err.to_string())
    }
}

/// Result type for client operations
pub type ClientResult<T> = std::result::Result<T, ClientError>;
