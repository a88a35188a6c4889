//! Gateway error types.

use thiserror::Error;

use crate::auth::AuthError;

/// Errors that can occur during document and attachment operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Connection failed or the response body could not be read
    #[error("Transport error: {0}")]
    Transport(String),
    /// Response body was not the expected JSON
    #[error("Parse error: {0}")]
    Parse(String),
    /// Document does not exist on the gateway
    #[error("Document not found: {0}")]
    NotFound(String),
    /// Write rejected because the revision was stale
    #[error("Revision conflict on document: {0}")]
    Conflict(String),
    /// Any other non-success response
    #[error("Gateway returned status {status}: {body}")]
    Status { status: u16, body: String },
    /// Credentials could not be obtained; the request was not sent
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        GatewayError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::Parse(e.to_string())
    }
}
