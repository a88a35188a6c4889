//! Authentication error types.

use thiserror::Error;

/// Errors that prevent credentials from being attached to a request.
///
/// Any of these aborts the request that needed authentication; it is never
/// sent without credentials.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Session mode is selected but no auth server URL is configured
    #[error("Session auth not configured. Add auth.server_url to config.")]
    NotConfigured,
    /// The auth server could not be reached
    #[error("Failed to reach auth server: {0}")]
    Unreachable(String),
    /// The auth server answered with a non-success status
    #[error("Auth server rejected credentials ({status}): {body}")]
    Rejected { status: u16, body: String },
    /// The auth server's response body was not a session
    #[error("Invalid auth server response: {0}")]
    InvalidResponse(String),
    /// The session expiry was not an RFC 3339 timestamp
    #[error("Invalid session expiry '{value}': {reason}")]
    InvalidExpiry { value: String, reason: String },
}
