//! Session types returned by the auth server.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;

use super::error::AuthError;

/// Body returned by the auth server on a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub expires: String,
    pub cookie_name: String,
}

/// A sync gateway session with its expiry parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub session_id: String,
    pub cookie_name: String,
    pub expires: DateTime<FixedOffset>,
}

impl Session {
    /// Builds a session from the auth server response.
    ///
    /// `expires` must be RFC 3339 (`2006-01-02T15:04:05Z07:00`, fractional
    /// seconds allowed).
    pub fn from_response(response: SessionResponse) -> Result<Self, AuthError> {
        let expires = DateTime::parse_from_rfc3339(&response.expires).map_err(|e| {
            AuthError::InvalidExpiry {
                value: response.expires.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            session_id: response.session_id,
            cookie_name: response.cookie_name,
            expires,
        })
    }

    /// Returns true if the session is still usable at `now` with `margin` to spare.
    pub fn is_valid_at(&self, now: DateTime<Utc>, margin: chrono::Duration) -> bool {
        self.expires.with_timezone(&Utc) - margin > now
    }

    /// Builds the cookie carrying this session for requests to `domain`.
    pub fn cookie(&self, domain: Option<&str>) -> SessionCookie {
        SessionCookie {
            name: self.cookie_name.clone(),
            value: self.session_id.clone(),
            path: "/".to_string(),
            domain: domain.map(str::to_string),
            expires: self.expires,
            secure: true,
            http_only: true,
        }
    }
}

/// Session cookie scoped to the sync endpoint host.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub domain: Option<String>,
    pub expires: DateTime<FixedOffset>,
    pub secure: bool,
    pub http_only: bool,
}

impl SessionCookie {
    /// Value for the `Cookie` request header. Attributes are not sent by clients.
    pub fn header_value(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}
