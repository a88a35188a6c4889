//! Credentials for outgoing gateway requests.
//!
//! Three mutually exclusive modes, chosen from [`AuthConfig`]:
//! 1. No username/password: requests go out unauthenticated
//! 2. `simple_auth = true`: a static basic-auth header
//! 3. `simple_auth = false`: a session cookie obtained from the auth server
//!
//! In session mode a fresh session is requested before every authenticated
//! request unless `cache_sessions` is enabled. This costs one extra round-trip
//! per request and is the main performance cost of session mode.

mod error;
mod session;

use std::time::Duration;

use std::fmt;

use reqwest::header::COOKIE;
use reqwest::RequestBuilder;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

pub use error::AuthError;
pub use session::{Session, SessionCookie, SessionResponse};

/// Cached sessions are refreshed this long before they expire.
const SESSION_REFRESH_MARGIN: Duration = Duration::from_secs(30);

/// Authentication configuration
#[derive(Clone, Deserialize, Default)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    /// Use basic auth instead of a session cookie
    #[serde(default)]
    pub simple_auth: bool,
    /// Auth server URL (session mode only)
    pub server_url: Option<String>,
    /// Attach credentials to document reads as well as writes
    #[serde(default)]
    pub authenticate_reads: bool,
    /// Reuse a session until shortly before it expires
    #[serde(default)]
    pub cache_sessions: bool,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("simple_auth", &self.simple_auth)
            .field("server_url", &self.server_url)
            .field("authenticate_reads", &self.authenticate_reads)
            .field("cache_sessions", &self.cache_sessions)
            .finish()
    }
}

impl AuthConfig {
    /// Returns the username and password if both are set and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }

    pub fn mode(&self) -> AuthMode {
        match self.credentials() {
            None => AuthMode::Anonymous,
            Some(_) if self.simple_auth => AuthMode::Basic,
            Some(_) => AuthMode::Session,
        }
    }
}

/// Which credential, if any, is attached to authenticated requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Anonymous,
    Basic,
    Session,
}

/// Attaches credentials to outgoing requests.
#[derive(Debug)]
pub struct AuthProvider {
    config: AuthConfig,
    http: reqwest::Client,
    cached: Mutex<Option<Session>>,
}

impl AuthProvider {
    pub fn new(config: AuthConfig, http: reqwest::Client) -> Self {
        Self {
            config,
            http,
            cached: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Adds credentials to `request`.
    ///
    /// `domain` is the sync endpoint host the session cookie is scoped to. In
    /// session mode this performs a login first; if that fails the error is
    /// returned and the request must not be sent.
    pub async fn apply(
        &self,
        request: RequestBuilder,
        domain: Option<&str>,
    ) -> Result<RequestBuilder, AuthError> {
        let Some((username, password)) = self.config.credentials() else {
            return Ok(request);
        };

        if self.config.simple_auth {
            return Ok(request.basic_auth(username, Some(password)));
        }

        let session = self.session().await?;
        let cookie = session.cookie(domain);
        debug!(
            "Attaching session cookie {} (expires {})",
            cookie.name, cookie.expires
        );

        Ok(request.header(COOKIE, cookie.header_value()))
    }

    /// Returns a session, reusing the cached one when caching is enabled.
    async fn session(&self) -> Result<Session, AuthError> {
        if !self.config.cache_sessions {
            return self.authenticate().await;
        }

        let margin = chrono::Duration::from_std(SESSION_REFRESH_MARGIN)
            .unwrap_or_else(|_| chrono::Duration::seconds(30));

        let mut cached = self.cached.lock().await;
        if let Some(session) = cached.as_ref() {
            if session.is_valid_at(chrono::Utc::now(), margin) {
                return Ok(session.clone());
            }
        }

        let session = self.authenticate().await?;
        *cached = Some(session.clone());
        Ok(session)
    }

    /// Logs in against the auth server and returns a new session.
    pub async fn authenticate(&self) -> Result<Session, AuthError> {
        let server_url = self
            .config
            .server_url
            .as_deref()
            .ok_or(AuthError::NotConfigured)?;
        let (username, password) = self
            .config
            .credentials()
            .ok_or(AuthError::NotConfigured)?;

        debug!("POST {}", server_url);

        let response = self
            .http
            .post(server_url)
            .json(&serde_json::json!({
                "username": username,
                "password": password,
            }))
            .send()
            .await
            .map_err(|e| AuthError::Unreachable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::Unreachable(e.to_string()))?;

        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let session: SessionResponse =
            serde_json::from_str(&body).map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        Session::from_response(session)
    }
}
