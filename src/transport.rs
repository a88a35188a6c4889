//! Shared HTTP transport.
//!
//! `reqwest::Client` pools connections internally and is cheap to clone, so a
//! single instance is created lazily and handed to every component that needs
//! one. Components take the client as a constructor argument; tests pass their
//! own.

use std::sync::OnceLock;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Returns a handle to the process-wide HTTP client, creating it on first use.
pub fn shared_client() -> reqwest::Client {
    SHARED_CLIENT.get_or_init(reqwest::Client::new).clone()
}
