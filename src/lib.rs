//! Sync Gateway Client
//!
//! Document and attachment operations against a sync gateway's REST API,
//! with optional basic or session-cookie authentication.

pub mod auth;
pub mod config;
pub mod gateway;
pub mod transport;

pub use auth::{AuthConfig, AuthError, AuthProvider, Session, SessionCookie};
pub use config::{Config, ConfigError, ConfigSource, ConfigValue};
pub use gateway::{
    sniff_content_type, AttachmentMeta, Document, DocumentEnvelope, GatewayClient, GatewayError,
    RawDocument,
};
pub use transport::shared_client;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
