//! Sync gateway REST client.
//!
//! ## API shape
//!
//! - `GET {endpoint}/{id}`: document JSON with `_rev` and `_attachments`
//! - `PUT {endpoint}/{id}[?rev=R]`: create or replace, responds with `rev`
//! - `DELETE {endpoint}/{id}[?rev=R]`: delete at revision
//! - `PUT {endpoint}/{id}/{name}`: upload attachment bytes

mod client;
mod content_type;
mod error;
mod protocol;

pub use client::GatewayClient;
pub use content_type::sniff_content_type;
pub use error::GatewayError;
pub use protocol::{
    AttachmentMeta, Document, DocumentEnvelope, RawDocument, WriteResponse, INTERNAL_FIELDS,
};
