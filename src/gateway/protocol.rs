//! Wire types for the sync gateway REST API.
//!
//! Documents are arbitrary JSON objects. The gateway reserves underscore
//! fields for its own bookkeeping; only `_rev` and `_attachments` are read
//! here, everything else is passed through untouched.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Fields the gateway adds to stored documents.
pub const INTERNAL_FIELDS: &[&str] = &[
    "_id",
    "_rev",
    "_attachments",
    "_deleted",
    "_revisions",
    "_exp",
];

/// The gateway-owned part of a stored document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentEnvelope {
    pub rev: Option<String>,
    pub attachments: BTreeMap<String, AttachmentMeta>,
}

impl DocumentEnvelope {
    /// Reads `_rev` and `_attachments` from a stored document.
    ///
    /// A `_rev` that is not a string counts as absent, and attachment entries
    /// that do not fit [`AttachmentMeta`] are skipped.
    pub fn from_body(body: &Map<String, Value>) -> Self {
        let rev = body.get("_rev").and_then(Value::as_str).map(str::to_string);

        let attachments = body
            .get("_attachments")
            .and_then(Value::as_object)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|(name, meta)| {
                        AttachmentMeta::deserialize(meta)
                            .ok()
                            .map(|meta| (name.clone(), meta))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self { rev, attachments }
    }
}

/// Metadata for one entry of `_attachments`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AttachmentMeta {
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub length: Option<u64>,
    #[serde(default)]
    pub revpos: Option<u64>,
    #[serde(default)]
    pub stub: Option<bool>,
}

/// Response to a document PUT.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WriteResponse {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub rev: Option<String>,
}

/// A document as stored, internal fields included.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub body: Map<String, Value>,
    pub envelope: DocumentEnvelope,
}

impl RawDocument {
    /// Parses a stored document. Only the body has to be a JSON object; the
    /// envelope is read leniently.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let body: Map<String, Value> = serde_json::from_slice(bytes)?;
        let envelope = DocumentEnvelope::from_body(&body);
        Ok(Self { body, envelope })
    }

    pub fn revision(&self) -> Option<&str> {
        self.envelope.rev.as_deref()
    }

    pub fn attachment(&self, name: &str) -> Option<&AttachmentMeta> {
        self.envelope.attachments.get(name)
    }

    /// Drops the gateway's internal fields, keeping the revision alongside.
    pub fn into_document(self) -> Document {
        let mut body = self.body;
        for field in INTERNAL_FIELDS {
            body.remove(*field);
        }
        Document {
            body,
            revision: self.envelope.rev,
        }
    }
}

/// A document with internal fields removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub body: Map<String, Value>,
    pub revision: Option<String>,
}
