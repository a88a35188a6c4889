//! HTTP client for documents and attachments on a sync gateway.
//!
//! Every operation is an independent request/response exchange against
//! `{endpoint}/{document_id}` or `{endpoint}/{document_id}/{attachment}`.
//! Writes re-read the current revision immediately before acting; the
//! gateway's own revision check is the only guard against concurrent writers.

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::content_type::sniff_content_type;
use super::error::GatewayError;
use super::protocol::{AttachmentMeta, Document, RawDocument, WriteResponse};
use crate::auth::AuthProvider;
use crate::config::{Config, ConfigError};
use crate::transport::shared_client;

/// Client for one sync gateway database endpoint.
#[derive(Debug)]
pub struct GatewayClient {
    endpoint: String,
    host: Option<String>,
    http: reqwest::Client,
    auth: AuthProvider,
}

impl GatewayClient {
    /// Creates a client for `endpoint` using the given transport and auth.
    pub fn new(endpoint: impl Into<String>, auth: AuthProvider, http: reqwest::Client) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        let host = reqwest::Url::parse(&endpoint)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string));

        Self {
            endpoint,
            host,
            http,
            auth,
        }
    }

    /// Creates a client from config using the shared transport.
    ///
    /// Returns an error if no sync URL is configured.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let endpoint = config
            .sync_url
            .value
            .clone()
            .ok_or(ConfigError::MissingSyncUrl)?;
        let http = shared_client();
        let auth = AuthProvider::new(config.auth.clone(), http.clone());

        Ok(Self::new(endpoint, auth, http))
    }

    /// Returns the sync endpoint, without trailing slash.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetches a document and strips the gateway's internal fields.
    pub async fn get_document(&self, id: &str) -> Result<Document, GatewayError> {
        let raw = self.get_raw_document(id).await?;
        Ok(raw.into_document())
    }

    /// Fetches a document verbatim, internal fields included.
    pub async fn get_raw_document(&self, id: &str) -> Result<RawDocument, GatewayError> {
        let url = self.document_url(id, None);
        debug!("GET {}", url);

        let mut request = self.http.get(&url);
        if self.auth.config().authenticate_reads {
            request = self.authorize(request).await?;
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(error_for_status(response, id).await);
        }

        let bytes = response.bytes().await?;
        Ok(RawDocument::from_slice(&bytes)?)
    }

    /// Creates or fully replaces a document, returning the new revision.
    ///
    /// The current revision is looked up first and sent as `?rev=`; a
    /// document that does not exist yet is written without it.
    pub async fn post_document<T>(&self, body: &T, id: &str) -> Result<Option<String>, GatewayError>
    where
        T: Serialize + ?Sized,
    {
        let rev = self.current_revision(id).await?;
        let url = self.document_url(id, rev.as_deref());
        debug!("PUT {}", url);

        let request = self.authorize(self.http.put(&url).json(body)).await?;
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(error_for_status(response, id).await);
        }

        let contents = response.bytes().await?;
        let written: WriteResponse = serde_json::from_slice(&contents)?;

        info!(
            "Wrote document {} ({} -> {})",
            id,
            rev.as_deref().unwrap_or("new"),
            written.rev.as_deref().unwrap_or("?")
        );

        Ok(written.rev)
    }

    /// Deletes a document at its current revision.
    ///
    /// Only transport and auth failures are errors; the response status is
    /// logged, not checked.
    pub async fn delete_document(&self, id: &str) -> Result<(), GatewayError> {
        let rev = self.current_revision(id).await?;
        let url = self.document_url(id, rev.as_deref());
        debug!("DELETE {}", url);

        let request = self.authorize(self.http.delete(&url)).await?;
        let response = request.send().await?;
        let status = response.status();
        response.bytes().await?;

        if status.is_success() {
            info!("Deleted document {}", id);
        } else {
            warn!("Delete of document {} returned status {}", id, status);
        }

        Ok(())
    }

    /// Uploads `content` as attachment `name` of document `parent_id`.
    ///
    /// The content type is sniffed from the leading bytes. Returns the
    /// response status; the body is discarded.
    pub async fn post_attachment(
        &self,
        content: impl Into<Vec<u8>>,
        parent_id: &str,
        name: &str,
    ) -> Result<StatusCode, GatewayError> {
        let content = content.into();
        let content_type = sniff_content_type(&content);
        let url = self.attachment_url(parent_id, name);
        debug!("PUT {} ({}, {} bytes)", url, content_type, content.len());

        let request = self
            .http
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(content);
        let request = self.authorize(request).await?;

        let response = request.send().await?;
        let status = response.status();
        response.bytes().await?;

        if status.is_success() {
            info!("Post status code: {}", status);
        } else {
            warn!("Post status code: {}", status);
        }

        Ok(status)
    }

    /// Returns the metadata of attachment `name` on `parent_id`, if listed.
    pub async fn get_attachment_meta(
        &self,
        parent_id: &str,
        name: &str,
    ) -> Result<Option<AttachmentMeta>, GatewayError> {
        let raw = self.get_raw_document(parent_id).await?;
        Ok(raw.attachment(name).cloned())
    }

    /// Returns the server-computed digest of attachment `name` on `parent_id`.
    ///
    /// `None` if the document has no such attachment or it carries no digest.
    pub async fn get_attachment_digest(
        &self,
        parent_id: &str,
        name: &str,
    ) -> Result<Option<String>, GatewayError> {
        let meta = self.get_attachment_meta(parent_id, name).await?;
        Ok(meta.and_then(|m| m.digest))
    }

    /// Looks up the revision to qualify a write with.
    ///
    /// A missing document yields `None`; any other failure aborts the write.
    async fn current_revision(&self, id: &str) -> Result<Option<String>, GatewayError> {
        match self.get_raw_document(id).await {
            Ok(raw) => Ok(raw.envelope.rev),
            Err(GatewayError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, GatewayError> {
        Ok(self.auth.apply(request, self.host.as_deref()).await?)
    }

    /// Builds `{endpoint}/{id}[?rev={rev}]`.
    fn document_url(&self, id: &str, rev: Option<&str>) -> String {
        let url = format!("{}/{}", self.endpoint, urlencoding::encode(id));
        match rev {
            Some(rev) => format!("{}?rev={}", url, urlencoding::encode(rev)),
            None => url,
        }
    }

    /// Builds `{endpoint}/{parent_id}/{name}`.
    fn attachment_url(&self, parent_id: &str, name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint,
            urlencoding::encode(parent_id),
            urlencoding::encode(name)
        )
    }
}

/// Drains a non-success response into the matching error.
async fn error_for_status(response: Response, id: &str) -> GatewayError {
    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return GatewayError::Transport(e.to_string()),
    };

    match status {
        StatusCode::NOT_FOUND => GatewayError::NotFound(id.to_string()),
        StatusCode::CONFLICT => GatewayError::Conflict(id.to_string()),
        _ => GatewayError::Status {
            status: status.as_u16(),
            body,
        },
    }
}
