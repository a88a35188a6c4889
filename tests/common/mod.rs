//! In-process fake sync gateway for integration tests.
//!
//! Serves documents from memory under `/db`, issues sessions from `/auth`,
//! and records every request it receives.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Map, Value};
use sync_gateway_client::{AuthConfig, AuthProvider, GatewayClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub const SESSION_COOKIE: &str = "SyncGatewaySession=sess-1";

/// A request as seen by the fake gateway.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

#[derive(Debug, Clone)]
struct StoredDoc {
    generation: u64,
    rev: String,
    body: Map<String, Value>,
    attachments: Map<String, Value>,
}

#[derive(Debug)]
struct GatewayState {
    docs: HashMap<String, StoredDoc>,
    raw_docs: HashMap<String, String>,
    requests: Vec<RecordedRequest>,
    rev_suffix: String,
    auth_response: (StatusCode, String),
    fail_reads: bool,
}

type SharedState = Arc<Mutex<GatewayState>>;

/// Handle to a running fake gateway.
pub struct MockGateway {
    pub addr: SocketAddr,
    state: SharedState,
}

impl MockGateway {
    pub async fn spawn() -> Self {
        init_tracing();

        let state = Arc::new(Mutex::new(GatewayState {
            docs: HashMap::new(),
            raw_docs: HashMap::new(),
            requests: Vec::new(),
            rev_suffix: "abc".to_string(),
            auth_response: (
                StatusCode::OK,
                json!({
                    "session_id": "sess-1",
                    "expires": "2099-01-01T00:00:00Z",
                    "cookie_name": "SyncGatewaySession"
                })
                .to_string(),
            ),
            fail_reads: false,
        }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(handle).with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}/db", self.addr)
    }

    pub fn auth_url(&self) -> String {
        format!("http://{}/auth", self.addr)
    }

    pub fn client(&self, auth: AuthConfig) -> GatewayClient {
        let http = reqwest::Client::new();
        GatewayClient::new(self.endpoint(), AuthProvider::new(auth, http.clone()), http)
    }

    pub fn anonymous_client(&self) -> GatewayClient {
        self.client(AuthConfig::default())
    }

    pub fn session_auth(&self) -> AuthConfig {
        AuthConfig {
            username: Some("alice".to_string()),
            password: Some("secret".to_string()),
            simple_auth: false,
            server_url: Some(self.auth_url()),
            ..AuthConfig::default()
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Requests other than logins against the auth endpoint.
    pub fn gateway_requests(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path != "/auth")
            .collect()
    }

    pub fn requests_with(&self, method: Method) -> Vec<RecordedRequest> {
        self.gateway_requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }

    pub fn auth_calls(&self) -> usize {
        self.requests().iter().filter(|r| r.path == "/auth").count()
    }

    pub fn set_auth_response(&self, status: StatusCode, body: impl Into<String>) {
        self.state.lock().unwrap().auth_response = (status, body.into());
    }

    pub fn set_raw_document(&self, id: &str, body: &str) {
        self.state
            .lock()
            .unwrap()
            .raw_docs
            .insert(id.to_string(), body.to_string());
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.state.lock().unwrap().fail_reads = fail;
    }

    pub fn stored_rev(&self, id: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .docs
            .get(id)
            .map(|d| d.rev.clone())
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sync_gateway_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

async fn handle(
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut state = state.lock().unwrap();
    state.requests.push(RecordedRequest {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers: headers.clone(),
        body: body.clone(),
    });

    if uri.path() == "/auth" && method == Method::POST {
        let (status, body) = state.auth_response.clone();
        return (status, [(header::CONTENT_TYPE, "application/json")], body).into_response();
    }

    let segments: Vec<String> = uri
        .path()
        .trim_start_matches("/db/")
        .split('/')
        .map(|s| urlencoding::decode(s).unwrap().into_owned())
        .collect();
    let rev = query_rev(&uri);

    match (method, segments.as_slice()) {
        (Method::GET, [id]) => get_doc(&state, id),
        (Method::PUT, [id]) => put_doc(&mut state, id, rev, &body),
        (Method::DELETE, [id]) => delete_doc(&mut state, id, rev),
        (Method::PUT, [id, name]) if !name.is_empty() => {
            put_attachment(&mut state, id, name, &headers, &body)
        }
        _ => not_found(),
    }
}

fn query_rev(uri: &Uri) -> Option<String> {
    uri.query()?
        .split('&')
        .find_map(|pair| pair.strip_prefix("rev="))
        .map(|rev| urlencoding::decode(rev).unwrap().into_owned())
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "not_found", "reason": "missing"})),
    )
        .into_response()
}

fn conflict() -> Response {
    (
        StatusCode::CONFLICT,
        Json(json!({"error": "conflict", "reason": "Document revision conflict"})),
    )
        .into_response()
}

fn get_doc(state: &GatewayState, id: &str) -> Response {
    if state.fail_reads {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    if let Some(raw) = state.raw_docs.get(id) {
        return (StatusCode::OK, raw.clone()).into_response();
    }
    let Some(doc) = state.docs.get(id) else {
        return not_found();
    };

    let mut body = doc.body.clone();
    body.insert("_id".to_string(), json!(id));
    body.insert("_rev".to_string(), json!(doc.rev));
    if !doc.attachments.is_empty() {
        body.insert(
            "_attachments".to_string(),
            Value::Object(doc.attachments.clone()),
        );
    }
    (StatusCode::OK, Json(Value::Object(body))).into_response()
}

fn put_doc(state: &mut GatewayState, id: &str, rev: Option<String>, body: &[u8]) -> Response {
    let Ok(Value::Object(new_body)) = serde_json::from_slice::<Value>(body) else {
        return (StatusCode::BAD_REQUEST, "invalid json").into_response();
    };

    let current = state.docs.get(id).cloned();
    if current.as_ref().map(|d| &d.rev) != rev.as_ref() {
        return conflict();
    }

    let generation = current.as_ref().map_or(0, |d| d.generation) + 1;
    let new_rev = format!("{}-{}", generation, state.rev_suffix);
    state.docs.insert(
        id.to_string(),
        StoredDoc {
            generation,
            rev: new_rev.clone(),
            body: new_body,
            attachments: current.map(|d| d.attachments).unwrap_or_default(),
        },
    );

    (
        StatusCode::CREATED,
        Json(json!({"ok": true, "id": id, "rev": new_rev})),
    )
        .into_response()
}

fn delete_doc(state: &mut GatewayState, id: &str, rev: Option<String>) -> Response {
    match state.docs.get(id) {
        None => not_found(),
        Some(doc) if Some(&doc.rev) != rev.as_ref() => conflict(),
        Some(_) => {
            state.docs.remove(id);
            (StatusCode::OK, Json(json!({"ok": true}))).into_response()
        }
    }
}

fn put_attachment(
    state: &mut GatewayState,
    id: &str,
    name: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let suffix = state.rev_suffix.clone();

    let doc = state.docs.entry(id.to_string()).or_insert_with(|| StoredDoc {
        generation: 0,
        rev: String::new(),
        body: Map::new(),
        attachments: Map::new(),
    });
    doc.generation += 1;
    doc.rev = format!("{}-{}", doc.generation, suffix);
    doc.attachments.insert(
        name.to_string(),
        json!({
            "content_type": content_type,
            "digest": format!("sha1-fake{}", body.len()),
            "length": body.len(),
            "revpos": doc.generation,
            "stub": true
        }),
    );

    (
        StatusCode::CREATED,
        Json(json!({"ok": true, "id": id, "rev": doc.rev})),
    )
        .into_response()
}
