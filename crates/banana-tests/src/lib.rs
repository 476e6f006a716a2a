//! Integration tests for the banana code-intelligence layer
//!
//! This crate provides [`StubBackend`], an in-process HTTP server that
//! speaks the type-checking backend's protocol, and end-to-end tests of
//! the complete editor loop:
//! Catalog → Grammar → Highlighting, Edit → Type Table → Completion

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, StatusCode};
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use banana_session::SessionConfig;

/// A request as seen by the stub
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    /// `content` field of the JSON body, empty for GET
    pub content: String,
}

/// Scripted answers, keyed by the posted content
#[derive(Default)]
struct StubState {
    catalog: Mutex<Value>,
    tables: Mutex<HashMap<String, Value>>,
    reports: Mutex<HashMap<String, Value>>,
    delays: Mutex<HashMap<String, Duration>>,
    /// Number of upcoming requests answered with 503
    failures: AtomicU32,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl StubState {
    fn take_failure(&self) -> bool {
        self.failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// In-process stand-in for the type-checking backend
pub struct StubBackend {
    addr: SocketAddr,
    state: Arc<StubState>,
    task: JoinHandle<()>,
}

impl StubBackend {
    /// Starts serving on an ephemeral local port
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(StubState {
            catalog: Mutex::new(json!({ "components": [] })),
            ..Default::default()
        });

        let served = state.clone();
        let task = tokio::spawn(async move {
            loop {
                let (stream, remote_addr) = match listener.accept().await {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        tracing::error!("stub backend stopped accepting: {}", err);
                        return;
                    }
                };
                let io = TokioIo::new(stream);
                let state = served.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        let state = state.clone();
                        async move { Ok::<_, Infallible>(handle_request(req, state).await) }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        tracing::debug!("stub connection from {} closed: {:?}", remote_addr, err);
                    }
                });
            }
        });

        tracing::debug!("stub backend listening on http://{}", addr);
        Ok(Self { addr, state, task })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Session configuration pointing at this stub
    pub fn config(&self) -> SessionConfig {
        SessionConfig::new(&format!("http://{}/", self.addr)).expect("stub address is a valid url")
    }

    /// Sets the body of `GET /banana/metadata`
    pub fn set_catalog(&self, catalog: Value) {
        *self.state.catalog.lock() = catalog;
    }

    /// Sets the type table returned for `content`
    pub fn set_table(&self, content: &str, table: Value) {
        self.state.tables.lock().insert(content.to_string(), table);
    }

    /// Sets the report returned by type check and submit for `content`
    pub fn set_report(&self, content: &str, report: Value) {
        self.state.reports.lock().insert(content.to_string(), report);
    }

    /// Delays every answer about `content`
    pub fn set_delay(&self, content: &str, delay: Duration) {
        self.state.delays.lock().insert(content.to_string(), delay);
    }

    /// Answers the next `count` requests with `503 Service Unavailable`
    pub fn fail_next(&self, count: u32) {
        self.state.failures.store(count, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().len()
    }
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle_request(req: hyper::Request<Incoming>, state: Arc<StubState>) -> hyper::Response<Full<Bytes>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let body = match req.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => return respond(StatusCode::BAD_REQUEST, json!({ "error": e.to_string() })),
    };
    let content = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|v| v.get("content")?.as_str().map(String::from))
        .unwrap_or_default();

    state.requests.lock().push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        content: content.clone(),
    });

    let delay = state.delays.lock().get(&content).copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    if state.take_failure() {
        return respond(StatusCode::SERVICE_UNAVAILABLE, json!({ "error": "type checker unavailable" }));
    }

    match (method, path.as_str()) {
        (Method::GET, "/banana/metadata") => respond(StatusCode::OK, state.catalog.lock().clone()),
        (Method::POST, "/banana/metadata") => {
            let table = state.tables.lock().get(&content).cloned();
            respond(StatusCode::OK, table.unwrap_or_else(|| json!({})))
        }
        (Method::POST, "/banana/typeck") | (Method::POST, "/banana") => {
            let report = state.reports.lock().get(&content).cloned();
            respond(
                StatusCode::OK,
                report.unwrap_or_else(|| json!({ "errors": [], "warnings": [] })),
            )
        }
        _ => respond(StatusCode::NOT_FOUND, json!({ "error": "Not Found" })),
    }
}

fn respond(status: StatusCode, body: Value) -> hyper::Response<Full<Bytes>> {
    let mut response = hyper::Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Catalog used across the tests, in wire format
pub fn sample_catalog() -> Value {
    json!({
        "components": [
            {
                "name": "MonascaMarkovChainSource",
                "description": "Generates fake Monasca metrics",
                "params": [
                    { "name": "sleep", "type": { "id": "number" }, "default_value": 0.01 }
                ]
            },
            {
                "name": "JsonLDP",
                "description": "Parses JSON messages",
                "params": [
                    { "name": "mode", "type": { "id": "enum", "variants": ["strict", "lenient"] }, "default_value": "strict" },
                    { "name": "params", "type": { "id": "object", "props": { "alpha": { "id": "number" }, "label": { "id": "string" } } }, "default_value": { "alpha": 0.5, "label": "" } }
                ]
            },
            { "name": "HttpSink", "description": "Serves data over HTTP", "params": [] }
        ]
    })
}

/// Pipeline used across the tests
pub const SAMPLE_SOURCE: &str = "src = MonascaMarkovChainSource(sleep=0.1)\nldp = JsonLDP()\nsink = HttpSink()\nsrc -> ldp -> sink\n";

/// Type table the backend infers for [`SAMPLE_SOURCE`], in wire format
pub fn sample_table() -> Value {
    json!({
        "src": {
            "id": "component",
            "name": "MonascaMarkovChainSource",
            "args": [{ "name": "sleep", "type": { "id": "number" }, "default_value": 0.01 }]
        },
        "ldp": {
            "id": "component",
            "name": "JsonLDP",
            "args": [
                { "name": "mode", "type": { "id": "enum", "variants": ["strict", "lenient"] }, "default_value": "strict" },
                { "name": "params", "type": { "id": "object", "props": { "alpha": { "id": "number" }, "label": { "id": "string" } } }, "default_value": null }
            ]
        },
        "sink": { "id": "component", "name": "HttpSink", "args": [] }
    })
}

/// Report with one error on the first line, in wire format
pub fn sample_report(message: &str) -> Value {
    json!({
        "errors": [{
            "startLineNumber": 1,
            "startColumn": 7,
            "endLineNumber": 1,
            "endColumn": 31,
            "byteRange": [6, 30],
            "message": message
        }],
        "warnings": []
    })
}

#[cfg(test)]
mod backend_tests {
    use super::*;
    use banana_schema::Type;
    use banana_session::{BananaError, HttpBackend, RemoteService};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_fetch_catalog_decodes_wire_format() {
        let stub = StubBackend::start().await.unwrap();
        stub.set_catalog(sample_catalog());
        let backend = HttpBackend::new(stub.config());

        let catalog = backend.fetch_catalog().await.unwrap();
        assert_eq!(
            catalog.names().collect::<Vec<_>>(),
            vec!["MonascaMarkovChainSource", "JsonLDP", "HttpSink"]
        );
        let ldp = catalog.find("JsonLDP").unwrap();
        assert_eq!(ldp.params[0].ty, Type::Enum { variants: vec!["strict".into(), "lenient".into()] });
        assert_eq!(ldp.params[1].documentation(), r#"object default_value: {"alpha":0.5,"label":""}"#);

        let requests = stub.requests();
        assert_eq!(requests[0].method, Method::GET);
        assert_eq!(requests[0].path, "/banana/metadata");
    }

    #[tokio::test]
    async fn test_infer_types_posts_content() {
        let stub = StubBackend::start().await.unwrap();
        stub.set_table(SAMPLE_SOURCE, sample_table());
        let backend = HttpBackend::new(stub.config());

        let table = backend.infer_types(SAMPLE_SOURCE).await.unwrap();
        assert_eq!(table.len(), 3);
        assert!(table.contains("src") && table.contains("ldp") && table.contains("sink"));

        let request = &stub.requests()[0];
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/banana/metadata");
        assert_eq!(request.content, SAMPLE_SOURCE);
    }

    #[tokio::test]
    async fn test_typecheck_decodes_report() {
        let stub = StubBackend::start().await.unwrap();
        stub.set_report("x = Nope()", sample_report("unknown component Nope"));
        let backend = HttpBackend::new(stub.config());

        let report = backend.typecheck("x = Nope()").await.unwrap();
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].byte_range, (6, 30));
        assert_eq!(report.errors[0].start_column, 7);
        assert_eq!(stub.requests()[0].path, "/banana/typeck");
    }

    #[tokio::test]
    async fn test_submit_posts_to_banana() {
        let stub = StubBackend::start().await.unwrap();
        let backend = HttpBackend::new(stub.config());

        let report = backend.submit(SAMPLE_SOURCE).await.unwrap();
        assert!(report.is_empty());
        assert_eq!(stub.requests()[0].path, "/banana");
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let stub = StubBackend::start().await.unwrap();
        stub.fail_next(1);
        let backend = HttpBackend::new(stub.config());

        let err = backend.typecheck("a = 1").await.unwrap_err();
        match err {
            BananaError::Status { status, body } => {
                assert_eq!(status, 503);
                assert!(body.contains("unavailable"));
            }
            other => panic!("expected a status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let stub = StubBackend::start().await.unwrap();
        let mut config = stub.config();
        config.typecheck_path = "/banana/check".to_string();
        let backend = HttpBackend::new(config);

        let err = backend.typecheck("a = 1").await.unwrap_err();
        assert!(matches!(err, BananaError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let stub = StubBackend::start().await.unwrap();
        stub.set_catalog(json!({ "components": "none" }));
        let backend = HttpBackend::new(stub.config());

        let err = backend.fetch_catalog().await.unwrap_err();
        assert!(matches!(err, BananaError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let config = SessionConfig::new(&format!("http://{}/", addr)).unwrap();
        let backend = HttpBackend::new(config);

        let err = backend.fetch_catalog().await.unwrap_err();
        assert!(matches!(err, BananaError::Transport(_)));
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let stub = StubBackend::start().await.unwrap();
        stub.set_delay("slow", Duration::from_millis(500));
        let config = stub.config().with_timeout(Duration::from_millis(50));
        let backend = HttpBackend::new(config);

        let err = backend.typecheck("slow").await.unwrap_err();
        assert!(matches!(err, BananaError::Timeout(50)));
    }
}
