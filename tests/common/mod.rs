// Shared test fixtures: a recording mock HTTP server and a recording
// echo gRPC executor.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use seldon_client::proto::{SeldonMessage, seldon_message::DataOneof};
use seldon_client::transport::TransportError;
use seldon_client::transport::grpc::{GrpcCall, GrpcExecutor};
use serde_json::Value;

/// Canned response for one path prefix.
#[derive(Clone)]
pub struct ResponseSpec {
    pub status: u16,
    pub body: Value,
}

impl ResponseSpec {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn json_body(&self) -> Value {
        serde_json::from_str(&self.body).expect("request body is not JSON")
    }

    /// Decode a form-encoded body into its fields.
    pub fn form_body(&self) -> Vec<(String, String)> {
        serde_urlencoded::from_str(&self.body).expect("request body is not form-encoded")
    }
}

#[derive(Clone)]
struct MockState {
    routes: Arc<Vec<(String, ResponseSpec)>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

/// In-process HTTP server on 127.0.0.1:0 that records every request
/// and answers from a prefix-matched route table.
pub struct MockServer {
    pub addr: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
}

impl MockServer {
    /// `routes` are (path-prefix, response) pairs, first match wins;
    /// use `""` as the catch-all.
    pub async fn start(routes: Vec<(&str, ResponseSpec)>) -> Self {
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0))
            .await
            .expect("bind mock server");
        let addr = format!("127.0.0.1:{}", listener.local_addr().unwrap().port());

        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            routes: Arc::new(
                routes
                    .into_iter()
                    .map(|(prefix, spec)| (prefix.to_string(), spec))
                    .collect(),
            ),
            requests: requests.clone(),
        };
        let app = Router::new().fallback(handler).with_state(state);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("mock server failed");
        });

        Self {
            addr,
            requests,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, prefix: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.starts_with(prefix))
            .collect()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn handler(State(state): State<MockState>, request: Request) -> impl IntoResponse {
    let path = request.uri().path().to_string();
    let headers = request
        .headers()
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_string(),
                v.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();
    let bytes = axum::body::to_bytes(request.into_body(), usize::MAX)
        .await
        .unwrap_or_default();
    state.requests.lock().unwrap().push(Recorded {
        path: path.clone(),
        headers,
        body: String::from_utf8_lossy(&bytes).to_string(),
    });

    let spec = state
        .routes
        .iter()
        .find(|(prefix, _)| path.starts_with(prefix.as_str()))
        .map(|(_, spec)| spec.clone())
        .unwrap_or_else(|| ResponseSpec::ok(serde_json::json!({})));
    (
        StatusCode::from_u16(spec.status).expect("valid status code"),
        axum::Json(spec.body),
    )
}

/// gRPC executor fake: records every call and answers with the called
/// operation's name as `strData`, the way a stub-level mock would.
#[derive(Clone, Default)]
pub struct EchoGrpcExecutor {
    calls: Arc<Mutex<Vec<GrpcCall>>>,
}

impl EchoGrpcExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<GrpcCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GrpcExecutor for EchoGrpcExecutor {
    async fn execute(&self, call: GrpcCall) -> Result<SeldonMessage, TransportError> {
        let operation = call.route.operation();
        self.calls.lock().unwrap().push(call);
        Ok(SeldonMessage {
            meta: None,
            data_oneof: Some(DataOneof::StrData(operation.as_str().to_string())),
        })
    }
}

/// gRPC executor fake that always fails with an RPC fault.
pub struct FailingGrpcExecutor {
    pub message: String,
}

#[async_trait]
impl GrpcExecutor for FailingGrpcExecutor {
    async fn execute(&self, _call: GrpcCall) -> Result<SeldonMessage, TransportError> {
        Err(TransportError::Rpc(self.message.clone()))
    }
}

/// Message JSON body echoing a 1x1 tensor, as a healthy deployment
/// would answer a smoke predict.
pub fn tensor_response() -> Value {
    serde_json::json!({"data": {"tensor": {"shape": [1, 1], "values": [0.5]}}})
}

pub fn token_response(token: &str) -> ResponseSpec {
    ResponseSpec::ok(serde_json::json!({"access_token": token, "token_type": "bearer"}))
}
