use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// Scriptable stand-in for the dashboard backend.
#[derive(Debug)]
pub struct MockBackend {
    pub config: Value,
    /// Bodies received by `POST /api/config`, in order.
    pub saved: Vec<Value>,
    pub init_calls: usize,
    /// Respond to `POST /api/config` with `success: false` and this error.
    pub reject_save: Option<String>,
    /// Respond to `POST /api/init` with `success: false` and this error.
    pub fail_init: Option<String>,
    /// Force this HTTP status on `POST /chat`.
    pub chat_status: Option<u16>,
    pub chat_reply: String,
    pub env_content: String,
    pub llm: Value,
    pub tools: Value,
    pub status: Value,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            config: json!({ "mcpServers": [] }),
            saved: vec![],
            init_calls: 0,
            reject_save: None,
            fail_init: None,
            chat_status: None,
            chat_reply: "ok".into(),
            env_content: String::new(),
            llm: json!({ "llm_provider": "openai", "model_name": "gpt-5-mini" }),
            tools: json!({}),
            status: json!({ "active_servers": [], "inactive_servers": [] }),
        }
    }
}

pub type SharedBackend = Arc<Mutex<MockBackend>>;

pub async fn spawn(backend: SharedBackend) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((cnx, _)) = listener.accept().await else {
                break;
            };
            let io = TokioIo::new(cnx);
            let backend = backend.clone();
            tokio::spawn(async move {
                let service = service_fn(move |req| handle(backend.clone(), req));
                let _ = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                    .serve_connection(io, service)
                    .await;
            });
        }
    });
    addr
}

async fn handle(
    backend: SharedBackend,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => Bytes::new(),
    };
    Ok(route(&backend, method, &path, &body))
}

fn route(backend: &SharedBackend, method: Method, path: &str, body: &[u8]) -> Response<Full<Bytes>> {
    let mut state = backend.lock().unwrap();
    if method == Method::POST && path == "/chat" {
        if let Some(code) = state.chat_status {
            return json_response(
                StatusCode::from_u16(code).unwrap(),
                json!({ "response": "agent unavailable" }),
            );
        }
        return ok(json!({ "response": state.chat_reply }));
    }
    if method == Method::GET && path == "/api/config" {
        return ok(state.config.clone());
    }
    if method == Method::POST && path == "/api/config" {
        let doc: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
        state.saved.push(doc.clone());
        if let Some(error) = &state.reject_save {
            return ok(json!({ "success": false, "error": error }));
        }
        state.config = doc;
        return ok(json!({ "success": true }));
    }
    if method == Method::POST && path == "/api/init" {
        state.init_calls += 1;
        if let Some(error) = &state.fail_init {
            return ok(json!({ "success": false, "error": error }));
        }
        return ok(json!({ "success": true }));
    }
    if method == Method::GET && path == "/api/tools" {
        return ok(state.tools.clone());
    }
    if method == Method::GET && path == "/api/env" {
        return ok(json!({ "content": state.env_content }));
    }
    if method == Method::POST && path == "/api/env" {
        let doc: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
        state.env_content = doc["content"].as_str().unwrap_or_default().to_string();
        return ok(json!({ "success": true }));
    }
    if method == Method::GET && path == "/api/llm_config" {
        return ok(state.llm.clone());
    }
    if method == Method::POST && path == "/api/llm_config" {
        state.llm = serde_json::from_slice(body).unwrap_or(Value::Null);
        return ok(json!({ "success": true }));
    }
    if method == Method::GET && path == "/api/server-status" {
        return ok(state.status.clone());
    }
    json_response(StatusCode::NOT_FOUND, json!({ "error": "not found" }))
}

fn ok(value: Value) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, value)
}

fn json_response(status: StatusCode, value: Value) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(value.to_string())))
        .unwrap()
}
