#![allow(dead_code)]

use axum::{
    body::Body,
    extract::State,
    http::StatusCode,
    response::{ IntoResponse, Response },
    routing::{ get, post },
    Json,
    Router,
};
use serde_json::{ json, Value };
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Fresh directory under the system temp dir, removed on drop.
pub struct TempDir {
    pub path: PathBuf,
}

impl TempDir {
    pub fn new(label: &str) -> Self {
        let path = std::env::temp_dir().join(format!("ollama-webui-{}-{}", label, Uuid::new_v4()));
        std::fs::create_dir_all(&path).expect("create temp dir");
        Self { path }
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// What the stub inference server answers on `/api/generate`.
#[derive(Clone)]
pub enum GenerateReply {
    Chunks(Vec<&'static str>),
    Status(StatusCode),
}

#[derive(Clone)]
struct StubState {
    reply: GenerateReply,
    last_request: Arc<Mutex<Option<Value>>>,
}

pub struct StubUpstream {
    pub base_url: String,
    pub last_request: Arc<Mutex<Option<Value>>>,
}

/// Serves a fake Ollama on an ephemeral port.
pub async fn spawn_stub_upstream(reply: GenerateReply) -> StubUpstream {
    let last_request = Arc::new(Mutex::new(None));
    let state = StubState { reply, last_request: last_request.clone() };

    let app = Router::new()
        .route("/api/tags", get(tags))
        .route("/api/generate", post(generate))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    StubUpstream { base_url: format!("http://{}", addr), last_request }
}

/// A base URL nothing is listening on.
pub async fn refused_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{}", addr)
}

async fn tags() -> Json<Value> {
    Json(json!({
        "models": [
            {"name": "llama3:8b", "size": 4661224676u64},
            {"name": "mistral:latest", "size": 4109865159u64},
            {"name": "qwen3:4b", "size": 2497293918u64},
        ]
    }))
}

async fn generate(State(state): State<StubState>, Json(body): Json<Value>) -> Response {
    *state.last_request.lock().await = Some(body);
    match state.reply {
        GenerateReply::Status(status) => (status, "model not found").into_response(),
        GenerateReply::Chunks(chunks) => {
            let stream = futures::stream::iter(chunks.into_iter().map(Ok::<_, Infallible>));
            Response::builder()
                .header("content-type", "application/x-ndjson")
                .body(Body::from_stream(stream))
                .expect("stub response")
        }
    }
}
