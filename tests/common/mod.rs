//! Shared test scaffolding: an in-process chat-completions endpoint and a
//! backend router wired to it.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
  body::Body,
  extract::State,
  http::{Request, StatusCode},
  routing::post,
  Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use student_buddy::config::ServerConfig;
use student_buddy::routes::build_router;
use student_buddy::state::AppState;

#[derive(Clone)]
pub struct MockModel {
  pub status: StatusCode,
  pub content: String,
}

impl MockModel {
  pub fn answering(content: impl Into<String>) -> Self {
    Self { status: StatusCode::OK, content: content.into() }
  }

  pub fn failing(status: StatusCode) -> Self {
    Self { status, content: String::new() }
  }
}

async fn chat_completions(State(mock): State<Arc<MockModel>>, Json(_req): Json<Value>) -> (StatusCode, Json<Value>) {
  if !mock.status.is_success() {
    return (mock.status, Json(json!({ "error": { "message": "mock upstream failure" } })));
  }
  (
    StatusCode::OK,
    Json(json!({
      "choices": [{ "message": { "role": "assistant", "content": mock.content } }],
      "usage": { "prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30 }
    })),
  )
}

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn serve(app: Router) -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
  let addr = listener.local_addr().expect("local addr");
  tokio::spawn(async move {
    axum::serve(listener, app).await.expect("serve");
  });
  format!("http://{}", addr)
}

/// Start the mock model and return a base URL usable as `OPENAI_BASE_URL`.
pub async fn spawn_model(mock: MockModel) -> String {
  let app = Router::new()
    .route("/chat/completions", post(chat_completions))
    .with_state(Arc::new(mock));
  serve(app).await
}

pub fn backend(base_url: &str, api_key: Option<&str>) -> Router {
  backend_from(ServerConfig {
    base_url: base_url.to_string(),
    api_key: api_key.map(str::to_string),
    ..ServerConfig::default()
  })
}

pub fn backend_from(cfg: ServerConfig) -> Router {
  let state = AppState::new(&cfg).expect("state");
  build_router(Arc::new(state))
}

/// Backend talking to a mock model that answers `mock`.
pub async fn backend_with(mock: MockModel) -> Router {
  let url = spawn_model(mock).await;
  backend(&url, Some("test-key"))
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
  Request::builder()
    .method("POST")
    .uri(uri)
    .header("content-type", "application/json")
    .body(Body::from(body.to_string()))
    .expect("request")
}

pub fn get(uri: &str) -> Request<Body> {
  Request::builder().uri(uri).body(Body::empty()).expect("request")
}

pub async fn body_json(res: axum::response::Response) -> Value {
  let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.expect("body");
  serde_json::from_slice(&bytes).expect("json body")
}

pub const TWO_SUM: &str = "Given an array of integers nums and an integer target, return indices of the two numbers such that they add up to target.";
