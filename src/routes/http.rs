//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs basic request/result info.

use std::sync::Arc;

use axum::{
  extract::{OriginalUri, State},
  http::Method,
  response::IntoResponse,
  Json,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::extractors::AppJson;
use crate::logic::analyze_question;
use crate::protocol::{HealthOut, ModelHealthOut, SuccessEnvelope};
use crate::state::AppState;
use crate::util::now_iso;
use crate::validate::validate_analysis_input;

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_analyze(
  State(state): State<Arc<AppState>>,
  AppJson(body): AppJson<Value>,
) -> Result<impl IntoResponse, AppError> {
  let req = validate_analysis_input(&body).map_err(AppError::Validation)?;
  info!(
    target: "analysis",
    platform = ?req.platform,
    difficulty = ?req.difficulty,
    question_len = req.question_text.len(),
    "Processing question analysis request"
  );
  let result = analyze_question(&state, &req).await?;
  Ok(Json(SuccessEnvelope::new(result)))
}

/// Usage documentation for humans poking the endpoint with a browser.
#[instrument(level = "info")]
pub async fn http_get_analyze_docs() -> impl IntoResponse {
  Json(json!({
    "message": "Use POST method to analyze a question",
    "endpoint": "POST /api/v1/analyze-question",
    "expectedPayload": {
      "questionText": "string (required) - The full problem statement, 10-10000 characters",
      "difficulty": "string (optional) - easy|medium|hard|beginner|intermediate|advanced",
      "platform": "string (optional) - leetcode|codeforces|hackerrank|codechef|geeksforgeeks|atcoder|topcoder|spoj|cses",
      "includeExplanation": "boolean (optional, default true)",
      "requestPseudoCode": "boolean (optional, default true)"
    },
    "responseFormat": {
      "success": "boolean",
      "data": {
        "hints": ["array of progressive hints"],
        "pseudoCode": "string - pseudo code solution",
        "metadata": { "hintsGenerated": "number", "timestamp": "ISO string", "analysisId": "string" }
      },
      "timestamp": "ISO string"
    },
    "example": {
      "questionText": "Given an array of integers nums and an integer target, return indices of the two numbers such that they add up to target.",
      "difficulty": "easy",
      "platform": "leetcode"
    }
  }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut {
    status: "ok",
    version: env!("CARGO_PKG_VERSION"),
    uptime_secs: state.started_at.elapsed().as_secs(),
    timestamp: now_iso(),
  })
}

/// Operational probe of the model endpoint. Never used by the analysis path.
#[instrument(level = "info", skip(state))]
pub async fn http_model_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let health = state.openai.probe().await;
  info!(target: "student_buddy", status = health.as_str(), "Model probe finished");
  Json(ModelHealthOut { status: health.as_str(), message: health.message(), timestamp: now_iso() })
}

#[instrument(level = "info")]
pub async fn http_root() -> impl IntoResponse {
  Json(json!({
    "message": "Student Buddy Backend API",
    "version": env!("CARGO_PKG_VERSION"),
    "documentation": "/api/v1/analyze-question",
    "endpoints": {
      "health": "GET /health",
      "analyzeQuestion": "POST /api/v1/analyze-question"
    }
  }))
}

pub async fn http_not_found(method: Method, OriginalUri(uri): OriginalUri) -> AppError {
  AppError::NotFound { method: method.to_string(), path: uri.path().to_string() }
}
