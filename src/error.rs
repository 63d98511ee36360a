//! HTTP-facing error taxonomy. Every failure leaving a handler is an `AppError`
//! and renders the same `{success: false, ...}` JSON envelope.

use std::time::Duration;

use axum::{
  http::{header, HeaderValue, StatusCode},
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::openai::LlmError;
use crate::protocol::FieldError;
use crate::util::now_iso;

pub const UPSTREAM_USER_MESSAGE: &str =
  "The AI service is temporarily unavailable. Please try again later.";

#[derive(Debug, Error)]
pub enum AppError {
  /// Inbound request failed schema validation; carries every violation.
  #[error("invalid input ({} violations)", .0.len())]
  Validation(Vec<FieldError>),

  /// Request was well-formed but unusable after cleanup.
  #[error("{0}")]
  Processing(String),

  /// The model provider could not be reached or refused the call.
  /// The cause is logged where it happens and never sent to the caller.
  #[error("upstream model unavailable")]
  UpstreamUnavailable,

  /// Client spent its request budget for the current window.
  #[error("rate limited")]
  RateLimited { retry_after: Duration },

  #[error("route not found: {method} {path}")]
  NotFound { method: String, path: String },

  #[error("internal error: {0}")]
  Internal(String),
}

impl From<LlmError> for AppError {
  fn from(e: LlmError) -> Self {
    error!(target: "analysis", error = %e, "Model call failed");
    AppError::UpstreamUnavailable
  }
}

/// Endpoint list sent back with every 404.
pub fn available_endpoints() -> serde_json::Value {
  json!({
    "root": "GET /",
    "health": "GET /health",
    "modelHealth": "GET /health/model",
    "analyzeQuestion": "POST /api/v1/analyze-question",
    "analyzeQuestionDocs": "GET /api/v1/analyze-question"
  })
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let timestamp = now_iso();
    let (status, body) = match self {
      AppError::Validation(details) => {
        warn!(target: "analysis", violations = details.len(), "Validation failed");
        (
          StatusCode::BAD_REQUEST,
          json!({ "success": false, "error": "Invalid input", "details": details, "timestamp": timestamp }),
        )
      }
      AppError::Processing(message) => (
        StatusCode::BAD_REQUEST,
        json!({ "success": false, "error": "Unable to process question", "message": message, "timestamp": timestamp }),
      ),
      AppError::UpstreamUnavailable => (
        StatusCode::SERVICE_UNAVAILABLE,
        json!({
          "success": false,
          "error": "Unable to generate hints right now",
          "message": UPSTREAM_USER_MESSAGE,
          "timestamp": timestamp
        }),
      ),
      AppError::RateLimited { retry_after } => {
        let secs = retry_after.as_secs();
        let mut res = (
          StatusCode::TOO_MANY_REQUESTS,
          Json(json!({
            "success": false,
            "error": "Too many requests from this IP, please try again later.",
            "message": "Too many requests, please try again later.",
            "retryAfterSecs": secs,
            "timestamp": timestamp
          })),
        )
          .into_response();
        res.headers_mut().insert(header::RETRY_AFTER, HeaderValue::from(secs));
        return res;
      }
      AppError::NotFound { method, path } => {
        warn!(target: "student_buddy", %method, %path, "404 - Route not found");
        (
          StatusCode::NOT_FOUND,
          json!({
            "success": false,
            "error": "Route not found",
            "message": format!("Cannot {} {}", method, path),
            "availableEndpoints": available_endpoints(),
            "timestamp": timestamp
          }),
        )
      }
      AppError::Internal(detail) => {
        error!(target: "student_buddy", %detail, "Unhandled error");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          json!({ "success": false, "error": "Internal server error", "timestamp": timestamp }),
        )
      }
    };
    (status, Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::body::to_bytes;

  async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
    let res = err.into_response();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  #[tokio::test]
  async fn internal_errors_do_not_leak_detail() {
    let (status, body) = body_json(AppError::Internal("db password is hunter2".into())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    assert!(!body.to_string().contains("hunter2"));
  }

  #[tokio::test]
  async fn upstream_maps_to_503_with_generic_message() {
    let err: AppError = LlmError::Timeout.into();
    let (status, body) = body_json(err).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["message"], UPSTREAM_USER_MESSAGE);
    assert_eq!(body["success"], false);
  }

  #[tokio::test]
  async fn rate_limited_is_429_with_retry_after() {
    let res = AppError::RateLimited { retry_after: Duration::from_secs(900) }.into_response();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(res.headers().get(header::RETRY_AFTER).and_then(|v| v.to_str().ok()), Some("900"));
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Too many requests, please try again later.");
  }

  #[tokio::test]
  async fn not_found_lists_endpoints() {
    let (status, body) = body_json(AppError::NotFound { method: "GET".into(), path: "/nope".into() }).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Cannot GET /nope");
    assert_eq!(body["availableEndpoints"]["analyzeQuestion"], "POST /api/v1/analyze-question");
  }
}
