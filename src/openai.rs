//! Minimal OpenAI-compatible chat-completions client.
//!
//! We only call chat.completions, requesting a strict JSON object for analyses
//! and a tiny plain completion for the health probe. Calls are instrumented and
//! log model names, latencies and response sizes (not contents).
//!
//! NOTE: We never log the API key.

use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::ServerConfig;

pub const ANALYSIS_TIMEOUT: Duration = Duration::from_secs(30);
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const ANALYSIS_TEMPERATURE: f32 = 0.7;
pub const ANALYSIS_MAX_TOKENS: u32 = 1500;

#[derive(Debug, Error)]
pub enum LlmError {
  #[error("model API key not configured")]
  NotConfigured,
  #[error("model API rejected the API key")]
  Unauthorized,
  #[error("model API rate limit exceeded")]
  RateLimited,
  #[error("model API HTTP {status}: {message}")]
  Status { status: StatusCode, message: String },
  #[error("model API call timed out")]
  Timeout,
  #[error("unable to connect to model API: {0}")]
  Network(String),
  #[error("unreadable model API response: {0}")]
  Decode(String),
}

impl From<reqwest::Error> for LlmError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_timeout() {
      LlmError::Timeout
    } else if e.is_decode() {
      LlmError::Decode(e.to_string())
    } else {
      LlmError::Network(e.to_string())
    }
  }
}

/// Coarse result of the operational probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelHealth {
  Healthy,
  Unreachable,
  Misconfigured,
}

impl ModelHealth {
  pub fn as_str(&self) -> &'static str {
    match self {
      ModelHealth::Healthy => "healthy",
      ModelHealth::Unreachable => "unreachable",
      ModelHealth::Misconfigured => "misconfigured",
    }
  }

  pub fn message(&self) -> &'static str {
    match self {
      ModelHealth::Healthy => "API accessible",
      ModelHealth::Unreachable => "API unreachable",
      ModelHealth::Misconfigured => "API key missing or invalid",
    }
  }
}

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: Option<String>,
  pub base_url: String,
  pub model: String,
}

impl OpenAI {
  pub fn from_config(cfg: &ServerConfig) -> Result<Self, LlmError> {
    let client = reqwest::Client::builder()
      .timeout(ANALYSIS_TIMEOUT)
      .build()
      .map_err(|e| LlmError::Network(e.to_string()))?;
    Ok(Self {
      client,
      api_key: cfg.api_key.clone(),
      base_url: cfg.base_url.trim_end_matches('/').to_string(),
      model: cfg.model.clone(),
    })
  }

  async fn send(&self, req: &ChatCompletionRequest, timeout: Duration) -> Result<ChatCompletionResponse, LlmError> {
    let api_key = self.api_key.as_deref().ok_or(LlmError::NotConfigured)?;
    let url = format!("{}/chat/completions", self.base_url);

    let res = self.client.post(&url)
      .timeout(timeout)
      .header(USER_AGENT, concat!("student-buddy/", env!("CARGO_PKG_VERSION")))
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", api_key))
      .json(req).send().await?;

    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      let message = extract_openai_error(&body).unwrap_or(body);
      return Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::Unauthorized,
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited,
        _ => LlmError::Status { status, message },
      });
    }

    let body: ChatCompletionResponse = res.json().await?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "Model usage");
    }
    Ok(body)
  }

  /// JSON-object chat completion. Returns the raw message text; parsing is the
  /// caller's business because malformed output is recovered, not failed.
  #[instrument(level = "info", skip(self, system, user), fields(model = %self.model, user_len = user.len()))]
  pub async fn chat_json_text(&self, system: &str, user: &str) -> Result<String, LlmError> {
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature: Some(ANALYSIS_TEMPERATURE),
      response_format: Some(ResponseFormat { r#type: "json_object".into() }),
      max_tokens: Some(ANALYSIS_MAX_TOKENS),
    };

    let start = Instant::now();
    let body = self.send(&req, ANALYSIS_TIMEOUT).await?;
    let text = body.choices.into_iter().next()
      .and_then(|c| c.message.content)
      .unwrap_or_default();
    info!(elapsed = ?start.elapsed(), response_len = text.len(), "Model response received");
    Ok(text)
  }

  /// Minimal call against the same endpoint. Used only by the health route.
  #[instrument(level = "info", skip(self), fields(model = %self.model))]
  pub async fn probe(&self) -> ModelHealth {
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![ChatMessageReq { role: "user".into(), content: "Hello".into() }],
      temperature: None,
      response_format: None,
      max_tokens: Some(5),
    };
    match self.send(&req, PROBE_TIMEOUT).await {
      Ok(_) => ModelHealth::Healthy,
      Err(LlmError::NotConfigured) | Err(LlmError::Unauthorized) => ModelHealth::Misconfigured,
      Err(e) => {
        warn!(error = %e, "Model probe failed");
        ModelHealth::Unreachable
      }
    }
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  #[serde(skip_serializing_if = "Option::is_none")]
  temperature: Option<f32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from an OpenAI-style error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
