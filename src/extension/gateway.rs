//! Client gateway: the extension's HTTP client for the analysis backend.
//!
//! One POST per request, no retry. The backend answers the whole analysis each
//! time; the gateway picks the hint the caller asked for.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::domain::{ProblemRecord, RequestedDifficulty};
use crate::extension::storage::{self, KeyValueStore, StoreError};
use crate::protocol::{AnalysisResult, AnalyzeQuestionIn, SuccessEnvelope};

pub const ANALYZE_PATH: &str = "/api/v1/analyze-question";
pub const HEALTH_PATH: &str = "/health";
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

const API_URL_KEY: &str = "apiUrl";
const API_KEY_KEY: &str = "apiKey";

#[derive(Debug, Error)]
pub enum GatewayError {
  #[error("API request failed: {text}")]
  Status { status: u16, text: String },
  #[error("transport error: {0}")]
  Transport(String),
  #[error("unexpected response body: {0}")]
  Decode(String),
  #[error("no hint at index {index}")]
  NoMoreHints { index: usize },
}

impl From<reqwest::Error> for GatewayError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_decode() {
      GatewayError::Decode(e.to_string())
    } else {
      GatewayError::Transport(e.to_string())
    }
  }
}

/// Where the backend lives, as set on the extension's options page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
  pub api_url: String,
  pub api_key: Option<String>,
}

impl Default for BackendConfig {
  fn default() -> Self {
    Self { api_url: DEFAULT_API_URL.to_string(), api_key: None }
  }
}

impl BackendConfig {
  pub fn load(store: &(impl KeyValueStore + ?Sized)) -> Result<Self, StoreError> {
    let api_url = storage::load::<String>(store, API_URL_KEY)?
      .filter(|u| !u.trim().is_empty())
      .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let api_key = storage::load::<String>(store, API_KEY_KEY)?.filter(|k| !k.is_empty());
    Ok(Self { api_url, api_key })
  }

  pub fn save(&self, store: &(impl KeyValueStore + ?Sized)) -> Result<(), StoreError> {
    storage::save(store, API_URL_KEY, &self.api_url)?;
    match &self.api_key {
      Some(k) => storage::save(store, API_KEY_KEY, k),
      None => store.remove(API_KEY_KEY),
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HintReply {
  pub hint: String,
  pub hints_remaining: usize,
}

pub struct ApiClient {
  http: reqwest::Client,
  config: BackendConfig,
}

impl ApiClient {
  pub fn new(config: BackendConfig) -> Self {
    Self { http: reqwest::Client::new(), config }
  }

  pub fn config(&self) -> &BackendConfig {
    &self.config
  }

  pub fn update_config(&mut self, config: BackendConfig) {
    info!(target: "student_buddy", api_url = %config.api_url, "Backend config updated");
    self.config = config;
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
  }

  fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match &self.config.api_key {
      Some(key) => req.bearer_auth(key),
      None => req,
    }
  }

  /// POST the problem and return the full analysis.
  #[instrument(level = "debug", skip_all, fields(platform = %problem.platform))]
  pub async fn analyze(&self, problem: &ProblemRecord, hint_index: Option<usize>) -> Result<AnalysisResult, GatewayError> {
    let body = AnalyzeQuestionIn {
      question_text: problem.question_text(),
      difficulty: problem.difficulty.map(RequestedDifficulty::from),
      platform: problem.platform,
      hint_index,
    };

    let res = self.authorize(self.http.post(self.url(ANALYZE_PATH))).json(&body).send().await?;
    let status = res.status();
    if !status.is_success() {
      let text = status.canonical_reason().unwrap_or("Unknown").to_string();
      warn!(target: "student_buddy", status = status.as_u16(), %text, "Analysis request failed");
      return Err(GatewayError::Status { status: status.as_u16(), text });
    }

    let envelope: SuccessEnvelope<AnalysisResult> = res.json().await?;
    debug!(target: "student_buddy", hints = envelope.data.hints.len(), "Analysis received");
    Ok(envelope.data)
  }

  /// Hint `hint_index` of the server's list; remaining counts what is left after it.
  pub async fn request_next_hint(&self, problem: &ProblemRecord, hint_index: usize) -> Result<HintReply, GatewayError> {
    let result = self.analyze(problem, Some(hint_index)).await?;
    let hint = result
      .hints
      .get(hint_index)
      .cloned()
      .ok_or(GatewayError::NoMoreHints { index: hint_index })?;
    let hints_remaining = result.hints.len().saturating_sub(hint_index + 1);
    Ok(HintReply { hint, hints_remaining })
  }

  pub async fn request_pseudo_code(&self, problem: &ProblemRecord) -> Result<String, GatewayError> {
    Ok(self.analyze(problem, None).await?.pseudo_code)
  }

  /// Options-page check: does `GET /health` answer with a success status?
  pub async fn test_connection(&self) -> bool {
    let req = self.authorize(self.http.get(self.url(HEALTH_PATH))).timeout(Duration::from_secs(5));
    match req.send().await {
      Ok(res) => res.status().is_success(),
      Err(e) => {
        debug!(target: "student_buddy", error = %e, "Backend unreachable");
        false
      }
    }
  }
}
