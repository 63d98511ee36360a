//! Application state shared by all handlers: configuration, prompts and the
//! model client. Only the rate limiter's counters change after startup.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};

use crate::config::{Prompts, ServerConfig};
use crate::openai::{LlmError, OpenAI};
use crate::routes::rate_limit::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub openai: OpenAI,
    pub prompts: Prompts,
    pub allowed_origins: Vec<String>,
    pub started_at: Instant,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Build state from a resolved configuration.
    #[instrument(level = "info", skip_all)]
    pub fn new(cfg: &ServerConfig) -> Result<Self, LlmError> {
        let openai = OpenAI::from_config(cfg)?;
        if openai.api_key.is_some() {
            info!(target: "student_buddy", base_url = %openai.base_url, model = %openai.model, "Model provider enabled.");
        } else {
            warn!(target: "student_buddy", "OPENAI_API_KEY not set; analysis requests will answer 503.");
        }

        Ok(Self {
            openai,
            prompts: cfg.prompts.clone(),
            allowed_origins: cfg.allowed_origins.clone(),
            started_at: Instant::now(),
            rate_limiter: Arc::new(RateLimiter::new(&cfg.rate_limit)),
        })
    }
}
