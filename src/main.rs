//! Student Buddy · hint backend
//!
//! - Axum HTTP API (`POST /api/v1/analyze-question`, `/health`)
//! - OpenAI-compatible model provider (via environment variables)
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   OPENAI_API_KEY      : model provider key (analysis answers 503 without it)
//!   OPENAI_BASE_URL     : default "https://api.sambanova.ai/v1"
//!   MODEL               : default "Meta-Llama-3.1-8B-Instruct"
//!   ALLOWED_ORIGINS     : comma separated CORS allow-list
//!   PROMPTS_CONFIG_PATH : path to TOML prompt overrides
//!   RATE_LIMIT_MAX_REQUESTS / RATE_LIMIT_WINDOW_MS : per-IP budget (100 per 15 min)
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use tracing::info;

use student_buddy::config::ServerConfig;
use student_buddy::routes::build_router;
use student_buddy::state::AppState;
use student_buddy::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let cfg = ServerConfig::from_env();
  let state = Arc::new(AppState::new(&cfg)?);
  let app = build_router(state);

  let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "student_buddy", %addr, "HTTP server listening");
  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "student_buddy", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "student_buddy", "Shutdown signal received");
}
