//! Process configuration: environment variables plus an optional TOML file
//! overriding the prompts sent to the model.
//!
//! See `ServerConfig` and `Prompts` for the expected schema.

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BASE_URL: &str = "https://api.sambanova.ai/v1";
pub const DEFAULT_MODEL: &str = "Meta-Llama-3.1-8B-Instruct";
pub const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 100;
pub const DEFAULT_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Per-client request budget, `max_requests` per `window`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
  pub max_requests: u32,
  pub window: Duration,
}

impl Default for RateLimitConfig {
  fn default() -> Self {
    Self { max_requests: DEFAULT_RATE_LIMIT_MAX_REQUESTS, window: DEFAULT_RATE_LIMIT_WINDOW }
  }
}

impl RateLimitConfig {
  /// RATE_LIMIT_MAX_REQUESTS and RATE_LIMIT_WINDOW_MS; zero or unparsable values keep defaults.
  pub fn from_env() -> Self {
    Self::from_values(
      std::env::var("RATE_LIMIT_MAX_REQUESTS").ok().as_deref(),
      std::env::var("RATE_LIMIT_WINDOW_MS").ok().as_deref(),
    )
  }

  pub fn from_values(max_requests: Option<&str>, window_ms: Option<&str>) -> Self {
    let max_requests = max_requests
      .and_then(|v| v.trim().parse::<u32>().ok())
      .filter(|n| *n > 0)
      .unwrap_or(DEFAULT_RATE_LIMIT_MAX_REQUESTS);
    let window = window_ms
      .and_then(|v| v.trim().parse::<u64>().ok())
      .filter(|ms| *ms > 0)
      .map(Duration::from_millis)
      .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW);
    Self { max_requests, window }
  }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
  pub port: u16,
  /// Bearer token for the model provider. `None` leaves the service up but
  /// every analysis answers 503 and the model probe reports misconfigured.
  pub api_key: Option<String>,
  pub base_url: String,
  pub model: String,
  /// Extra CORS origins; `chrome-extension://` origins are always allowed.
  pub allowed_origins: Vec<String>,
  pub prompts: Prompts,
  pub rate_limit: RateLimitConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      port: DEFAULT_PORT,
      api_key: None,
      base_url: DEFAULT_BASE_URL.into(),
      model: DEFAULT_MODEL.into(),
      allowed_origins: Vec::new(),
      prompts: Prompts::default(),
      rate_limit: RateLimitConfig::default(),
    }
  }
}

impl ServerConfig {
  /// Read PORT, OPENAI_API_KEY, OPENAI_BASE_URL, MODEL, ALLOWED_ORIGINS and
  /// PROMPTS_CONFIG_PATH, plus the RATE_LIMIT_* pair. Anything missing or
  /// unparsable falls back to defaults.
  pub fn from_env() -> Self {
    let port = std::env::var("PORT")
      .ok()
      .and_then(|p| p.parse::<u16>().ok())
      .unwrap_or(DEFAULT_PORT);
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty());
    let base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
    let model = std::env::var("MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
      .map(|s| parse_origins(&s))
      .unwrap_or_default();
    let prompts = load_prompts_from_env().unwrap_or_default();

    let rate_limit = RateLimitConfig::from_env();

    Self { port, api_key, base_url, model, allowed_origins, prompts, rate_limit }
  }
}

pub fn parse_origins(raw: &str) -> Vec<String> {
  raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct PromptsFile {
  #[serde(default)]
  pub prompts: Prompts,
}

/// Prompts used by the hint generator. Both can be overridden from TOML to
/// tune tone or structure. The user template understands `{question}` and
/// `{context}`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub system: String,
  pub user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      system: DEFAULT_SYSTEM_PROMPT.trim().into(),
      user_template: DEFAULT_USER_TEMPLATE.trim_start().into(),
    }
  }
}

const DEFAULT_SYSTEM_PROMPT: &str = r#"
You are an expert DSA (Data Structures & Algorithms) mentor and coding interview coach. Your role is to guide students through problem-solving by providing progressive hints without giving away the complete solution immediately.

Your expertise covers:
- Algorithm design and optimization
- Data structure selection and implementation
- Time and space complexity analysis
- Problem pattern recognition
- Step-by-step problem breakdown

When analyzing a coding problem, you should:
1. Identify the core problem type and patterns
2. Suggest relevant data structures or algorithms
3. Guide the student's thinking process progressively
4. Provide clean, readable pseudo code
5. Focus on learning rather than just getting the answer

Always structure your response as JSON with "hints" array and "pseudoCode" string.
"#;

const DEFAULT_USER_TEMPLATE: &str = r#"
Analyze this DSA problem and provide progressive hints + pseudo code:

**Problem Statement:**
{question}

**Context:**{context}

**Instructions:**
Generate exactly 4-5 progressive hints that guide the student's thinking process:
1. First hint: Help identify the problem type/pattern
2. Second hint: Suggest relevant data structures or approach
3. Third hint: Guide toward the optimal solution strategy
4. Fourth hint: Implementation considerations
5. Fifth hint (optional): Optimization tips

Then provide clean pseudo code that demonstrates the solution approach.

**Required JSON Response Format:**
{
  "hints": [
    "Hint 1: Problem identification...",
    "Hint 2: Data structure suggestion...",
    "Hint 3: Algorithm approach...",
    "Hint 4: Implementation guidance...",
    "Hint 5: Optimization considerations..."
  ],
  "pseudoCode": "function solveProblem(input) {\n  // Step 1: Initialize\n  // Step 2: Process\n  // Step 3: Return result\n}"
}

Focus on teaching problem-solving methodology rather than just providing the answer."#;

/// Attempt to load prompts from PROMPTS_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_prompts_from_env() -> Option<Prompts> {
  let path = std::env::var("PROMPTS_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_prompts(&s) {
      Ok(p) => {
        info!(target: "student_buddy", %path, "Loaded prompts config (TOML)");
        Some(p)
      }
      Err(e) => {
        error!(target: "student_buddy", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "student_buddy", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

pub fn parse_prompts(toml_src: &str) -> Result<Prompts, toml::de::Error> {
  toml::from_str::<PromptsFile>(toml_src).map(|f| f.prompts)
}
