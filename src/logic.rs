//! Core analysis pipeline behind `POST /api/v1/analyze-question`:
//! normalize -> infer metadata -> generate -> finalize.

use tracing::{info, instrument};

use crate::domain::RequestedDifficulty;
use crate::error::AppError;
use crate::finalize::finalize;
use crate::generator::{generate_hints, PromptInput};
use crate::normalize::normalize_question;
use crate::protocol::{AnalysisRequest, AnalysisResult};
use crate::state::AppState;

#[instrument(
  level = "info",
  skip(state, req),
  fields(question_len = req.question_text.len(), platform = ?req.platform, difficulty = ?req.difficulty)
)]
pub async fn analyze_question(state: &AppState, req: &AnalysisRequest) -> Result<AnalysisResult, AppError> {
  let normalized = normalize_question(&req.question_text, req.platform)?;

  // caller-supplied values always beat inferred ones
  let difficulty = req
    .difficulty
    .or_else(|| normalized.metadata.detected_difficulty.map(RequestedDifficulty::from));
  let platform = normalized.metadata.detected_platform;

  let input = PromptInput {
    question: &normalized.text,
    platform,
    difficulty,
    metadata: &normalized.metadata,
  };
  let analysis = generate_hints(&state.openai, &state.prompts, &input).await?;
  let result = finalize(analysis);

  info!(
    target: "analysis",
    hints = result.hints.len(),
    has_pseudo_code = !result.pseudo_code.is_empty(),
    platform = ?platform,
    difficulty = ?difficulty,
    "Question analysis completed"
  );
  Ok(result)
}
