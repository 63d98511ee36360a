//! Hint and pseudo-code generation: prompt assembly, one model call, and
//! tolerant parsing of whatever the model sends back.

use serde_json::Value;
use tracing::{error, instrument, warn};

use crate::config::Prompts;
use crate::domain::{Platform, RequestedDifficulty};
use crate::error::AppError;
use crate::normalize::QuestionMetadata;
use crate::openai::OpenAI;
use crate::util::{fill_template, trunc_for_log};

pub const FALLBACK_HINTS: [&str; 4] = [
  "1. Read the problem carefully and identify the input/output format",
  "2. Look for patterns - is this a search, sort, or optimization problem?",
  "3. Consider what data structures might be helpful for this problem",
  "4. Think about the time complexity requirements based on constraints",
];

pub const FALLBACK_PSEUDO_CODE: &str = "function solve(input) {\n  // Analyze the problem step by step\n  // Choose appropriate data structure\n  // Implement the solution\n  return result;\n}";

/// Used when the hints parsed fine but pseudoCode did not.
pub const DEFAULT_PSEUDO_CODE: &str = "function solve() {\n  // Implementation needed\n  return result;\n}";

/// Raw generator output, before renumbering and fence stripping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Analysis {
  pub hints: Vec<String>,
  pub pseudo_code: String,
}

impl Analysis {
  pub fn fallback() -> Self {
    Self {
      hints: FALLBACK_HINTS.iter().map(|h| h.to_string()).collect(),
      pseudo_code: FALLBACK_PSEUDO_CODE.to_string(),
    }
  }
}

/// Everything the prompt builder needs to know about one question.
#[derive(Clone, Debug)]
pub struct PromptInput<'a> {
  pub question: &'a str,
  pub platform: Option<Platform>,
  pub difficulty: Option<RequestedDifficulty>,
  pub metadata: &'a QuestionMetadata,
}

pub fn build_user_prompt(prompts: &Prompts, input: &PromptInput<'_>) -> String {
  let mut context = String::new();
  if let Some(p) = input.platform {
    context.push_str(&format!("\nPlatform: {}", p));
  }
  if let Some(d) = input.difficulty {
    context.push_str(&format!("\nDifficulty: {}", d.as_str()));
  }
  if input.metadata.has_examples {
    context.push_str("\nNote: Problem includes examples");
  }
  if input.metadata.has_constraints {
    context.push_str("\nNote: Problem includes constraints");
  }
  // context first so question text containing "{context}" stays literal
  fill_template(&prompts.user_template, &[("context", &context), ("question", input.question)])
}

/// Parse model output. Never fails: anything unusable becomes the fixed fallback.
pub fn parse_model_output(text: &str) -> Analysis {
  let parsed: Value = match serde_json::from_str(text) {
    Ok(v) => v,
    Err(e) => {
      error!(target: "analysis", error = %e, response = %trunc_for_log(text, 200), "Failed to parse model response");
      return Analysis::fallback();
    }
  };

  let Some(raw_hints) = parsed.get("hints").and_then(Value::as_array) else {
    warn!(target: "analysis", "Model response missing or invalid hints array");
    return Analysis::fallback();
  };

  let hints: Vec<String> = raw_hints
    .iter()
    .filter_map(Value::as_str)
    .filter(|h| !h.trim().is_empty())
    .map(String::from)
    .collect();
  if hints.is_empty() {
    warn!(target: "analysis", "No valid hints in model response");
    return Analysis::fallback();
  }

  let pseudo_code = match parsed.get("pseudoCode").and_then(Value::as_str) {
    Some(code) if !code.is_empty() => code.trim().to_string(),
    _ => {
      warn!(target: "analysis", "Model response missing or invalid pseudoCode");
      DEFAULT_PSEUDO_CODE.to_string()
    }
  };

  Analysis { hints, pseudo_code }
}

/// One model call. Transport failures surface as `UpstreamUnavailable`;
/// output problems are absorbed by `parse_model_output`.
#[instrument(level = "info", skip(openai, prompts, input), fields(question_len = input.question.len(), platform = ?input.platform))]
pub async fn generate_hints(openai: &OpenAI, prompts: &Prompts, input: &PromptInput<'_>) -> Result<Analysis, AppError> {
  let user = build_user_prompt(prompts, input);
  let text = openai.chat_json_text(&prompts.system, &user).await?;
  Ok(parse_model_output(&text))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unparsable_output_yields_exact_fallback() {
    let a = parse_model_output("Sure! Here are some hints: ...");
    assert_eq!(a.hints, FALLBACK_HINTS.to_vec());
    assert_eq!(a.hints.len(), 4);
    assert_eq!(a.pseudo_code, FALLBACK_PSEUDO_CODE);
  }

  #[test]
  fn missing_or_empty_hints_yield_fallback() {
    assert_eq!(parse_model_output(r#"{"pseudoCode":"x"}"#), Analysis::fallback());
    assert_eq!(parse_model_output(r#"{"hints":"not a list"}"#), Analysis::fallback());
    assert_eq!(parse_model_output(r#"{"hints":["", "   ", 7]}"#), Analysis::fallback());
  }

  #[test]
  fn blank_hints_are_filtered_and_pseudo_code_defaulted() {
    let a = parse_model_output(r#"{"hints":["Use a hash map", "  ", "Store complements"],"pseudoCode":42}"#);
    assert_eq!(a.hints, vec!["Use a hash map", "Store complements"]);
    assert_eq!(a.pseudo_code, DEFAULT_PSEUDO_CODE);
  }

  #[test]
  fn well_formed_output_is_kept() {
    let a = parse_model_output(r#"{"hints":["a","b","c","d"],"pseudoCode":"  for x in xs: ...  "}"#);
    assert_eq!(a.hints.len(), 4);
    assert_eq!(a.pseudo_code, "for x in xs: ...");
  }

  #[test]
  fn prompt_embeds_question_and_context() {
    let meta = QuestionMetadata { has_examples: true, has_constraints: false, ..Default::default() };
    let input = PromptInput {
      question: "Find {context} in a string",
      platform: Some(Platform::Leetcode),
      difficulty: Some(RequestedDifficulty::Easy),
      metadata: &meta,
    };
    let p = build_user_prompt(&Prompts::default(), &input);
    assert!(p.contains("Find {context} in a string"));
    assert!(p.contains("Platform: leetcode"));
    assert!(p.contains("Difficulty: easy"));
    assert!(p.contains("Note: Problem includes examples"));
    assert!(!p.contains("includes constraints"));
    assert!(p.contains("\"pseudoCode\""));
  }
}
