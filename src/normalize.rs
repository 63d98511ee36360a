//! Question cleanup and best-effort metadata inference.
//!
//! Cleanup is deterministic: trim, collapse whitespace, strip tag-like markup,
//! collapse newlines, truncate. Inference only fills fields the caller left out.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, instrument};

use crate::domain::{Difficulty, Platform};
use crate::error::AppError;
use crate::util::truncate_chars;

pub const MAX_CLEAN_CHARS: usize = 8000;
pub const MIN_CLEAN_CHARS: usize = 10;

/// Platform keywords checked in order; first hit wins.
const PLATFORM_KEYWORDS: [(Platform, &[&str]); 5] = [
  (Platform::Leetcode, &["leetcode", "leetcode.com"]),
  (Platform::Codeforces, &["codeforces", "codeforces.com"]),
  (Platform::Hackerrank, &["hackerrank"]),
  (Platform::Codechef, &["codechef"]),
  (Platform::Geeksforgeeks, &["geeksforgeeks", "gfg"]),
];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuestionMetadata {
  pub detected_difficulty: Option<Difficulty>,
  pub detected_platform: Option<Platform>,
  pub has_examples: bool,
  pub has_constraints: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedQuestion {
  pub text: String,
  pub metadata: QuestionMetadata,
}

fn whitespace_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

fn tag_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("static regex"))
}

fn newlines_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"\n+").expect("static regex"))
}

/// Text cleanup applied to every question before prompting.
pub fn clean_question(raw: &str) -> String {
  let s = whitespace_re().replace_all(raw.trim(), " ");
  let s = tag_re().replace_all(&s, "");
  let s = newlines_re().replace_all(&s, "\n");
  truncate_chars(&s, MAX_CLEAN_CHARS)
}

/// Guess a canonical difficulty from keywords. Checked easy, then medium, then hard.
pub fn detect_difficulty(lower: &str) -> Option<Difficulty> {
  if lower.contains("easy") || lower.contains("beginner") {
    Some(Difficulty::Easy)
  } else if lower.contains("medium") || lower.contains("intermediate") {
    Some(Difficulty::Medium)
  } else if lower.contains("hard") || lower.contains("advanced") || lower.contains("difficult") {
    Some(Difficulty::Hard)
  } else {
    None
  }
}

pub fn detect_platform(lower: &str) -> Option<Platform> {
  PLATFORM_KEYWORDS
    .iter()
    .find(|(_, keys)| keys.iter().any(|k| lower.contains(k)))
    .map(|(p, _)| *p)
}

pub fn extract_metadata(text: &str, platform: Option<Platform>) -> QuestionMetadata {
  let lower = text.to_lowercase();
  QuestionMetadata {
    detected_difficulty: detect_difficulty(&lower),
    detected_platform: platform.or_else(|| detect_platform(&lower)),
    has_examples: lower.contains("example") || (lower.contains("input") && lower.contains("output")),
    has_constraints: lower.contains("constraint")
      || lower.contains("limit")
      || lower.contains('≤')
      || lower.contains("<="),
  }
}

/// Clean the question and infer metadata. Fails when too little text survives.
#[instrument(level = "debug", skip(raw), fields(raw_len = raw.len()))]
pub fn normalize_question(raw: &str, platform: Option<Platform>) -> Result<NormalizedQuestion, AppError> {
  let text = clean_question(raw);
  if text.chars().count() < MIN_CLEAN_CHARS {
    return Err(AppError::Processing("Question text is too short after preprocessing".into()));
  }
  let metadata = extract_metadata(&text, platform);
  debug!(target: "analysis", clean_len = text.len(), ?metadata, "Question normalized");
  Ok(NormalizedQuestion { text, metadata })
}
