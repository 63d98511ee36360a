//! Post-processing of generator output into the wire `AnalysisResult`.

use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;
use uuid::Uuid;

use crate::generator::Analysis;
use crate::protocol::{AnalysisMetadata, AnalysisResult};
use crate::util::now_iso;

pub const MAX_HINTS: usize = 6;
pub const MIN_EXPECTED_HINTS: usize = 3;

fn numbered_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"^\d+\.\s").expect("static regex"))
}

fn fence_open_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"^```\w*\n?").expect("static regex"))
}

fn fence_close_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"\n?```$").expect("static regex"))
}

/// Prefix `"{n}. "` to every hint not already numbered. Blank entries are dropped first.
pub fn number_hints(hints: &[String]) -> Vec<String> {
  hints
    .iter()
    .map(|h| h.trim())
    .filter(|h| !h.is_empty())
    .enumerate()
    .map(|(i, h)| if numbered_re().is_match(h) { h.to_string() } else { format!("{}. {}", i + 1, h) })
    .collect()
}

/// Remove one leading and one trailing markdown fence, if present.
pub fn strip_code_fence(code: &str) -> String {
  let trimmed = code.trim();
  let opened = fence_open_re().replace(trimmed, "");
  fence_close_re().replace(&opened, "").into_owned()
}

pub fn finalize(analysis: Analysis) -> AnalysisResult {
  let mut hints = number_hints(&analysis.hints);
  let hints_generated = hints.len();
  if hints_generated < MIN_EXPECTED_HINTS {
    warn!(target: "analysis", hints_generated, "Analysis returned fewer than 3 hints, this may indicate a poor model response");
  }
  hints.truncate(MAX_HINTS);

  AnalysisResult {
    hints,
    pseudo_code: strip_code_fence(&analysis.pseudo_code),
    metadata: AnalysisMetadata {
      hints_generated,
      timestamp: now_iso(),
      analysis_id: Uuid::new_v4().to_string(),
    },
  }
}
