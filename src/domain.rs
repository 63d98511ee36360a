//! Domain models shared by the backend and the extension side: judge platforms,
//! difficulty levels, the scraped problem record, and progressive-hint state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Online judge a problem was scraped from (or mentioned in the question text).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
  Leetcode,
  Codeforces,
  Hackerrank,
  Codechef,
  Geeksforgeeks,
  Atcoder,
  Topcoder,
  Spoj,
  Cses,
}

impl Platform {
  pub const ALL: [Platform; 9] = [
    Platform::Leetcode,
    Platform::Codeforces,
    Platform::Hackerrank,
    Platform::Codechef,
    Platform::Geeksforgeeks,
    Platform::Atcoder,
    Platform::Topcoder,
    Platform::Spoj,
    Platform::Cses,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Platform::Leetcode => "leetcode",
      Platform::Codeforces => "codeforces",
      Platform::Hackerrank => "hackerrank",
      Platform::Codechef => "codechef",
      Platform::Geeksforgeeks => "geeksforgeeks",
      Platform::Atcoder => "atcoder",
      Platform::Topcoder => "topcoder",
      Platform::Spoj => "spoj",
      Platform::Cses => "cses",
    }
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Platform {
  type Err = ();
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Platform::ALL.iter().copied().find(|p| p.as_str() == s).ok_or(())
  }
}

/// Canonical difficulty of a scraped problem.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
  Easy,
  #[default]
  Medium,
  Hard,
}

impl Difficulty {
  pub fn as_str(&self) -> &'static str {
    match self {
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
    }
  }

  /// Map free-form difficulty text from a judge page onto {easy, medium, hard}.
  /// Substring match, defaults to medium when nothing is recognised.
  pub fn normalize(text: &str) -> Difficulty {
    let t = text.trim().to_lowercase();
    if t.contains("easy") || t.contains("basic") {
      Difficulty::Easy
    } else if t.contains("medium") || t.contains("intermediate") {
      Difficulty::Medium
    } else if t.contains("hard") || t.contains("advanced") {
      Difficulty::Hard
    } else {
      Difficulty::Medium
    }
  }

  /// Codeforces publishes a numeric rating instead of a label.
  pub fn from_rating(rating: u32) -> Difficulty {
    if rating < 1300 {
      Difficulty::Easy
    } else if rating < 1800 {
      Difficulty::Medium
    } else {
      Difficulty::Hard
    }
  }
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Difficulty vocabulary accepted on the wire. Wider than `Difficulty` because
/// some judges label problems beginner/intermediate/advanced.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestedDifficulty {
  Easy,
  Medium,
  Hard,
  Beginner,
  Intermediate,
  Advanced,
}

impl RequestedDifficulty {
  pub const ALL: [RequestedDifficulty; 6] = [
    RequestedDifficulty::Easy,
    RequestedDifficulty::Medium,
    RequestedDifficulty::Hard,
    RequestedDifficulty::Beginner,
    RequestedDifficulty::Intermediate,
    RequestedDifficulty::Advanced,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      RequestedDifficulty::Easy => "easy",
      RequestedDifficulty::Medium => "medium",
      RequestedDifficulty::Hard => "hard",
      RequestedDifficulty::Beginner => "beginner",
      RequestedDifficulty::Intermediate => "intermediate",
      RequestedDifficulty::Advanced => "advanced",
    }
  }
}

impl From<Difficulty> for RequestedDifficulty {
  fn from(d: Difficulty) -> Self {
    match d {
      Difficulty::Easy => RequestedDifficulty::Easy,
      Difficulty::Medium => RequestedDifficulty::Medium,
      Difficulty::Hard => RequestedDifficulty::Hard,
    }
  }
}

impl FromStr for RequestedDifficulty {
  type Err = ();
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    RequestedDifficulty::ALL.iter().copied().find(|d| d.as_str() == s).ok_or(())
  }
}

/// Normalized representation of a scraped coding problem.
/// Created once per extraction and never mutated; the next extraction supersedes it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProblemRecord {
  pub platform: Platform,
  pub url: String,
  pub title: String,
  pub description: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub difficulty: Option<Difficulty>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tags: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub time_limit: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub memory_limit: Option<String>,
  pub extracted_at: String,
}

impl ProblemRecord {
  /// Title and description joined the way the backend expects `questionText`.
  pub fn question_text(&self) -> String {
    format!("{}\n\n{}", self.title, self.description)
  }
}

/// One revealed step of the progressive disclosure.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hint {
  pub index: usize,
  pub text: String,
}

/// Hints revealed so far in a UI session.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HintState {
  pub hints: Vec<Hint>,
  pub current_index: usize,
  /// Unknown until the first server response.
  pub hints_remaining: Option<usize>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PseudoCodeState {
  pub revealed: bool,
  pub content: String,
}
