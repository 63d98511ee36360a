//! Per-site problem extraction over a page snapshot.
//!
//! Each supported judge is a `SiteExtractor` variant with ordered selector
//! candidates per field; the first candidate yielding non-empty text wins.
//! Selectors are heuristics and will drift as the sites change.

use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::domain::{Difficulty, Platform, ProblemRecord};
use crate::util::now_iso;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
  #[error("no problem title found on page")]
  NoTitle,
  #[error("unsupported page: {0}")]
  Unsupported(String),
  #[error("page did not answer: {0}")]
  Channel(String),
  #[error("page did not answer in time")]
  Timeout,
}

/// Rendered HTML of one tab at a point in time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
  pub url: String,
  pub html: String,
}

impl Page {
  pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
    Self { url: url.into(), html: html.into() }
  }
}

struct SiteSelectors {
  title: &'static [&'static str],
  description: &'static [&'static str],
  difficulty: &'static [&'static str],
  tags: &'static [&'static str],
  time_limit: Option<&'static str>,
  memory_limit: Option<&'static str>,
  rating: Option<&'static str>,
}

const LEETCODE: SiteSelectors = SiteSelectors {
  title: &["[data-cy=\"question-title\"]", ".css-v3d350", "h1"],
  description: &["[data-track-load=\"description_content\"]", ".content__u3I1", ".question-content"],
  difficulty: &["[diff]", ".difficulty", "[data-degree]"],
  tags: &["[class*=\"tag\"]", ".topic-tag"],
  time_limit: None,
  memory_limit: None,
  rating: None,
};

const CODEFORCES: SiteSelectors = SiteSelectors {
  title: &[".problem-statement .title", ".header .title", "h1"],
  description: &[".problem-statement", ".statement"],
  difficulty: &[],
  tags: &[".tag-box", "[class*=\"tag\"]"],
  time_limit: Some(".time-limit"),
  memory_limit: Some(".memory-limit"),
  rating: Some(".problem-statement .rated-user"),
};

const HACKERRANK: SiteSelectors = SiteSelectors {
  title: &[".challenge-page-title", "h1.ui-icon-label", ".problem-statement h1"],
  description: &[".challenge-body-html", ".problem-statement", ".challenge-text"],
  difficulty: &[".difficulty", "[class*=\"difficulty\"]"],
  tags: &[".tag", "[class*=\"tag\"]"],
  time_limit: None,
  memory_limit: None,
  rating: None,
};

/// Hosts with an extractor, exact match.
const SUPPORTED_HOSTS: [(&str, SiteExtractor); 6] = [
  ("leetcode.com", SiteExtractor::Leetcode),
  ("www.leetcode.com", SiteExtractor::Leetcode),
  ("hackerrank.com", SiteExtractor::Hackerrank),
  ("www.hackerrank.com", SiteExtractor::Hackerrank),
  ("codeforces.com", SiteExtractor::Codeforces),
  ("www.codeforces.com", SiteExtractor::Codeforces),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SiteExtractor {
  Leetcode,
  Codeforces,
  Hackerrank,
}

impl SiteExtractor {
  /// Lookup by the page's host. `None` for anything off the allow-list.
  pub fn for_url(url: &str) -> Option<SiteExtractor> {
    let host = Url::parse(url).ok()?.host_str()?.to_ascii_lowercase();
    SUPPORTED_HOSTS.iter().find(|(h, _)| *h == host).map(|(_, s)| *s)
  }

  pub fn platform(&self) -> Platform {
    match self {
      SiteExtractor::Leetcode => Platform::Leetcode,
      SiteExtractor::Codeforces => Platform::Codeforces,
      SiteExtractor::Hackerrank => Platform::Hackerrank,
    }
  }

  fn selectors(&self) -> &'static SiteSelectors {
    match self {
      SiteExtractor::Leetcode => &LEETCODE,
      SiteExtractor::Codeforces => &CODEFORCES,
      SiteExtractor::Hackerrank => &HACKERRANK,
    }
  }

  /// Wait after page load before the first extraction, letting client-side
  /// rendering finish.
  pub fn settle_delay(&self) -> Duration {
    match self {
      SiteExtractor::Leetcode => Duration::ZERO,
      SiteExtractor::Codeforces => Duration::from_millis(500),
      SiteExtractor::Hackerrank => Duration::from_millis(1000),
    }
  }

  /// Sites that navigate without reloading re-extract after this delay.
  pub fn renavigation_delay(&self) -> Option<Duration> {
    match self {
      SiteExtractor::Leetcode => Some(Duration::from_millis(2000)),
      _ => None,
    }
  }

  pub fn extract(&self, page: &Page) -> Result<ProblemRecord, ExtractError> {
    let doc = Html::parse_document(&page.html);
    let sel = self.selectors();

    let title = first_text(&doc, sel.title).ok_or(ExtractError::NoTitle)?;
    let description = first_text(&doc, sel.description).unwrap_or_default();
    let tags = all_texts(&doc, sel.tags);

    let difficulty = match self {
      SiteExtractor::Codeforces => sel
        .rating
        .and_then(|r| first_text(&doc, &[r]))
        .and_then(|r| leading_number(&r))
        .map(Difficulty::from_rating)
        .unwrap_or_default(),
      _ => first_text(&doc, sel.difficulty).map(|d| Difficulty::normalize(&d)).unwrap_or_default(),
    };

    debug!(target: "extraction", platform = %self.platform(), title_len = title.len(), tags = tags.len(), "Problem extracted");
    Ok(ProblemRecord {
      platform: self.platform(),
      url: page.url.clone(),
      title,
      description,
      difficulty: Some(difficulty),
      tags: (!tags.is_empty()).then_some(tags),
      time_limit: sel.time_limit.and_then(|s| first_text(&doc, &[s])),
      memory_limit: sel.memory_limit.and_then(|s| first_text(&doc, &[s])),
      extracted_at: now_iso(),
    })
  }
}

pub fn is_supported(url: &str) -> bool {
  SiteExtractor::for_url(url).is_some()
}

fn element_text(el: ElementRef<'_>) -> String {
  el.text().collect::<String>().trim().to_string()
}

/// First non-empty text across the candidate selectors, in order.
fn first_text(doc: &Html, candidates: &[&str]) -> Option<String> {
  candidates.iter().find_map(|c| {
    let sel = Selector::parse(c).ok()?;
    doc.select(&sel).map(element_text).find(|t| !t.is_empty())
  })
}

/// All non-empty texts from the first candidate that matches anything.
fn all_texts(doc: &Html, candidates: &[&str]) -> Vec<String> {
  candidates
    .iter()
    .filter_map(|c| Selector::parse(c).ok())
    .map(|sel| doc.select(&sel).map(element_text).filter(|t| !t.is_empty()).collect::<Vec<_>>())
    .find(|texts| !texts.is_empty())
    .unwrap_or_default()
}

fn leading_number(s: &str) -> Option<u32> {
  let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
  digits.parse().ok()
}
