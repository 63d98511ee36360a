//! Page agent: the per-tab half of the extension's message passing.
//!
//! A `PageTab` owns the latest snapshot of one tab, answers `EXTRACT_PROBLEM`
//! requests, and pushes `PROBLEM_EXTRACTED` on load and on in-page navigation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc::UnboundedSender, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

use crate::domain::ProblemRecord;
use crate::extension::extractor::{ExtractError, Page, SiteExtractor};
use crate::protocol::ExtensionMessage;

/// Delay before answering an on-demand extraction request.
pub const ON_DEMAND_SETTLE: Duration = Duration::from_millis(500);

/// Something the coordinator can ask for a problem: the active browser tab.
#[async_trait]
pub trait Tab: Send + Sync {
  async fn url(&self) -> String;

  /// Answer `EXTRACT_PROBLEM`. `Ok(None)` means the page answered but had no
  /// problem on it; `Err` means the page could not be asked.
  async fn extract_problem(&self) -> Result<Option<ProblemRecord>, ExtractError>;
}

pub struct PageTab {
  page: RwLock<Page>,
}

impl PageTab {
  pub fn new(page: Page) -> Arc<Self> {
    Arc::new(Self { page: RwLock::new(page) })
  }

  pub async fn snapshot(&self) -> Page {
    self.page.read().await.clone()
  }

  async fn extract_now(&self) -> Result<Option<ProblemRecord>, ExtractError> {
    let page = self.snapshot().await;
    let Some(site) = SiteExtractor::for_url(&page.url) else {
      return Err(ExtractError::Unsupported(page.url));
    };
    match site.extract(&page) {
      Ok(rec) => Ok(Some(rec)),
      Err(ExtractError::NoTitle) => Ok(None),
      Err(e) => Err(e),
    }
  }

  /// Extract after `delay` and push the record if one was found.
  fn spawn_publish(self: &Arc<Self>, delay: Duration, tx: UnboundedSender<ExtensionMessage>) -> JoinHandle<()> {
    let this = Arc::clone(self);
    tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      match this.extract_now().await {
        Ok(Some(data)) => {
          if tx.send(ExtensionMessage::ProblemExtracted { data }).is_err() {
            debug!(target: "extraction", "Coordinator gone; dropping extracted problem");
          }
        }
        Ok(None) => debug!(target: "extraction", "No problem on page"),
        Err(e) => debug!(target: "extraction", error = %e, "Extraction skipped"),
      }
    })
  }

  /// Initial extraction once the site's settle delay has passed.
  #[instrument(level = "debug", skip_all)]
  pub async fn on_load(self: &Arc<Self>, tx: UnboundedSender<ExtensionMessage>) -> Option<JoinHandle<()>> {
    let url = self.page.read().await.url.clone();
    let site = SiteExtractor::for_url(&url)?;
    Some(self.spawn_publish(site.settle_delay(), tx))
  }

  /// Replace the snapshot. On a URL change for sites that navigate in place,
  /// re-publish after the fixed re-navigation delay.
  #[instrument(level = "debug", skip_all, fields(%url))]
  pub async fn navigate(
    self: &Arc<Self>,
    url: &str,
    html: String,
    tx: UnboundedSender<ExtensionMessage>,
  ) -> Option<JoinHandle<()>> {
    let changed = {
      let mut page = self.page.write().await;
      let changed = page.url != url;
      *page = Page::new(url, html);
      changed
    };
    if !changed {
      return None;
    }
    let delay = SiteExtractor::for_url(url)?.renavigation_delay()?;
    Some(self.spawn_publish(delay, tx))
  }
}

#[async_trait]
impl Tab for PageTab {
  async fn url(&self) -> String {
    self.page.read().await.url.clone()
  }

  async fn extract_problem(&self) -> Result<Option<ProblemRecord>, ExtractError> {
    tokio::time::sleep(ON_DEMAND_SETTLE).await;
    self.extract_now().await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio::sync::mpsc;

  fn leetcode(title: &str, slug: &str) -> Page {
    Page::new(
      format!("https://leetcode.com/problems/{}/", slug),
      format!("<html><body><div data-cy=\"question-title\">{}</div><div class=\"question-content\">text</div></body></html>", title),
    )
  }

  #[tokio::test(start_paused = true)]
  async fn on_load_pushes_problem_extracted() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let tab = PageTab::new(leetcode("1. Two Sum", "two-sum"));
    tab.on_load(tx).await.unwrap().await.unwrap();
    match rx.recv().await {
      Some(ExtensionMessage::ProblemExtracted { data }) => assert_eq!(data.title, "1. Two Sum"),
      other => panic!("unexpected {:?}", other),
    }
  }

  #[tokio::test(start_paused = true)]
  async fn unsupported_page_never_publishes() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let tab = PageTab::new(Page::new("https://example.org/", "<h1>x</h1>"));
    assert!(tab.on_load(tx).await.is_none());
    assert!(matches!(tab.extract_problem().await, Err(ExtractError::Unsupported(_))));
  }

  #[tokio::test(start_paused = true)]
  async fn in_page_navigation_republishes_after_delay() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let first = leetcode("1. Two Sum", "two-sum");
    let tab = PageTab::new(first.clone());

    // same URL: nothing to do
    assert!(tab.navigate(&first.url, first.html.clone(), tx.clone()).await.is_none());

    let next = leetcode("2. Add Two Numbers", "add-two-numbers");
    let start = tokio::time::Instant::now();
    let handle = tab.navigate(&next.url, next.html, tx).await.unwrap();
    handle.await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(2000));
    match rx.recv().await {
      Some(ExtensionMessage::ProblemExtracted { data }) => assert_eq!(data.title, "2. Add Two Numbers"),
      other => panic!("unexpected {:?}", other),
    }
  }

  #[tokio::test(start_paused = true)]
  async fn page_without_title_answers_none() {
    let tab = PageTab::new(Page::new("https://leetcode.com/problems/x/", "<p>loading</p>"));
    assert_eq!(tab.extract_problem().await, Ok(None));
  }
}
