//! Extraction coordinator: brokers between the popup and the active tab and
//! holds the most recently extracted problem.
//!
//! The held record lives in an explicit `SessionContext` that callers pass in.
//! Writes are last-write-wins: a newer extraction replaces the record outright,
//! whoever it came from. The context is mirrored to session storage so a popup
//! reopen can restore it without scraping again.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::ProblemRecord;
use crate::extension::extractor::{is_supported, ExtractError};
use crate::extension::page::Tab;
use crate::extension::storage::{self, KeyValueStore};
use crate::protocol::ExtensionMessage;

pub const CURRENT_PROBLEM_KEY: &str = "currentProblem";

#[derive(Clone, Debug)]
pub struct RetryPolicy {
  pub attempts: usize,
  pub backoff: Duration,
  /// Bound on each individual page round-trip.
  pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      attempts: 3,
      backoff: Duration::from_millis(500),
      attempt_timeout: Duration::from_secs(5),
    }
  }
}

/// The popup session's view of "the current problem".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionContext {
  current: Option<ProblemRecord>,
}

impl SessionContext {
  pub fn current(&self) -> Option<&ProblemRecord> {
    self.current.as_ref()
  }
}

pub struct Coordinator<S: KeyValueStore> {
  store: S,
  policy: RetryPolicy,
}

impl<S: KeyValueStore> Coordinator<S> {
  pub fn new(store: S) -> Self {
    Self { store, policy: RetryPolicy::default() }
  }

  pub fn with_policy(store: S, policy: RetryPolicy) -> Self {
    Self { store, policy }
  }

  /// Rebuild the context from session storage. Unreadable state starts empty.
  pub fn restore(&self) -> SessionContext {
    match storage::load::<ProblemRecord>(&self.store, CURRENT_PROBLEM_KEY) {
      Ok(current) => SessionContext { current },
      Err(e) => {
        warn!(target: "extraction", error = %e, "Stored problem unreadable; starting empty");
        SessionContext::default()
      }
    }
  }

  /// Overwrite the held record unconditionally and mirror it to storage.
  /// A storage failure is logged; the in-memory context is still updated.
  pub fn record_extracted(&self, ctx: &mut SessionContext, record: ProblemRecord) {
    info!(target: "extraction", platform = %record.platform, title = %record.title, "Problem extracted");
    if let Err(e) = storage::save(&self.store, CURRENT_PROBLEM_KEY, &record) {
      error!(target: "extraction", error = %e, "Error storing problem data");
    }
    ctx.current = Some(record);
  }

  pub fn current_problem(&self, ctx: &SessionContext) -> Option<ProblemRecord> {
    ctx.current.clone()
  }

  /// "Extract now": unsupported pages return `Ok(None)` without contacting the
  /// tab. Otherwise the tab is asked up to `attempts` times with a fixed
  /// backoff between failures; the last failure propagates.
  #[instrument(level = "info", skip_all)]
  pub async fn manual_extract(
    &self,
    ctx: &mut SessionContext,
    tab: &dyn Tab,
  ) -> Result<Option<ProblemRecord>, ExtractError> {
    let url = tab.url().await;
    if !is_supported(&url) {
      info!(target: "extraction", %url, "Not a supported platform");
      return Ok(None);
    }

    let mut attempt = 0;
    let answer = loop {
      attempt += 1;
      let result = match tokio::time::timeout(self.policy.attempt_timeout, tab.extract_problem()).await {
        Ok(r) => r,
        Err(_) => Err(ExtractError::Timeout),
      };
      match result {
        Ok(answer) => break answer,
        Err(e) if attempt >= self.policy.attempts => {
          warn!(target: "extraction", %url, attempt, error = %e, "Extraction failed; giving up");
          return Err(e);
        }
        Err(e) => {
          debug!(target: "extraction", %url, attempt, error = %e, "Extraction attempt failed; retrying");
          tokio::time::sleep(self.policy.backoff).await;
        }
      }
    };

    if let Some(record) = &answer {
      self.record_extracted(ctx, record.clone());
    }
    Ok(answer)
  }

  /// Dispatch one extension message. `EXTRACT_PROBLEM` is addressed to pages,
  /// so the coordinator ignores it.
  pub async fn handle(
    &self,
    ctx: &mut SessionContext,
    msg: ExtensionMessage,
    active_tab: Option<&dyn Tab>,
  ) -> Result<Option<ProblemRecord>, ExtractError> {
    match msg {
      ExtensionMessage::ProblemExtracted { data } => {
        self.record_extracted(ctx, data);
        Ok(None)
      }
      ExtensionMessage::GetCurrentProblem => Ok(self.current_problem(ctx)),
      ExtensionMessage::ManualExtract => match active_tab {
        Some(tab) => self.manual_extract(ctx, tab).await,
        None => {
          warn!(target: "extraction", "No active tab found");
          Ok(None)
        }
      },
      ExtensionMessage::ExtractProblem => Ok(None),
    }
  }

  /// Drain pushes from page agents until every sender is gone.
  pub async fn run(&self, mut ctx: SessionContext, mut rx: UnboundedReceiver<ExtensionMessage>) -> SessionContext {
    while let Some(msg) = rx.recv().await {
      if let ExtensionMessage::ProblemExtracted { data } = msg {
        self.record_extracted(&mut ctx, data);
      }
    }
    ctx
  }
}
