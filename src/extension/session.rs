//! Popup-side hint session: progressive hint disclosure and the pseudo-code
//! panel, persisted so closing the popup loses nothing.

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{Hint, HintState, ProblemRecord, PseudoCodeState};
use crate::extension::gateway::{ApiClient, GatewayError};
use crate::extension::storage::{self, KeyValueStore, StoreError};

pub const MAX_HINTS_PER_PROBLEM: usize = 5;

const HINTS_KEY: &str = "sb_hints";
const PSEUDO_CODE_KEY: &str = "sb_pseudoCode";
const CURRENT_INDEX_KEY: &str = "sb_currentHintIndex";
const REMAINING_KEY: &str = "sb_hintsRemaining";
const PSEUDO_OPEN_KEY: &str = "sb_isPseudoCodeOpen";

#[derive(Debug, Error)]
pub enum SessionError {
  #[error("all hints revealed")]
  AllHintsRevealed,
  #[error(transparent)]
  Gateway(#[from] GatewayError),
  #[error(transparent)]
  Store(#[from] StoreError),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HintSession {
  pub hints: HintState,
  pub pseudo_code: PseudoCodeState,
  pub pseudo_code_open: bool,
}

impl HintSession {
  pub fn load(store: &(impl KeyValueStore + ?Sized)) -> Result<Self, StoreError> {
    let hints = HintState {
      hints: storage::load(store, HINTS_KEY)?.unwrap_or_default(),
      current_index: storage::load(store, CURRENT_INDEX_KEY)?.unwrap_or(0),
      hints_remaining: storage::load(store, REMAINING_KEY)?,
    };
    let pseudo_code = storage::load(store, PSEUDO_CODE_KEY)?.unwrap_or_default();
    let pseudo_code_open = storage::load(store, PSEUDO_OPEN_KEY)?.unwrap_or(false);
    Ok(Self { hints, pseudo_code, pseudo_code_open })
  }

  pub fn save(&self, store: &(impl KeyValueStore + ?Sized)) -> Result<(), StoreError> {
    storage::save(store, HINTS_KEY, &self.hints.hints)?;
    storage::save(store, CURRENT_INDEX_KEY, &self.hints.current_index)?;
    match self.hints.hints_remaining {
      Some(n) => storage::save(store, REMAINING_KEY, &n)?,
      None => store.remove(REMAINING_KEY)?,
    }
    storage::save(store, PSEUDO_CODE_KEY, &self.pseudo_code)?;
    storage::save(store, PSEUDO_OPEN_KEY, &self.pseudo_code_open)
  }

  pub fn can_reveal_more(&self) -> bool {
    self.hints.current_index < MAX_HINTS_PER_PROBLEM && self.hints.hints_remaining != Some(0)
  }

  /// Fetch and append the next hint. Nothing changes on failure.
  pub async fn reveal_next(&mut self, gateway: &ApiClient, problem: &ProblemRecord) -> Result<&Hint, SessionError> {
    if !self.can_reveal_more() {
      return Err(SessionError::AllHintsRevealed);
    }
    let idx = self.hints.current_index;
    let reply = gateway.request_next_hint(problem, idx).await?;

    self.hints.hints.push(Hint { index: idx + 1, text: reply.hint });
    self.hints.current_index = idx + 1;
    self.hints.hints_remaining = Some(reply.hints_remaining);
    debug!(target: "student_buddy", index = idx + 1, remaining = reply.hints_remaining, "Hint revealed");

    self.hints.hints.last().ok_or(SessionError::AllHintsRevealed)
  }

  /// First call fetches; later calls only toggle the panel.
  pub async fn reveal_pseudo_code(&mut self, gateway: &ApiClient, problem: &ProblemRecord) -> Result<&str, SessionError> {
    if self.pseudo_code.revealed {
      self.pseudo_code_open = !self.pseudo_code_open;
    } else {
      let content = gateway.request_pseudo_code(problem).await?;
      self.pseudo_code = PseudoCodeState { revealed: true, content };
      self.pseudo_code_open = true;
    }
    Ok(&self.pseudo_code.content)
  }

  pub fn reset(&mut self) {
    info!(target: "student_buddy", "Hint session reset");
    *self = Self::default();
  }
}
