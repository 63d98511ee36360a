//! Student Buddy: progressive hints and pseudo-code for online-judge problems.
//!
//! Two halves live in this crate:
//! - the backend (`routes`, `validate`, `normalize`, `generator`, `finalize`)
//!   that forwards a problem statement to an OpenAI-compatible model and
//!   reshapes the answer;
//! - the extension side (`extension`) that scrapes problem pages, keeps the
//!   most recent problem for the popup, and talks to the backend.

pub mod config;
pub mod domain;
pub mod error;
pub mod extension;
pub mod extractors;
pub mod finalize;
pub mod generator;
pub mod logic;
pub mod normalize;
pub mod openai;
pub mod protocol;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod util;
pub mod validate;
