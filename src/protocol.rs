//! Public protocol structs for the HTTP API and the extension's internal
//! message passing (serde ready). Keep this small and stable so the backend and
//! the extension can evolve independently.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::{Platform, ProblemRecord, RequestedDifficulty};
use crate::validate::{validate_difficulty, validate_platform, validate_question_text};

/// Messages exchanged between the popup, the coordinator and page agents.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtensionMessage {
    /// page -> coordinator, fire-and-forget.
    ProblemExtracted { data: ProblemRecord },
    /// popup -> coordinator, synchronous read of the held record.
    GetCurrentProblem,
    /// popup -> coordinator, retry-bounded extraction from the active tab.
    ManualExtract,
    /// coordinator -> page, answered with one record or null.
    ExtractProblem,
}

//
// HTTP request/response DTOs
//

/// One schema violation, reported as `{field, message}`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

/// Inbound fields after type coercion, before rule checks.
/// Unknown JSON fields never make it into this struct.
#[derive(Debug, Default, Validate)]
pub struct AnalysisInput {
    #[validate(custom(function = "validate_question_text"))]
    pub question_text: Option<String>,
    #[validate(custom(function = "validate_difficulty"))]
    pub difficulty: Option<String>,
    #[validate(custom(function = "validate_platform"))]
    pub platform: Option<String>,
    pub include_explanation: Option<bool>,
    pub request_pseudo_code: Option<bool>,
}

/// A request that passed validation. Booleans carry their defaults.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisRequest {
    pub question_text: String,
    pub difficulty: Option<RequestedDifficulty>,
    pub platform: Option<Platform>,
    pub include_explanation: bool,
    pub request_pseudo_code: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    pub hints_generated: usize,
    pub timestamp: String,
    pub analysis_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub hints: Vec<String>,
    pub pseudo_code: String,
    pub metadata: AnalysisMetadata,
}

/// `{success: true, data, timestamp}`
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessEnvelope<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: String,
}

impl<T> SuccessEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self { success: true, data, timestamp: crate::util::now_iso() }
    }
}

/// Outgoing request body built by the extension's gateway.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeQuestionIn {
    pub question_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<RequestedDifficulty>,
    pub platform: Platform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint_index: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthOut {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct ModelHealthOut {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: String,
}
