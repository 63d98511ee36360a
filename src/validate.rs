//! Inbound request validation for `POST /api/v1/analyze-question`.
//!
//! Works on the raw JSON body so type mismatches are reported per field instead
//! of failing deserialization as a whole. Every violation is collected; unknown
//! fields are dropped silently.

use std::borrow::Cow;

use serde_json::{Map, Value};
use validator::{Validate, ValidationError};

use crate::domain::{Platform, RequestedDifficulty};
use crate::protocol::{AnalysisInput, AnalysisRequest, FieldError};

pub const MIN_QUESTION_CHARS: usize = 10;
pub const MAX_QUESTION_CHARS: usize = 10_000;

/// Rust field name -> wire field name, in reporting order.
const FIELDS: [(&str, &str); 5] = [
  ("question_text", "questionText"),
  ("difficulty", "difficulty"),
  ("platform", "platform"),
  ("include_explanation", "includeExplanation"),
  ("request_pseudo_code", "requestPseudoCode"),
];

fn rule(code: &'static str, message: &'static str) -> ValidationError {
  ValidationError::new(code).with_message(Cow::Borrowed(message))
}

pub fn validate_question_text(text: &str) -> Result<(), ValidationError> {
  let len = text.chars().count();
  if len == 0 {
    Err(rule("string.empty", "Question text cannot be empty"))
  } else if len < MIN_QUESTION_CHARS {
    Err(rule("string.min", "Question text must be at least 10 characters long"))
  } else if len > MAX_QUESTION_CHARS {
    Err(rule("string.max", "Question text must be less than 10,000 characters"))
  } else {
    Ok(())
  }
}

pub fn validate_difficulty(value: &str) -> Result<(), ValidationError> {
  value.parse::<RequestedDifficulty>().map(|_| ()).map_err(|_| {
    rule("any.only", "Difficulty must be one of: easy, medium, hard, beginner, intermediate, advanced")
  })
}

pub fn validate_platform(value: &str) -> Result<(), ValidationError> {
  value
    .parse::<Platform>()
    .map(|_| ())
    .map_err(|_| rule("any.only", "Platform must be one of the supported coding platforms"))
}

fn take_string(obj: &Map<String, Value>, key: &str, type_message: &str, errors: &mut Vec<FieldError>) -> Option<String> {
  match obj.get(key) {
    None => None,
    Some(Value::String(s)) => Some(s.clone()),
    Some(_) => {
      errors.push(FieldError::new(key, type_message));
      None
    }
  }
}

/// Booleans accept JSON booleans and the strings "true"/"false".
fn take_bool(obj: &Map<String, Value>, key: &str, errors: &mut Vec<FieldError>) -> Option<bool> {
  match obj.get(key) {
    None => None,
    Some(Value::Bool(b)) => Some(*b),
    Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Some(true),
    Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Some(false),
    Some(_) => {
      errors.push(FieldError::new(key, format!("\"{}\" must be a boolean", key)));
      None
    }
  }
}

/// Validate a raw JSON body. Returns the typed request or every violation found.
pub fn validate_analysis_input(body: &Value) -> Result<AnalysisRequest, Vec<FieldError>> {
  let Some(obj) = body.as_object() else {
    return Err(vec![FieldError::new("body", "Request body must be a JSON object")]);
  };

  let mut errors = Vec::new();
  let input = AnalysisInput {
    question_text: take_string(obj, "questionText", "Question text must be a string", &mut errors),
    difficulty: take_string(obj, "difficulty", "Difficulty must be a string", &mut errors),
    platform: take_string(obj, "platform", "Platform must be a string", &mut errors),
    include_explanation: take_bool(obj, "includeExplanation", &mut errors),
    request_pseudo_code: take_bool(obj, "requestPseudoCode", &mut errors),
  };

  if !obj.contains_key("questionText") {
    errors.push(FieldError::new("questionText", "Question text is required"));
  }

  if let Err(report) = input.validate() {
    let by_field = report.field_errors();
    for (rust_name, wire_name) in FIELDS {
      let Some(list) = by_field.get(rust_name) else { continue };
      for e in list.iter() {
        let message = e.message.clone().map(|m| m.into_owned()).unwrap_or_else(|| e.code.to_string());
        errors.push(FieldError::new(wire_name, message));
      }
    }
  }

  if !errors.is_empty() {
    errors.sort_by_key(|e| FIELDS.iter().position(|(_, w)| *w == e.field).unwrap_or(FIELDS.len()));
    return Err(errors);
  }

  let Some(question_text) = input.question_text else {
    return Err(vec![FieldError::new("questionText", "Question text is required")]);
  };
  Ok(AnalysisRequest {
    question_text,
    difficulty: input.difficulty.as_deref().and_then(|d| d.parse().ok()),
    platform: input.platform.as_deref().and_then(|p| p.parse().ok()),
    include_explanation: input.include_explanation.unwrap_or(true),
    request_pseudo_code: input.request_pseudo_code.unwrap_or(true),
  })
}
