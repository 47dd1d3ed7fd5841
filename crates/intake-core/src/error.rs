//! Validation error types for `intake-core`.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// A form field that can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
  Name,
  Email,
  Phone,
  Subject,
  Message,
}

impl fmt::Display for Field {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Field::Name => "name",
      Field::Email => "email",
      Field::Phone => "phone",
      Field::Subject => "subject",
      Field::Message => "message",
    })
  }
}

/// One violated rule, with the message shown to the submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
  pub field:   Field,
  pub message: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
  /// No body, or a body that carried no fields at all.
  #[error("invalid request: no data received")]
  InvalidRequest,

  /// At least one field broke a rule. Violations are kept in form order.
  #[error("{}", join_messages(.0))]
  InvalidFields(Vec<FieldViolation>),
}

impl ValidationError {
  /// The fields that failed, in form order. Empty for `InvalidRequest`.
  pub fn fields(&self) -> Vec<Field> {
    match self {
      ValidationError::InvalidRequest => Vec::new(),
      ValidationError::InvalidFields(v) => v.iter().map(|v| v.field).collect(),
    }
  }
}

fn join_messages(violations: &[FieldViolation]) -> String {
  violations
    .iter()
    .map(|v| v.message.as_str())
    .collect::<Vec<_>>()
    .join("; ")
}
