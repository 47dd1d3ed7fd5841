//! JSON status bodies returned to the site.
//!
//! Every response, success or failure, is a [`StatusBody`]. Callers never see
//! a raw error.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

pub const SUBMIT_OK_MESSAGE: &str = "Message sent successfully!";

pub const SUBMIT_FAILED_MESSAGE: &str = "Failed to process the submission.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
  Ok,
  Success,
  Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusBody {
  pub status:    Status,
  pub message:   String,
  /// ISO 8601, millisecond precision, UTC.
  pub timestamp: String,
}

impl StatusBody {
  fn new(status: Status, message: impl Into<String>) -> Self {
    Self {
      status,
      message: message.into(),
      timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }
  }

  pub fn ok(message: impl Into<String>) -> Self { Self::new(Status::Ok, message) }

  pub fn success(message: impl Into<String>) -> Self {
    Self::new(Status::Success, message)
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self::new(Status::Error, message)
  }

  pub fn with_status(self, code: StatusCode) -> Response {
    (code, Json(self)).into_response()
  }
}

impl IntoResponse for StatusBody {
  fn into_response(self) -> Response { self.with_status(StatusCode::OK) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn serialises_lowercase_status_and_iso_timestamp() {
    let body = serde_json::to_value(StatusBody::success("done")).unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "done");
    let ts = body["timestamp"].as_str().unwrap();
    assert!(ts.ends_with('Z'), "{ts}");
    assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok(), "{ts}");
  }
}
