//! Error types and axum `IntoResponse` implementation.

use std::{fmt, time::Duration};

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};
use intake_core::ValidationError;
use thiserror::Error;

use crate::{lock::LockTimeout, response::StatusBody};

/// Which store step failed. Shown to the caller instead of the raw backend
/// error, which only goes to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStage {
  OpenCollection,
  WriteHeader,
  AppendRow,
}

impl fmt::Display for StoreStage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      StoreStage::OpenCollection => "could not open the sheet",
      StoreStage::WriteHeader => "could not write the sheet header",
      StoreStage::AppendRow => "could not append the row",
    })
  }
}

/// Why a submission was not stored.
#[derive(Debug, Error)]
pub enum IntakeError {
  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error(transparent)]
  LockTimeout(#[from] LockTimeout),

  #[error("store unavailable: {stage}: {source}")]
  StoreUnavailable {
    stage:  StoreStage,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

impl IntakeError {
  pub fn store(
    stage: StoreStage,
    source: impl std::error::Error + Send + Sync + 'static,
  ) -> Self {
    IntakeError::StoreUnavailable {
      stage,
      source: Box::new(source),
    }
  }

  /// Message safe to show the submitter.
  pub fn public_message(&self) -> String {
    match self {
      IntakeError::Validation(ValidationError::InvalidRequest) => {
        "Invalid request - no data received.".to_owned()
      }
      IntakeError::Validation(e) => e.to_string(),
      IntakeError::LockTimeout(_) => {
        "The server is busy, please try again.".to_owned()
      }
      IntakeError::StoreUnavailable { stage, .. } => {
        format!("Failed to save the submission: {stage}")
      }
    }
  }

  pub fn status_code(&self) -> StatusCode {
    match self {
      IntakeError::Validation(_) => StatusCode::BAD_REQUEST,
      IntakeError::LockTimeout(_) => StatusCode::SERVICE_UNAVAILABLE,
      IntakeError::StoreUnavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for IntakeError {
  fn into_response(self) -> Response {
    StatusBody::error(self.public_message()).with_status(self.status_code())
  }
}

/// A notification that could not be delivered. Logged, never returned to
/// the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotificationFailure {
  #[error("could not compose message: {0}")]
  Compose(String),

  #[error("transport error: {0}")]
  Transport(String),

  #[error("send timed out after {0:?}")]
  TimedOut(Duration),
}
