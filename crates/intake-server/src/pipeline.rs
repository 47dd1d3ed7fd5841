//! The submission pipeline.
//!
//! ```text
//! validate ─▶ acquire lock ─▶ open sheet ─▶ ensure header ─▶ append ─▶ release
//!                                                                     │
//!                                              notify (best effort) ◀─┘
//! ```
//!
//! Validation failures return before the lock is touched. Store failures
//! abort the request after the lock is released. Notification failures are
//! logged and otherwise ignored: by then the row is already stored.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use intake_core::{
  layout::SheetLayout,
  mail::{Mailer, OutboundMessage},
  record::{SubmissionRecord, ValidatedSubmission},
  store::{HeaderState, SheetStore, ensure_header},
  validate::{RawFields, ValidationPolicy, validate},
};
use intake_mail::{Brand, compose};
use tracing::Span;
use uuid::Uuid;

use crate::{
  error::{IntakeError, NotificationFailure, StoreStage},
  lock::WriteLock,
};

// ─── Settings ────────────────────────────────────────────────────────────────

/// Static per-deployment settings for [`IntakeService`].
#[derive(Debug, Clone)]
pub struct IntakeSettings {
  pub policy:               ValidationPolicy,
  pub layout:               SheetLayout,
  pub collection:           String,
  pub lock_timeout:         Duration,
  /// Upper bound for each individual notification send.
  pub notify_timeout:       Duration,
  pub confirmation_enabled: bool,
  pub team_enabled:         bool,
  pub brand:                Brand,
}

// ─── Outcome types ───────────────────────────────────────────────────────────

/// What happened to one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
  Sent,
  /// Disabled in configuration, or nobody to send to.
  Skipped,
  Failed(NotificationFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyReport {
  pub confirmation: Delivery,
  pub team:         Delivery,
}

/// A stored submission.
#[derive(Debug, Clone)]
pub struct Receipt {
  pub record:        SubmissionRecord,
  /// 1-based row number in the sheet, header included.
  pub row_number:    u64,
  pub header:        HeaderState,
  pub notifications: NotifyReport,
}

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct IntakeService<S, M> {
  store:    Arc<S>,
  mailer:   Arc<M>,
  lock:     WriteLock,
  settings: IntakeSettings,
}

impl<S, M> IntakeService<S, M>
where
  S: SheetStore,
  M: Mailer,
{
  pub fn new(
    store: Arc<S>,
    mailer: Arc<M>,
    lock: WriteLock,
    settings: IntakeSettings,
  ) -> Self {
    Self {
      store,
      mailer,
      lock,
      settings,
    }
  }

  pub fn settings(&self) -> &IntakeSettings { &self.settings }

  pub fn lock(&self) -> &WriteLock { &self.lock }

  /// Run one submission through the pipeline.
  #[tracing::instrument(name = "submit", skip_all, fields(submission_id = tracing::field::Empty))]
  pub async fn submit(
    &self,
    fields: Option<&RawFields>,
  ) -> Result<Receipt, IntakeError> {
    let submission_id = Uuid::new_v4();
    Span::current().record("submission_id", tracing::field::display(submission_id));

    let input = validate(fields, &self.settings.policy).inspect_err(|e| {
      tracing::warn!(error = %e, "submission rejected");
    })?;

    let mut guard = self
      .lock
      .acquire(self.settings.lock_timeout)
      .await
      .inspect_err(|e| tracing::warn!(error = %e, "write lock not acquired"))?;

    let stored = self.append_record(submission_id, input).await;
    guard.release();

    let (record, row_number, header) = stored.inspect_err(|e| {
      tracing::error!(error = %e, "failed to store submission");
    })?;
    tracing::info!(row = row_number, email = %record.email, "submission stored");

    let notifications = self.notify(&record).await;

    Ok(Receipt {
      record,
      row_number,
      header,
      notifications,
    })
  }

  /// Create the collection and its header if needed, without appending.
  /// Used by the one-off sheet initialisation command.
  pub async fn init_sheet(&self) -> Result<HeaderState, IntakeError> {
    let _guard = self.lock.acquire(self.settings.lock_timeout).await?;
    let collection = self
      .store
      .open_collection(self.settings.collection.clone())
      .await
      .map_err(|e| IntakeError::store(StoreStage::OpenCollection, e))?;
    ensure_header(
      self.store.as_ref(),
      collection.collection_id,
      self.settings.layout.header(),
    )
    .await
    .map_err(|e| IntakeError::store(StoreStage::WriteHeader, e))
  }

  /// The guarded section. Must only run while the write lock is held.
  async fn append_record(
    &self,
    submission_id: Uuid,
    input: ValidatedSubmission,
  ) -> Result<(SubmissionRecord, u64, HeaderState), IntakeError> {
    let collection = self
      .store
      .open_collection(self.settings.collection.clone())
      .await
      .map_err(|e| IntakeError::store(StoreStage::OpenCollection, e))?;

    let header = ensure_header(
      self.store.as_ref(),
      collection.collection_id,
      self.settings.layout.header(),
    )
    .await
    .map_err(|e| IntakeError::store(StoreStage::WriteHeader, e))?;
    if header != HeaderState::Present {
      tracing::info!(collection = %collection.name, ?header, "wrote sheet header");
    }

    let record = SubmissionRecord::new(submission_id, input, Utc::now());
    let row_number = self
      .store
      .append_row(collection.collection_id, self.settings.layout.row(&record))
      .await
      .map_err(|e| IntakeError::store(StoreStage::AppendRow, e))?;

    Ok((record, row_number, header))
  }

  async fn notify(&self, record: &SubmissionRecord) -> NotifyReport {
    let brand = &self.settings.brand;

    let confirmation = if self.settings.confirmation_enabled {
      self
        .deliver("confirmation", compose::confirmation(record, brand))
        .await
    } else {
      Delivery::Skipped
    };

    let team = if self.settings.team_enabled {
      self.deliver("team", compose::team_alert(record, brand)).await
    } else {
      Delivery::Skipped
    };

    NotifyReport { confirmation, team }
  }

  async fn deliver(
    &self,
    kind: &'static str,
    message: intake_mail::Result<OutboundMessage>,
  ) -> Delivery {
    let message = match message {
      Ok(message) => message,
      Err(e) => {
        let failure = NotificationFailure::Compose(e.to_string());
        tracing::warn!(kind, error = %failure, "notification failed");
        return Delivery::Failed(failure);
      }
    };
    if message.to.is_empty() {
      tracing::debug!(kind, "no recipients; notification skipped");
      return Delivery::Skipped;
    }

    let timeout = self.settings.notify_timeout;
    let failure = match tokio::time::timeout(timeout, self.mailer.send(&message)).await {
      Ok(Ok(())) => {
        tracing::info!(kind, recipients = message.to.len(), "notification sent");
        return Delivery::Sent;
      }
      Ok(Err(e)) => NotificationFailure::Transport(e.to_string()),
      Err(_) => NotificationFailure::TimedOut(timeout),
    };

    tracing::warn!(kind, error = %failure, "notification failed");
    Delivery::Failed(failure)
  }
}

#[cfg(test)]
mod tests;
