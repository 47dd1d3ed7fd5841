//! Submission records: the unit of persisted state.
//!
//! A record is built once from a validated submission plus the time the store
//! accepted it, appended as a single row, and never touched again by this
//! service. Later status changes happen by hand in the sheet.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Status literal written into every freshly appended row.
pub const INITIAL_STATUS: &str = "New";

/// Submission type used when the form does not send one.
pub const DEFAULT_SUBMISSION_TYPE: &str = "contact";

// ─── Subject codes ───────────────────────────────────────────────────────────

/// The subject picked on the contact form.
///
/// The site sends Portuguese codes (`distribuidor`, `suporte`, …); English
/// spellings are accepted too. Anything unrecognised is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectCode {
  Distributor,
  Consultant,
  Products,
  Partnership,
  Support,
  Other,
  FreeText(String),
  Unspecified,
}

impl SubjectCode {
  pub fn parse(raw: &str) -> Self {
    let raw = raw.trim();
    match raw.to_lowercase().as_str() {
      "" => Self::Unspecified,
      "distribuidor" | "distributor" => Self::Distributor,
      "consultor" | "consultant" => Self::Consultant,
      "produtos" | "products" => Self::Products,
      "parceria" | "partnership" => Self::Partnership,
      "suporte" | "support" => Self::Support,
      "outro" | "other" => Self::Other,
      _ => Self::FreeText(raw.to_owned()),
    }
  }

  /// Human label used in notification messages.
  pub fn label(&self) -> &str {
    match self {
      Self::Distributor => "Become a Distributor",
      Self::Consultant => "Become a Consultant",
      Self::Products => "Product Information",
      Self::Partnership => "Business Partnership",
      Self::Support => "Support",
      Self::Other => "Other",
      Self::FreeText(text) => text,
      Self::Unspecified => "Not specified",
    }
  }

  /// Subjects the team follows up first.
  pub fn is_high_priority(&self) -> bool {
    matches!(self, Self::Distributor | Self::Partnership | Self::Consultant)
  }
}

// ─── Validated input ─────────────────────────────────────────────────────────

/// Normalised form input that passed the active
/// [`ValidationPolicy`](crate::validate::ValidationPolicy).
///
/// Optional fields the submitter left out are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedSubmission {
  pub name:            String,
  pub email:           String,
  /// Digits only.
  pub phone:           String,
  pub company:         String,
  pub subject:         String,
  pub message:         String,
  pub submission_type: String,
}

// ─── Record ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionRecord {
  /// Correlates log lines for one submission. Not written to the sheet.
  pub submission_id:   Uuid,
  pub name:            String,
  pub email:           String,
  pub phone:           String,
  pub company:         String,
  pub subject:         String,
  pub message:         String,
  pub submission_type: String,
  pub created_at:      DateTime<Utc>,
  pub status:          String,
}

impl SubmissionRecord {
  pub fn new(
    submission_id: Uuid,
    input: ValidatedSubmission,
    created_at: DateTime<Utc>,
  ) -> Self {
    Self {
      submission_id,
      name: input.name,
      email: input.email,
      phone: input.phone,
      company: input.company,
      subject: input.subject,
      message: input.message,
      submission_type: input.submission_type,
      created_at,
      status: INITIAL_STATUS.to_owned(),
    }
  }

  pub fn subject_code(&self) -> SubjectCode { SubjectCode::parse(&self.subject) }
}
