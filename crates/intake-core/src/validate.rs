//! Request validation.
//!
//! [`validate`] is a pure function: raw form fields in, a
//! [`ValidatedSubmission`] or a [`ValidationError`] out. Which rules apply is
//! decided by a [`ValidationPolicy`] picked in configuration.

use std::{collections::HashMap, sync::LazyLock};

use regex_lite::Regex;
use serde::Deserialize;

use crate::{
  error::{Field, FieldViolation, ValidationError},
  record::{DEFAULT_SUBMISSION_TYPE, ValidatedSubmission},
};

/// Form fields exactly as they arrived, keyed by form name.
pub type RawFields = HashMap<String, String>;

static EMAIL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Named policy presets, as written in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
  #[default]
  Strict,
  Lenient,
}

/// Required fields and minimum lengths for a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationPolicy {
  /// Minimum trimmed name length in characters. `1` means "required".
  pub name_min_chars:    usize,
  /// Minimum phone length after stripping non-digits. `1` means "required".
  pub phone_min_digits:  usize,
  pub require_subject:   bool,
  /// Minimum trimmed message length; `None` makes the message optional.
  pub message_min_chars: Option<usize>,
}

impl ValidationPolicy {
  /// The canonical policy.
  pub const STRICT: Self = Self {
    name_min_chars:    3,
    phone_min_digits:  10,
    require_subject:   true,
    message_min_chars: Some(10),
  };

  /// Degraded mode: only name, email and phone must be present.
  pub const LENIENT: Self = Self {
    name_min_chars:    1,
    phone_min_digits:  1,
    require_subject:   false,
    message_min_chars: None,
  };
}

impl Default for ValidationPolicy {
  fn default() -> Self { Self::STRICT }
}

impl From<PolicyKind> for ValidationPolicy {
  fn from(kind: PolicyKind) -> Self {
    match kind {
      PolicyKind::Strict => Self::STRICT,
      PolicyKind::Lenient => Self::LENIENT,
    }
  }
}

// ─── Normalisation helpers ───────────────────────────────────────────────────

fn field(fields: &RawFields, key: &str) -> String {
  fields.get(key).map(|v| v.trim().to_owned()).unwrap_or_default()
}

/// Strip every character that is not an ASCII digit.
pub fn normalize_phone(raw: &str) -> String {
  raw.chars().filter(char::is_ascii_digit).collect()
}

pub fn is_valid_email(email: &str) -> bool { EMAIL_SHAPE.is_match(email) }

fn min_len_rule(
  field: Field,
  value: &str,
  min: usize,
  label: &str,
  unit: &str,
) -> Option<FieldViolation> {
  let len = value.chars().count();
  let message = if len == 0 {
    format!("{label} is required")
  } else if len < min {
    format!("{label} is too short (minimum {min} {unit})")
  } else {
    return None;
  };
  Some(FieldViolation { field, message })
}

// ─── Validator ───────────────────────────────────────────────────────────────

/// Validate and normalise submitted form fields.
///
/// Every violated rule is reported, in form order.
pub fn validate(
  fields: Option<&RawFields>,
  policy: &ValidationPolicy,
) -> Result<ValidatedSubmission, ValidationError> {
  let fields = match fields {
    Some(f) if !f.is_empty() => f,
    _ => return Err(ValidationError::InvalidRequest),
  };

  let name = field(fields, "name");
  let email = field(fields, "email");
  let phone = normalize_phone(&field(fields, "phone"));
  let company = field(fields, "company");
  let subject = field(fields, "subject");
  let message = field(fields, "message");
  let submission_type = match field(fields, "type") {
    t if t.is_empty() => DEFAULT_SUBMISSION_TYPE.to_owned(),
    t => t,
  };

  let mut violations = Vec::new();

  violations.extend(min_len_rule(
    Field::Name,
    &name,
    policy.name_min_chars.max(1),
    "Name",
    "characters",
  ));

  if email.is_empty() {
    violations.push(FieldViolation {
      field:   Field::Email,
      message: "Email is required".to_owned(),
    });
  } else if !is_valid_email(&email) {
    violations.push(FieldViolation {
      field:   Field::Email,
      message: "Email address is invalid".to_owned(),
    });
  }

  violations.extend(min_len_rule(
    Field::Phone,
    &phone,
    policy.phone_min_digits.max(1),
    "Phone",
    "digits",
  ));

  if policy.require_subject && subject.is_empty() {
    violations.push(FieldViolation {
      field:   Field::Subject,
      message: "Subject is required".to_owned(),
    });
  }

  if let Some(min) = policy.message_min_chars {
    violations.extend(min_len_rule(
      Field::Message,
      &message,
      min.max(1),
      "Message",
      "characters",
    ));
  }

  if !violations.is_empty() {
    return Err(ValidationError::InvalidFields(violations));
  }

  Ok(ValidatedSubmission {
    name,
    email,
    phone,
    company,
    subject,
    message,
    submission_type,
  })
}
