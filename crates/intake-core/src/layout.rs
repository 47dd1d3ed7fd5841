//! Column layout of the backing sheet.
//!
//! A deployment writes one fixed column order for its whole lifetime. The
//! header row and every appended row come from the same [`SheetLayout`], so
//! they can never disagree.

use serde::Deserialize;

use crate::record::SubmissionRecord;

/// Written in the company column when the submitter left it blank.
pub const COMPANY_NOT_INFORMED: &str = "Not informed";

const TIMESTAMPED_HEADER: &[&str] = &[
  "DateTime", "Name", "Email", "Phone", "Company", "Subject", "Message",
  "Status",
];

const LEGACY_HEADER: &[&str] = &[
  "Name", "Email", "Phone", "Company", "Subject", "Message", "Type",
  "DateTime", "Status",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetLayout {
  /// Timestamp first, status last. The canonical layout.
  #[default]
  Timestamped,
  /// Contact fields first, with the submission type column.
  Legacy,
}

impl SheetLayout {
  pub fn header(self) -> &'static [&'static str] {
    match self {
      SheetLayout::Timestamped => TIMESTAMPED_HEADER,
      SheetLayout::Legacy => LEGACY_HEADER,
    }
  }

  /// Cells for `record`, in header order.
  pub fn row(self, record: &SubmissionRecord) -> Vec<String> {
    match self {
      SheetLayout::Timestamped => {
        let company = if record.company.is_empty() {
          COMPANY_NOT_INFORMED.to_owned()
        } else {
          record.company.clone()
        };
        vec![
          record.created_at.to_rfc3339(),
          record.name.clone(),
          record.email.clone(),
          record.phone.clone(),
          company,
          record.subject.clone(),
          record.message.clone(),
          record.status.clone(),
        ]
      }
      SheetLayout::Legacy => vec![
        record.name.clone(),
        record.email.clone(),
        record.phone.clone(),
        record.company.clone(),
        record.subject.clone(),
        record.message.clone(),
        record.submission_type.clone(),
        record.created_at.format("%d/%m/%Y %H:%M:%S").to_string(),
        record.status.clone(),
      ],
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};
  use uuid::Uuid;

  use super::*;
  use crate::record::{INITIAL_STATUS, ValidatedSubmission};

  fn record(company: &str) -> SubmissionRecord {
    SubmissionRecord::new(
      Uuid::new_v4(),
      ValidatedSubmission {
        name:            "Ana Silva".into(),
        email:           "ana@example.com".into(),
        phone:           "21999990000".into(),
        company:         company.into(),
        subject:         "suporte".into(),
        message:         "Preciso de ajuda com meu pedido.".into(),
        submission_type: "contact".into(),
      },
      Utc.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap(),
    )
  }

  #[test]
  fn rows_match_header_width() {
    for layout in [SheetLayout::Timestamped, SheetLayout::Legacy] {
      assert_eq!(layout.header().len(), layout.row(&record("")).len());
    }
  }

  #[test]
  fn timestamped_row_order() {
    let row = SheetLayout::Timestamped.row(&record(""));
    assert_eq!(row[0], "2025-03-09T14:05:07+00:00");
    assert_eq!(row[1], "Ana Silva");
    assert_eq!(row[3], "21999990000");
    assert_eq!(row[4], COMPANY_NOT_INFORMED);
    assert_eq!(row[5], "suporte");
    assert_eq!(row[7], INITIAL_STATUS);
  }

  #[test]
  fn legacy_row_order() {
    let row = SheetLayout::Legacy.row(&record("Acme"));
    assert_eq!(row[3], "Acme");
    assert_eq!(row[6], "contact");
    assert_eq!(row[7], "09/03/2025 14:05:07");
    assert_eq!(row[8], INITIAL_STATUS);
  }
}
