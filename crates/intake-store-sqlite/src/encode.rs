//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase, and row cells
//! a compact JSON array.

use chrono::{DateTime, Utc};
use intake_core::store::Collection;
use uuid::Uuid;

use crate::{Error, Result};

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_cells(cells: &[String]) -> Result<String> {
  Ok(serde_json::to_string(cells)?)
}

pub fn decode_cells(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

/// A `collections` row as read from SQLite, before decoding.
pub struct RawCollection {
  pub collection_id: String,
  pub name:          String,
  pub created_at:    String,
  pub header_styled: bool,
}

impl RawCollection {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      collection_id: row.get(0)?,
      name:          row.get(1)?,
      created_at:    row.get(2)?,
      header_styled: row.get(3)?,
    })
  }

  pub fn into_collection(self) -> Result<Collection> {
    Ok(Collection {
      collection_id: Uuid::parse_str(&self.collection_id)?,
      name:          self.name,
      created_at:    decode_dt(&self.created_at)?,
      header_styled: self.header_styled,
    })
  }
}
