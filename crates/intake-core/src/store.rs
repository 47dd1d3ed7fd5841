//! The `SheetStore` trait and header bootstrap.
//!
//! A sheet store is spreadsheet-shaped: named collections holding numbered
//! rows of string cells. Row 1 is the header. The intake service only ever
//! appends rows; the single exception is writing the header into an empty or
//! blank first row.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A named collection (sheet) inside the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collection {
  pub collection_id: Uuid,
  pub name:          String,
  pub created_at:    DateTime<Utc>,
  /// Set once a header has been written through [`SheetStore::write_header`].
  pub header_styled: bool,
}

/// Abstraction over a sheet store backend.
///
/// All methods return `Send` futures so the trait can be used from axum
/// handlers on a multi-threaded runtime.
pub trait SheetStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Resolve the collection called `name`, creating it when missing.
  fn open_collection(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Collection, Self::Error>> + Send + '_;

  /// Cells of row 1, or `None` when the collection has no rows.
  fn first_row(
    &self,
    collection_id: Uuid,
  ) -> impl Future<Output = Result<Option<Vec<String>>, Self::Error>> + Send + '_;

  /// Write `header` as row 1, replacing whatever row 1 held.
  fn write_header(
    &self,
    collection_id: Uuid,
    header: Vec<String>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Append one row after the last row. Returns its 1-based row number.
  fn append_row(
    &self,
    collection_id: Uuid,
    cells: Vec<String>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Number of rows, header included.
  fn row_count(
    &self,
    collection_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Every row in order, header included.
  fn rows(
    &self,
    collection_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Vec<String>>, Self::Error>> + Send + '_;
}

/// What [`ensure_header`] found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderState {
  /// The collection was empty; the header was written.
  Created,
  /// Row 1 existed but every cell was empty; the header was written over it.
  Repaired,
  /// Row 1 already had content and was left alone.
  Present,
}

/// Make sure row 1 of `collection_id` is a header.
///
/// Not atomic on its own: callers must hold the write lock so two requests
/// cannot both see an empty collection.
pub async fn ensure_header<S: SheetStore>(
  store: &S,
  collection_id: Uuid,
  header: &[&str],
) -> Result<HeaderState, S::Error> {
  let owned = || header.iter().map(|c| (*c).to_owned()).collect::<Vec<_>>();
  match store.first_row(collection_id).await? {
    None => {
      store.write_header(collection_id, owned()).await?;
      Ok(HeaderState::Created)
    }
    Some(row) if row.iter().all(String::is_empty) => {
      store.write_header(collection_id, owned()).await?;
      Ok(HeaderState::Repaired)
    }
    Some(_) => Ok(HeaderState::Present),
  }
}
