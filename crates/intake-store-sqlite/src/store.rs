//! [`SqliteSheetStore`], the SQLite implementation of [`SheetStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use intake_core::store::{Collection, SheetStore};

use crate::{
  Error, Result,
  encode::{RawCollection, decode_cells, encode_cells, encode_dt, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A sheet store backed by a single SQLite file.
///
/// Clones share the same connection.
#[derive(Clone)]
pub struct SqliteSheetStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteSheetStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn collection_exists(
  conn: &rusqlite::Connection,
  id_str: &str,
) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM collections WHERE collection_id = ?1",
        rusqlite::params![id_str],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

// ─── SheetStore impl ─────────────────────────────────────────────────────────

impl SheetStore for SqliteSheetStore {
  type Error = Error;

  async fn open_collection(&self, name: String) -> Result<Collection> {
    let id_str = encode_uuid(Uuid::new_v4());
    let at_str = encode_dt(Utc::now());
    let lookup = name.clone();

    let (created, raw): (bool, RawCollection) = self
      .conn
      .call(move |conn| {
        let created = conn.execute(
          "INSERT OR IGNORE INTO collections (collection_id, name, created_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, lookup, at_str],
        )? > 0;
        let raw = conn.query_row(
          "SELECT collection_id, name, created_at, header_styled
           FROM collections WHERE name = ?1",
          rusqlite::params![lookup],
          RawCollection::from_row,
        )?;
        Ok((created, raw))
      })
      .await?;

    if created {
      tracing::info!(collection = %name, "created collection");
    }
    raw.into_collection()
  }

  async fn first_row(&self, collection_id: Uuid) -> Result<Option<Vec<String>>> {
    let id_str = encode_uuid(collection_id);

    let cells: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT cells_json FROM sheet_rows
               WHERE collection_id = ?1 AND row_number = 1",
              rusqlite::params![id_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    cells.as_deref().map(decode_cells).transpose()
  }

  async fn write_header(
    &self,
    collection_id: Uuid,
    header: Vec<String>,
  ) -> Result<()> {
    let id_str    = encode_uuid(collection_id);
    let cells_str = encode_cells(&header)?;
    let at_str    = encode_dt(Utc::now());

    let found: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !collection_exists(&tx, &id_str)? {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO sheet_rows (collection_id, row_number, cells_json, written_at)
           VALUES (?1, 1, ?2, ?3)
           ON CONFLICT (collection_id, row_number)
           DO UPDATE SET cells_json = excluded.cells_json,
                         written_at = excluded.written_at",
          rusqlite::params![id_str, cells_str, at_str],
        )?;
        tx.execute(
          "UPDATE collections SET header_styled = 1 WHERE collection_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !found {
      return Err(Error::CollectionNotFound(collection_id));
    }
    Ok(())
  }

  async fn append_row(&self, collection_id: Uuid, cells: Vec<String>) -> Result<u64> {
    let id_str    = encode_uuid(collection_id);
    let cells_str = encode_cells(&cells)?;
    let at_str    = encode_dt(Utc::now());

    // The row number is read and written inside one transaction so an append
    // either lands completely or not at all.
    let row_number: Option<i64> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !collection_exists(&tx, &id_str)? {
          return Ok(None);
        }
        let next: i64 = tx.query_row(
          "SELECT COALESCE(MAX(row_number), 0) + 1 FROM sheet_rows
           WHERE collection_id = ?1",
          rusqlite::params![id_str],
          |row| row.get(0),
        )?;
        tx.execute(
          "INSERT INTO sheet_rows (collection_id, row_number, cells_json, written_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, next, cells_str, at_str],
        )?;
        tx.commit()?;
        Ok(Some(next))
      })
      .await?;

    row_number
      .map(|n| n as u64)
      .ok_or(Error::CollectionNotFound(collection_id))
  }

  async fn row_count(&self, collection_id: Uuid) -> Result<u64> {
    let id_str = encode_uuid(collection_id);

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM sheet_rows WHERE collection_id = ?1",
          rusqlite::params![id_str],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(count as u64)
  }

  async fn rows(&self, collection_id: Uuid) -> Result<Vec<Vec<String>>> {
    let id_str = encode_uuid(collection_id);

    let raws: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT cells_json FROM sheet_rows
           WHERE collection_id = ?1 ORDER BY row_number",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    raws.iter().map(|s| decode_cells(s)).collect()
  }
}
