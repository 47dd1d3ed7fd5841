//! SQL schema for the intake sheet store.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS collections (
    collection_id TEXT PRIMARY KEY,
    name          TEXT NOT NULL UNIQUE,
    created_at    TEXT NOT NULL,
    header_styled INTEGER NOT NULL DEFAULT 0
);

-- One row per sheet row. Row 1 is the header.
-- Only row 1 is ever rewritten.
CREATE TABLE IF NOT EXISTS sheet_rows (
    collection_id TEXT NOT NULL REFERENCES collections(collection_id),
    row_number    INTEGER NOT NULL,
    cells_json    TEXT NOT NULL,   -- JSON array of strings
    written_at    TEXT NOT NULL,   -- ISO 8601 UTC
    PRIMARY KEY (collection_id, row_number)
);

PRAGMA user_version = 1;
";
