//! SQL schema and migrations for the friends table.
//!
//! Migrations are gated on `PRAGMA user_version` and each runs in its own
//! transaction:
//!
//! 1. create `friends`, or add the `birthday` / `notes` columns to a table
//!    written before they existed;
//! 2. rewrite stored `YYYY-MM-DD` dates into the canonical `DD/MM/YYYY`;
//! 3. rebuild a table declared without `AUTOINCREMENT`, so deleted ids are
//!    never handed out again.

use howarethey_core::date::{self, BIRTHDAY, LAST_CONTACTED};
use rusqlite::{Connection, params};

/// Connection-level settings; run on every open.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
";

/// Current table layout; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
const CREATE_FRIENDS: &str = "
CREATE TABLE IF NOT EXISTS friends (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    lastContacted TEXT NOT NULL,              -- DD/MM/YYYY
    birthday      TEXT NOT NULL DEFAULT '',   -- DD/MM/YYYY or '' when unset
    notes         TEXT NOT NULL DEFAULT ''
);
";

/// Copies a legacy table into one with `AUTOINCREMENT` and seeds the id
/// sequence from the highest surviving id.
const REBUILD_FRIENDS: &str = "
CREATE TABLE friends_new (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    lastContacted TEXT NOT NULL,
    birthday      TEXT NOT NULL DEFAULT '',
    notes         TEXT NOT NULL DEFAULT ''
);
INSERT INTO friends_new (id, name, lastContacted, birthday, notes)
    SELECT id, name, COALESCE(lastContacted, ''), COALESCE(birthday, ''), COALESCE(notes, '')
    FROM friends;
DROP TABLE friends;
ALTER TABLE friends_new RENAME TO friends;
DELETE FROM sqlite_sequence WHERE name IN ('friends', 'friends_new');
INSERT INTO sqlite_sequence (name, seq) SELECT 'friends', COALESCE(MAX(id), 0) FROM friends;
";

/// The `user_version` a fully migrated database reports.
pub const SCHEMA_VERSION: i64 = 3;

/// Bring `conn` up to [`SCHEMA_VERSION`].
pub fn migrate(conn: &mut Connection) -> rusqlite::Result<()> {
  let version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

  if version < 1 {
    let tx = conn.transaction()?;
    tx.execute_batch(CREATE_FRIENDS)?;
    let columns = column_names(&tx, "friends")?;
    for (column, ddl) in [
      ("birthday", "ALTER TABLE friends ADD COLUMN birthday TEXT NOT NULL DEFAULT ''"),
      ("notes", "ALTER TABLE friends ADD COLUMN notes TEXT NOT NULL DEFAULT ''"),
    ] {
      if !columns.iter().any(|c| c == column) {
        tracing::info!("adding missing column {column} to friends");
        tx.execute(ddl, [])?;
      }
    }
    tx.pragma_update(None, "user_version", 1)?;
    tx.commit()?;
  }

  if version < 2 {
    let tx = conn.transaction()?;
    normalize_stored_dates(&tx)?;
    tx.pragma_update(None, "user_version", 2)?;
    tx.commit()?;
  }

  if version < 3 {
    let tx = conn.transaction()?;
    if !has_autoincrement(&tx)? {
      tracing::info!("rebuilding friends table with AUTOINCREMENT ids");
      tx.execute_batch(REBUILD_FRIENDS)?;
    }
    tx.pragma_update(None, "user_version", 3)?;
    tx.commit()?;
  }

  Ok(())
}

fn column_names(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
  let names = stmt
    .query_map([], |row| row.get::<_, String>(1))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(names)
}

fn has_autoincrement(conn: &Connection) -> rusqlite::Result<bool> {
  let sql: String = conn.query_row(
    "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = 'friends'",
    [],
    |row| row.get(0),
  )?;
  Ok(sql.to_uppercase().contains("AUTOINCREMENT"))
}

/// Rewrite every parseable date into the canonical encoding. Rows that do
/// not parse are left alone and logged.
fn normalize_stored_dates(conn: &Connection) -> rusqlite::Result<()> {
  let rows: Vec<(i64, String, String)> = {
    let mut stmt = conn.prepare("SELECT id, lastContacted, birthday FROM friends")?;
    stmt
      .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
      .collect::<rusqlite::Result<_>>()?
  };

  for (id, last_contacted, birthday) in rows {
    let canonical_last = canonical_or_original(id, LAST_CONTACTED, &last_contacted);
    let canonical_bday = if birthday.is_empty() {
      birthday.clone()
    } else {
      canonical_or_original(id, BIRTHDAY, &birthday)
    };

    if canonical_last != last_contacted || canonical_bday != birthday {
      conn.execute(
        "UPDATE friends SET lastContacted = ?1, birthday = ?2 WHERE id = ?3",
        params![canonical_last, canonical_bday, id],
      )?;
    }
  }
  Ok(())
}

fn canonical_or_original(id: i64, field: &'static str, value: &str) -> String {
  date::normalize_date(field, value).unwrap_or_else(|e| {
    tracing::warn!(id, "leaving stored value as-is: {e}");
    value.to_owned()
  })
}
