//! [`SqliteStore`] — the SQLite implementation of [`FriendStore`].

use std::path::Path;

use howarethey_core::{
  friend::{Friend, FriendId, NewFriend},
  store::FriendStore,
};
use rusqlite::params;

use crate::{
  Result,
  error::Error,
  schema::{PRAGMAS, migrate},
};

const SELECT_FRIENDS: &str =
  "SELECT id, name, lastContacted, birthday, notes FROM friends ORDER BY id";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A friends table backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run migrations. Missing parent
  /// directories are created.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      tokio::fs::create_dir_all(parent).await?;
    }
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, used by tests.
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
        conn.execute_batch(PRAGMAS)?;
        migrate(conn)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn friend_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Friend> {
  Ok(Friend {
    id:             row.get(0)?,
    name:           row.get(1)?,
    last_contacted: row.get(2)?,
    birthday:       row.get(3)?,
    notes:          row.get(4)?,
  })
}

// ─── FriendStore impl ────────────────────────────────────────────────────────

impl FriendStore for SqliteStore {
  type Error = Error;

  async fn list_friends(&self) -> Result<Vec<Friend>> {
    let friends = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(SELECT_FRIENDS)?;
        let rows = stmt
          .query_map([], friend_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(friends)
  }

  async fn insert_friend(&self, friend: NewFriend) -> Result<Friend> {
    let row = friend.clone();
    let id: FriendId = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO friends (name, lastContacted, birthday, notes)
           VALUES (?1, ?2, ?3, ?4)",
          params![row.name, row.last_contacted, row.birthday, row.notes],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(friend.with_id(id))
  }

  async fn update_friend(&self, friend: Friend) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE friends
           SET name = ?1, lastContacted = ?2, birthday = ?3, notes = ?4
           WHERE id = ?5",
          params![
            friend.name,
            friend.last_contacted,
            friend.birthday,
            friend.notes,
            friend.id,
          ],
        )?;
        Ok(changed)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn delete_friend(&self, id: FriendId) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute("DELETE FROM friends WHERE id = ?1", params![id])?))
      .await?;
    Ok(changed > 0)
  }
}
