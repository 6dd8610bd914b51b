//! [`MemoryStore`] — a process-local [`FriendStore`].
//!
//! Holds rows in a `Vec` behind a mutex. Used in tests and as a stand-in when
//! no database file is wanted.

use std::{
  convert::Infallible,
  sync::{Mutex, MutexGuard, PoisonError},
};

use crate::{
  friend::{Friend, FriendId, NewFriend},
  store::FriendStore,
};

#[derive(Debug, Default)]
struct Rows {
  friends: Vec<Friend>,
  last_id: FriendId,
}

/// An in-memory friends table with auto-incrementing ids.
#[derive(Debug, Default)]
pub struct MemoryStore {
  rows: Mutex<Rows>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  fn rows(&self) -> MutexGuard<'_, Rows> {
    self.rows.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl FriendStore for MemoryStore {
  type Error = Infallible;

  async fn list_friends(&self) -> Result<Vec<Friend>, Infallible> {
    Ok(self.rows().friends.clone())
  }

  async fn insert_friend(&self, friend: NewFriend) -> Result<Friend, Infallible> {
    let mut rows = self.rows();
    rows.last_id += 1;
    let friend = friend.with_id(rows.last_id);
    rows.friends.push(friend.clone());
    Ok(friend)
  }

  async fn update_friend(&self, friend: Friend) -> Result<bool, Infallible> {
    let mut rows = self.rows();
    match rows.friends.iter_mut().find(|f| f.id == friend.id) {
      Some(slot) => {
        *slot = friend;
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn delete_friend(&self, id: FriendId) -> Result<bool, Infallible> {
    let mut rows = self.rows();
    let before = rows.friends.len();
    rows.friends.retain(|f| f.id != id);
    Ok(rows.friends.len() != before)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn new_friend(name: &str) -> NewFriend {
    NewFriend {
      name:           name.into(),
      last_contacted: "06/06/2023".into(),
      birthday:       String::new(),
      notes:          String::new(),
    }
  }

  #[tokio::test]
  async fn ids_are_assigned_once_and_never_reused() {
    let store = MemoryStore::new();
    let a = store.insert_friend(new_friend("A")).await.unwrap();
    let b = store.insert_friend(new_friend("B")).await.unwrap();
    assert!(store.delete_friend(b.id).await.unwrap());
    let c = store.insert_friend(new_friend("C")).await.unwrap();
    assert_eq!((a.id, b.id, c.id), (1, 2, 3));
  }

  #[tokio::test]
  async fn update_missing_row_reports_false() {
    let store = MemoryStore::new();
    let ghost = new_friend("Ghost").with_id(42);
    assert!(!store.update_friend(ghost).await.unwrap());
  }
}
