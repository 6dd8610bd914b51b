//! The `FriendStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `howarethey-store-sqlite`). The service layer depends on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use crate::friend::{Friend, FriendId, NewFriend};

/// Abstraction over the durable friends table.
///
/// Rows come back in a stable order (ascending id) so that a weighted draw
/// over the same contents always walks friends in the same sequence.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait FriendStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every stored friend, ordered by id.
  fn list_friends(
    &self,
  ) -> impl Future<Output = Result<Vec<Friend>, Self::Error>> + Send + '_;

  /// Persist a new friend and return it with its store-assigned id.
  fn insert_friend(
    &self,
    friend: NewFriend,
  ) -> impl Future<Output = Result<Friend, Self::Error>> + Send + '_;

  /// Overwrite every column of the row keyed by `friend.id`.
  ///
  /// Returns `false` if no such row exists.
  fn update_friend(
    &self,
    friend: Friend,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete the row keyed by `id`. Returns `false` if no such row exists.
  fn delete_friend(
    &self,
    id: FriendId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
