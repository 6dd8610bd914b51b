//! [`FriendService`] — the selection pipeline and the cached friends list.
//!
//! The service owns a store handle and an in-memory snapshot of every row.
//! The snapshot is loaded at construction and reloaded after every write, so
//! a reader never sees anything older than the last write this process
//! completed. Writes and the select-then-stamp pipeline are serialised by a
//! single async mutex; reads only take the snapshot's read lock.

use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use chrono::NaiveDate;
use rand::{SeedableRng, rngs::StdRng};
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

use crate::{
  Error, Result, birthday, date,
  friend::{self, Friend, FriendId, FriendInput},
  notify::Notifier,
  select,
  store::FriendStore,
};

// ─── Options ─────────────────────────────────────────────────────────────────

/// Behaviour switches for [`FriendService`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceOptions {
  /// Reject a `lastContacted` after today on add and update. When off, such
  /// friends are stored and simply excluded from draws.
  pub reject_future_dates: bool,
}

// ─── Selection ───────────────────────────────────────────────────────────────

/// Result of [`FriendService::select_and_advance`].
#[derive(Debug, Clone)]
pub struct Selection {
  /// The winner as it was drawn, before its date was bumped.
  pub friend:    Friend,
  /// The winner as written back, with `last_contacted` set to the draw day.
  pub stamped:   Friend,
  /// Days since last contact at draw time.
  pub days:      u64,
  /// Whether the stamped row reached the store.
  pub persisted: bool,
}

/// Notification text for a drawn friend.
pub fn selection_message(friend: &Friend, days: u64) -> String {
  let mut content = format!(
    "You should get in touch with {}. You haven't spoken to them since {} ({days} days ago). ",
    friend.name, friend.last_contacted
  );
  if !friend.notes.is_empty() {
    content.push_str("Here's what you've got written down for them: ");
    content.push_str(&friend.notes);
  }
  content
}

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct FriendService<S, N> {
  store:    Arc<S>,
  notifier: Arc<N>,
  options:  ServiceOptions,
  snapshot: RwLock<Vec<Friend>>,
  writer:   Mutex<()>,
  rng:      StdMutex<StdRng>,
}

impl<S, N> FriendService<S, N>
where
  S: FriendStore,
  N: Notifier + 'static,
{
  /// Build a service and populate its snapshot from `store`.
  pub async fn load(
    store: Arc<S>,
    notifier: Arc<N>,
    options: ServiceOptions,
  ) -> Result<Self> {
    let friends = store.list_friends().await.map_err(Error::storage)?;
    info!("loaded {} friends", friends.len());
    Ok(Self {
      store,
      notifier,
      options,
      snapshot: RwLock::new(friends),
      writer: Mutex::new(()),
      rng: StdMutex::new(StdRng::from_entropy()),
    })
  }

  /// Replace the random source, e.g. with a seeded one.
  pub fn with_rng(mut self, rng: StdRng) -> Self {
    self.rng = StdMutex::new(rng);
    self
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub async fn list(&self) -> Vec<Friend> { self.snapshot.read().await.clone() }

  pub async fn count(&self) -> usize { self.snapshot.read().await.len() }

  pub async fn get_by_id(&self, id: FriendId) -> Result<Friend> {
    let friends = self.snapshot.read().await;
    friend::find_by_id(&friends, id).cloned().ok_or(Error::NotFound)
  }

  pub async fn get_by_slug(&self, slug: &str) -> Result<Friend> {
    let friends = self.snapshot.read().await;
    friend::find_by_slug(&friends, slug)
      .cloned()
      .ok_or(Error::NotFound)
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Validate and insert a new friend.
  pub async fn add(&self, input: FriendInput, today: NaiveDate) -> Result<Friend> {
    let new = input.into_new_friend(today)?;
    self.guard_future(&new.last_contacted, today)?;

    let _writer = self.writer.lock().await;
    let friend = self.store.insert_friend(new).await.map_err(Error::storage)?;
    info!(id = friend.id, "{} added successfully", friend.name);
    self.refresh().await?;
    Ok(friend)
  }

  /// Merge `patch` over the friend with `id` and write the full row back.
  pub async fn update(
    &self,
    id: FriendId,
    patch: FriendInput,
    today: NaiveDate,
  ) -> Result<Friend> {
    let _writer = self.writer.lock().await;
    let current = self.get_by_id(id).await?;
    let updated = patch.apply_to(&current)?;
    if patch.last_contacted.as_deref().is_some_and(|v| !v.is_empty()) {
      self.guard_future(&updated.last_contacted, today)?;
    }

    let found = self
      .store
      .update_friend(updated.clone())
      .await
      .map_err(Error::storage)?;
    if !found {
      return Err(Error::NotFound);
    }
    info!(id, "friend updated successfully");
    self.refresh().await?;
    Ok(updated)
  }

  /// Delete the friend with `id`, returning the removed record.
  pub async fn remove(&self, id: FriendId) -> Result<Friend> {
    let _writer = self.writer.lock().await;
    let friend = self.get_by_id(id).await?;
    let found = self.store.delete_friend(id).await.map_err(Error::storage)?;
    if !found {
      return Err(Error::NotFound);
    }
    info!(id, "{} deleted successfully", friend.name);
    self.refresh().await?;
    Ok(friend)
  }

  // ── Selection ─────────────────────────────────────────────────────────────

  /// Draw one friend weighted by days since last contact, notify, and stamp
  /// the winner as contacted `today`.
  ///
  /// A failure to persist the stamp is logged and reported through
  /// [`Selection::persisted`]; the drawn friend is still returned.
  pub async fn select_and_advance(&self, today: NaiveDate) -> Result<Selection> {
    let _writer = self.writer.lock().await;
    let friends = self.store.list_friends().await.map_err(Error::storage)?;

    let (friend, days) = {
      let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
      let pick = select::pick_weighted(&friends, today, &mut *rng)?;
      (pick.friend.clone(), pick.days)
    };
    info!(id = friend.id, days, "{} has been chosen", friend.name);

    self.dispatch(selection_message(&friend, days));

    let stamped = friend.contacted_on(today);
    let persisted = match self.store.update_friend(stamped.clone()).await {
      Ok(true) => true,
      Ok(false) => {
        error!(id = friend.id, "chosen friend vanished before it could be updated");
        false
      }
      Err(e) => {
        error!(id = friend.id, "failed to update chosen friend: {e}");
        false
      }
    };

    if let Err(e) = self.refresh().await {
      warn!("friends list left stale after selection: {e}");
    }

    Ok(Selection { friend, stamped, days, persisted })
  }

  /// Friends whose birthday is `today`. One or more matches send a single
  /// batched notification.
  pub async fn birthdays_today(&self, today: NaiveDate) -> Vec<Friend> {
    let matches = birthday::find_birthdays(&self.snapshot.read().await, today);
    match birthday::birthday_message(&matches) {
      Some(message) => {
        info!("{message}");
        self.dispatch(message);
      }
      None => info!("no birthdays today"),
    }
    matches
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  /// Reload the snapshot from the store.
  async fn refresh(&self) -> Result<()> {
    let friends = self.store.list_friends().await.map_err(Error::storage)?;
    *self.snapshot.write().await = friends;
    Ok(())
  }

  fn guard_future(&self, last_contacted: &str, today: NaiveDate) -> Result<()> {
    if self.options.reject_future_dates {
      date::days_since(last_contacted, today)?;
    }
    Ok(())
  }

  /// Hand `message` to the notifier on its own task.
  fn dispatch(&self, message: String) {
    let notifier = Arc::clone(&self.notifier);
    tokio::spawn(async move {
      if let Err(e) = notifier.notify(message).await {
        warn!("failed to send notification: {e}");
      }
    });
  }
}

#[cfg(test)]
mod tests {
  use std::{
    convert::Infallible,
    fmt,
    sync::atomic::{AtomicBool, Ordering},
  };

  use tokio::sync::mpsc;

  use super::*;
  use crate::{
    friend::NewFriend,
    memory::MemoryStore,
  };

  // ── Fixtures ──────────────────────────────────────────────────────────────

  struct Recorder(mpsc::UnboundedSender<String>);

  impl Notifier for Recorder {
    type Error = Infallible;

    async fn notify(&self, message: String) -> Result<(), Infallible> {
      let _ = self.0.send(message);
      Ok(())
    }
  }

  #[derive(Debug)]
  struct Unavailable;

  impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str("database is locked")
    }
  }

  impl std::error::Error for Unavailable {}

  /// A [`MemoryStore`] whose reads or updates can be switched off.
  #[derive(Default)]
  struct FlakyStore {
    inner:        MemoryStore,
    fail_reads:   AtomicBool,
    fail_updates: AtomicBool,
  }

  impl FriendStore for FlakyStore {
    type Error = Unavailable;

    async fn list_friends(&self) -> Result<Vec<Friend>, Unavailable> {
      if self.fail_reads.load(Ordering::SeqCst) {
        return Err(Unavailable);
      }
      self.inner.list_friends().await.map_err(|never| match never {})
    }

    async fn insert_friend(&self, friend: NewFriend) -> Result<Friend, Unavailable> {
      self.inner.insert_friend(friend).await.map_err(|never| match never {})
    }

    async fn update_friend(&self, friend: Friend) -> Result<bool, Unavailable> {
      if self.fail_updates.load(Ordering::SeqCst) {
        return Err(Unavailable);
      }
      self.inner.update_friend(friend).await.map_err(|never| match never {})
    }

    async fn delete_friend(&self, id: FriendId) -> Result<bool, Unavailable> {
      self.inner.delete_friend(id).await.map_err(|never| match never {})
    }
  }

  fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2023, 12, 23).unwrap() }

  fn input(name: &str, last_contacted: &str, notes: &str) -> FriendInput {
    FriendInput {
      name:           Some(name.into()),
      last_contacted: Some(last_contacted.into()),
      birthday:       Some("23/02/1996".into()),
      notes:          Some(notes.into()),
    }
  }

  async fn service_with<S: FriendStore>(
    store: S,
    options: ServiceOptions,
  ) -> (FriendService<S, Recorder>, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let service = FriendService::load(Arc::new(store), Arc::new(Recorder(tx)), options)
      .await
      .unwrap()
      .with_rng(StdRng::seed_from_u64(42));
    (service, rx)
  }

  async fn service() -> (FriendService<MemoryStore, Recorder>, mpsc::UnboundedReceiver<String>) {
    service_with(MemoryStore::new(), ServiceOptions::default()).await
  }

  // ── CRUD ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn add_refreshes_snapshot() {
    let (svc, _rx) = service().await;
    let added = svc
      .add(input("John Wick", "2023-06-06", "Nice guy"), today())
      .await
      .unwrap();
    assert_eq!(added.id, 1);
    assert_eq!(added.last_contacted, "06/06/2023");
    assert_eq!(svc.count().await, 1);
    assert_eq!(svc.get_by_slug("john-wick").await.unwrap(), added);
  }

  #[tokio::test]
  async fn add_rejects_blank_name_without_writing() {
    let (svc, _rx) = service().await;
    let err = svc.add(input("", "2023-06-06", ""), today()).await.unwrap_err();
    assert!(matches!(err, Error::BlankName));
    assert_eq!(svc.count().await, 0);
  }

  #[tokio::test]
  async fn future_dates_are_stored_unless_rejected() {
    let (lenient, _rx) = service().await;
    lenient
      .add(input("Doctor Who", "25/12/2070", ""), today())
      .await
      .unwrap();

    let strict_opts = ServiceOptions { reject_future_dates: true };
    let (strict, _rx) = service_with(MemoryStore::new(), strict_opts).await;
    let err = strict
      .add(input("Doctor Who", "25/12/2070", ""), today())
      .await
      .unwrap_err();
    assert!(matches!(err, Error::DateInFuture(_)));
    assert_eq!(strict.count().await, 0);
  }

  #[tokio::test]
  async fn strict_update_rejects_future_date_and_keeps_row() {
    let strict_opts = ServiceOptions { reject_future_dates: true };
    let (svc, _rx) = service_with(MemoryStore::new(), strict_opts).await;
    let john = svc
      .add(input("John Wick", "06/06/2023", "Nice guy"), today())
      .await
      .unwrap();

    let patch = FriendInput {
      name:           Some("Doctor Who".into()),
      last_contacted: Some("25/12/2070".into()),
      ..Default::default()
    };
    let err = svc.update(john.id, patch, today()).await.unwrap_err();
    assert!(matches!(err, Error::DateInFuture(_)));
    assert_eq!(svc.get_by_id(john.id).await.unwrap(), john);
    assert_eq!(svc.store.list_friends().await.unwrap(), vec![john]);
  }

  #[tokio::test]
  async fn update_applies_partial_patch() {
    let (svc, _rx) = service().await;
    let john = svc
      .add(input("John Wick", "06/06/2023", "Nice guy"), today())
      .await
      .unwrap();

    let patch = FriendInput {
      notes: Some("Bro is Chuck Norris".into()),
      ..Default::default()
    };
    svc.update(john.id, patch, today()).await.unwrap();

    let stored = svc.get_by_id(john.id).await.unwrap();
    assert_eq!(stored.name, "John Wick");
    assert_eq!(stored.last_contacted, "06/06/2023");
    assert_eq!(stored.notes, "Bro is Chuck Norris");
  }

  #[tokio::test]
  async fn update_with_bad_date_changes_nothing() {
    let (svc, _rx) = service().await;
    let john = svc
      .add(input("John Wick", "06/06/2023", "Nice guy"), today())
      .await
      .unwrap();

    let patch = FriendInput {
      name:           Some("Master Chief".into()),
      last_contacted: Some("15".into()),
      ..Default::default()
    };
    let err = svc.update(john.id, patch, today()).await.unwrap_err();
    assert!(matches!(err, Error::InvalidDateFormat { .. }));
    assert_eq!(svc.get_by_id(john.id).await.unwrap(), john);
  }

  #[tokio::test]
  async fn update_and_remove_missing_friend_is_not_found() {
    let (svc, _rx) = service().await;
    let err = svc.update(7, FriendInput::default(), today()).await.unwrap_err();
    assert!(matches!(err, Error::NotFound));
    assert!(matches!(svc.remove(7).await.unwrap_err(), Error::NotFound));
  }

  #[tokio::test]
  async fn remove_returns_deleted_friend() {
    let (svc, _rx) = service().await;
    let john = svc
      .add(input("John Wick", "06/06/2023", ""), today())
      .await
      .unwrap();
    let removed = svc.remove(john.id).await.unwrap();
    assert_eq!(removed.name, "John Wick");
    assert_eq!(svc.count().await, 0);
  }

  // ── Selection ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn selection_stamps_winner_and_notifies() {
    let (svc, mut rx) = service().await;
    svc
      .add(input("John Wick", "06/06/2023", "Nice guy"), today())
      .await
      .unwrap();

    let selection = svc.select_and_advance(today()).await.unwrap();
    assert_eq!(selection.friend.last_contacted, "06/06/2023");
    assert_eq!(selection.stamped.last_contacted, "23/12/2023");
    assert_ne!(selection.friend.last_contacted, selection.stamped.last_contacted);
    assert_eq!(selection.days, 200);
    assert!(selection.persisted);

    let stored = svc.get_by_id(selection.friend.id).await.unwrap();
    assert_eq!(stored.last_contacted, "23/12/2023");

    let message = rx.recv().await.unwrap();
    assert_eq!(
      message,
      "You should get in touch with John Wick. You haven't spoken to them since \
       06/06/2023 (200 days ago). Here's what you've got written down for them: Nice guy"
    );
  }

  #[tokio::test]
  async fn selection_without_eligible_friends_fails() {
    let (svc, _rx) = service().await;
    assert!(matches!(
      svc.select_and_advance(today()).await.unwrap_err(),
      Error::NoEligibleContact
    ));

    svc.add(input("Fresh", "23/12/2023", ""), today()).await.unwrap();
    assert!(matches!(
      svc.select_and_advance(today()).await.unwrap_err(),
      Error::NoEligibleContact
    ));
  }

  #[tokio::test]
  async fn selection_read_failure_is_storage_error() {
    let (svc, _rx) = service_with(FlakyStore::default(), ServiceOptions::default()).await;
    svc.store.fail_reads.store(true, Ordering::SeqCst);
    assert!(matches!(
      svc.select_and_advance(today()).await.unwrap_err(),
      Error::Storage(_)
    ));
  }

  #[tokio::test]
  async fn selection_survives_persistence_failure() {
    let (svc, _rx) = service_with(FlakyStore::default(), ServiceOptions::default()).await;
    svc
      .add(input("John Wick", "06/06/2023", ""), today())
      .await
      .unwrap();
    svc.store.fail_updates.store(true, Ordering::SeqCst);

    let selection = svc.select_and_advance(today()).await.unwrap();
    assert_eq!(selection.friend.name, "John Wick");
    assert!(!selection.persisted);
    assert_eq!(svc.get_by_id(1).await.unwrap().last_contacted, "06/06/2023");
  }

  #[tokio::test]
  async fn concurrent_selections_never_pick_the_same_friend_twice() {
    let (svc, _rx) = service().await;
    for i in 0..5 {
      svc
        .add(input(&format!("Friend {i}"), "01/01/2023", ""), today())
        .await
        .unwrap();
    }
    let svc = Arc::new(svc);

    let handles: Vec<_> = (0..5)
      .map(|_| {
        let svc = Arc::clone(&svc);
        tokio::spawn(async move { svc.select_and_advance(today()).await })
      })
      .collect();

    let mut winners = Vec::new();
    for handle in handles {
      winners.push(handle.await.unwrap().unwrap().friend.id);
    }
    winners.sort_unstable();
    assert_eq!(winners, vec![1, 2, 3, 4, 5]);

    // Everyone is now stamped today.
    assert!(matches!(
      svc.select_and_advance(today()).await.unwrap_err(),
      Error::NoEligibleContact
    ));
  }

  // ── Birthdays ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn birthday_scan_notifies_once() {
    let (svc, mut rx) = service().await;
    svc.add(input("John Wick", "06/06/2023", ""), today()).await.unwrap();
    svc.add(input("Jack Reacher", "06/06/2023", ""), today()).await.unwrap();

    let birthday = NaiveDate::from_ymd_opt(2024, 2, 23).unwrap();
    let found = svc.birthdays_today(birthday).await;
    assert_eq!(found.len(), 2);

    let message = rx.recv().await.unwrap();
    assert!(message.starts_with("It's John Wick and Jack Reacher's birthdays today!"));
  }

  #[tokio::test]
  async fn birthday_scan_without_matches_stays_quiet() {
    let (svc, mut rx) = service().await;
    svc.add(input("John Wick", "06/06/2023", ""), today()).await.unwrap();

    let found = svc.birthdays_today(today()).await;
    assert!(found.is_empty());
    drop(svc);
    assert!(rx.recv().await.is_none());
  }
}
