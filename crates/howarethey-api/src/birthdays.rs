//! `GET /birthdays`: today's birthday scan.

use std::sync::Arc;

use axum::{Json, extract::State};
use howarethey_core::{
  date, friend::Friend, notify::Notifier, service::FriendService, store::FriendStore,
};

/// Friends whose birthday falls on today's month and day. Any match also
/// triggers the batched birthday notification.
pub async fn today<S, N>(
  State(service): State<Arc<FriendService<S, N>>>,
) -> Json<Vec<Friend>>
where
  S: FriendStore,
  N: Notifier + 'static,
{
  Json(service.birthdays_today(date::today()).await)
}
