//! Background jobs: the periodic selection and the daily birthday scan.
//!
//! Each job is its own tokio task that sleeps until the schedule's next fire
//! time, runs once, and goes back to sleep. A failed run is logged and the
//! job carries on; nothing is retried.

use std::{future::Future, sync::Arc};

use chrono::Local;
use howarethey_core::{
  date, notify::Notifier, service::FriendService, store::FriendStore,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{Result, ServerConfig, schedule::Schedule};

/// Run `job` every time `schedule` fires, forever.
pub fn spawn_job<F, Fut>(name: &'static str, schedule: Schedule, mut job: F) -> JoinHandle<()>
where
  F: FnMut() -> Fut + Send + 'static,
  Fut: Future<Output = ()> + Send + 'static,
{
  tokio::spawn(async move {
    info!(job = name, "scheduled {schedule}");
    loop {
      let now = Local::now();
      let next = schedule.next_after(&now);
      debug!(job = name, "next run at {next}");
      tokio::time::sleep((next - now).to_std().unwrap_or_default()).await;
      job().await;
    }
  })
}

/// Draw a friend on `schedule`, exactly as `GET /friends/random` does.
pub fn spawn_selection<S, N>(
  service: Arc<FriendService<S, N>>,
  schedule: Schedule,
) -> JoinHandle<()>
where
  S: FriendStore + 'static,
  N: Notifier + 'static,
{
  spawn_job("selection", schedule, move || {
    let service = Arc::clone(&service);
    async move {
      match service.select_and_advance(date::today()).await {
        Ok(selection) if selection.persisted => {
          info!(id = selection.friend.id, "scheduled selection picked {}", selection.friend.name);
        }
        Ok(selection) => {
          warn!(id = selection.friend.id, "scheduled selection picked {} but could not save it", selection.friend.name);
        }
        Err(e) => warn!("skipping scheduled selection: {e}"),
      }
    }
  })
}

/// Scan for birthdays on `schedule`; matches are notified by the service.
pub fn spawn_birthday_check<S, N>(
  service: Arc<FriendService<S, N>>,
  schedule: Schedule,
) -> JoinHandle<()>
where
  S: FriendStore + 'static,
  N: Notifier + 'static,
{
  spawn_job("birthdays", schedule, move || {
    let service = Arc::clone(&service);
    async move {
      let found = service.birthdays_today(date::today()).await;
      debug!("birthday check found {} friends", found.len());
    }
  })
}

/// Start whichever jobs `config` enables. Schedules are validated before any
/// job is spawned.
pub fn start<S, N>(
  config: &ServerConfig,
  service: &Arc<FriendService<S, N>>,
) -> Result<Vec<JoinHandle<()>>>
where
  S: FriendStore + 'static,
  N: Notifier + 'static,
{
  let selection = config
    .selection_enabled
    .then(|| config.selection_schedule())
    .transpose()?;
  let birthdays = config
    .birthday_check_enabled
    .then(|| config.birthday_schedule())
    .transpose()?;

  let mut jobs = Vec::new();
  match selection {
    Some(schedule) => jobs.push(spawn_selection(Arc::clone(service), schedule)),
    None => info!("periodic selection disabled"),
  }
  match birthdays {
    Some(schedule) => jobs.push(spawn_birthday_check(Arc::clone(service), schedule)),
    None => info!("birthday check disabled"),
  }
  Ok(jobs)
}
