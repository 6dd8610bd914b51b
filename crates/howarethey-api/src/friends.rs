//! Handlers for `/friends` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/friends` | Every friend, ordered by id |
//! | `POST`   | `/friends` | 201; validation failures are 500 |
//! | `GET`    | `/friends/random` | Weighted draw; stamps the winner |
//! | `GET`    | `/friends/count` | Bare integer |
//! | `GET`    | `/friends/id/{id}` | 404 if not found |
//! | `GET`    | `/friends/name/{slug}` | First match by slug; 404 if none |
//! | `PUT`    | `/friends/{id}` | Partial update; unknown id is 500 |
//! | `DELETE` | `/friends/{id}` | 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use howarethey_core::{
  Error as CoreError, date,
  friend::{Friend, FriendId, FriendInput},
  notify::Notifier,
  service::FriendService,
  store::FriendStore,
};
use serde_json::json;

use crate::error::ApiError;

type Service<S, N> = State<Arc<FriendService<S, N>>>;

/// Ids arrive as raw path text so that a non-numeric id reads as a miss
/// rather than an extractor rejection.
fn parse_id(raw: &str) -> Option<FriendId> { raw.parse().ok() }

// ─── Reads ───────────────────────────────────────────────────────────────────

/// `GET /friends`
pub async fn list<S, N>(State(service): Service<S, N>) -> Json<Vec<Friend>>
where
  S: FriendStore,
  N: Notifier + 'static,
{
  Json(service.list().await)
}

/// `GET /friends/count`
pub async fn count<S, N>(State(service): Service<S, N>) -> Json<usize>
where
  S: FriendStore,
  N: Notifier + 'static,
{
  Json(service.count().await)
}

/// `GET /friends/id/{id}`
pub async fn get_by_id<S, N>(
  State(service): Service<S, N>,
  Path(raw): Path<String>,
) -> Result<Json<Friend>, ApiError>
where
  S: FriendStore,
  N: Notifier + 'static,
{
  let id = parse_id(&raw).ok_or_else(|| ApiError::from(CoreError::NotFound))?;
  Ok(Json(service.get_by_id(id).await?))
}

/// `GET /friends/name/{slug}`
pub async fn get_by_name<S, N>(
  State(service): Service<S, N>,
  Path(slug): Path<String>,
) -> Result<Json<Friend>, ApiError>
where
  S: FriendStore,
  N: Notifier + 'static,
{
  Ok(Json(service.get_by_slug(&slug).await?))
}

// ─── Selection ───────────────────────────────────────────────────────────────

/// `GET /friends/random`. Responds with the friend as drawn, before the stamp.
pub async fn random<S, N>(State(service): Service<S, N>) -> Result<Json<Friend>, ApiError>
where
  S: FriendStore,
  N: Notifier + 'static,
{
  let selection = service.select_and_advance(date::today()).await?;
  Ok(Json(selection.friend))
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// `POST /friends`
pub async fn create<S, N>(
  State(service): Service<S, N>,
  body: Result<Json<FriendInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FriendStore,
  N: Notifier + 'static,
{
  let Json(input) = body?;
  let friend = service.add(input, date::today()).await?;
  Ok((
    StatusCode::CREATED,
    Json(json!({ "message": format!("{} added successfully", friend.name) })),
  ))
}

/// `PUT /friends/{id}`. Only non-empty fields overwrite.
pub async fn update<S, N>(
  State(service): Service<S, N>,
  Path(raw): Path<String>,
  body: Result<Json<FriendInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FriendStore,
  N: Notifier + 'static,
{
  let not_found = || ApiError::Rejected(CoreError::NotFound.to_string());
  let id = parse_id(&raw).ok_or_else(not_found)?;
  let Json(patch) = body?;

  match service.update(id, patch, date::today()).await {
    Ok(_) => Ok(Json(json!({ "message": format!("{id} updated successfully") }))),
    Err(CoreError::NotFound) => Err(not_found()),
    Err(e) => Err(e.into()),
  }
}

/// `DELETE /friends/{id}`
pub async fn remove<S, N>(
  State(service): Service<S, N>,
  Path(raw): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FriendStore,
  N: Notifier + 'static,
{
  let id = parse_id(&raw).ok_or_else(|| ApiError::from(CoreError::NotFound))?;
  let friend = service.remove(id).await?;
  Ok(Json(json!({
    "message": format!("{} removed successfully", friend.name),
    "id": friend.id,
  })))
}
