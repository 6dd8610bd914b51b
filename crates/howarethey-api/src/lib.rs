//! JSON REST API for HowAreThey.
//!
//! Exposes an axum [`Router`] over a shared [`FriendService`]. Binding,
//! CORS, and request tracing are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = howarethey_api::api_router(service.clone())
//!   .layer(TraceLayer::new_for_http());
//! ```

pub mod birthdays;
pub mod error;
pub mod friends;

use std::sync::Arc;

use axum::{Router, routing::get};
use howarethey_core::{notify::Notifier, service::FriendService, store::FriendStore};

pub use error::ApiError;

/// Build the API router for `service`.
///
/// The returned `Router<()>` can be merged or nested into any parent router
/// regardless of its own state type.
pub fn api_router<S, N>(service: Arc<FriendService<S, N>>) -> Router<()>
where
  S: FriendStore + 'static,
  N: Notifier + 'static,
{
  Router::new()
    .route("/friends", get(friends::list::<S, N>).post(friends::create::<S, N>))
    .route("/friends/random", get(friends::random::<S, N>))
    .route("/friends/count", get(friends::count::<S, N>))
    .route("/friends/id/{id}", get(friends::get_by_id::<S, N>))
    .route("/friends/name/{slug}", get(friends::get_by_name::<S, N>))
    .route(
      "/friends/{id}",
      axum::routing::put(friends::update::<S, N>).delete(friends::remove::<S, N>),
    )
    .route("/birthdays", get(birthdays::today::<S, N>))
    .with_state(service)
}
