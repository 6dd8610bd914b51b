//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use howarethey_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler. Always rendered as
/// `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// A write the service refused. Reported as a server error for
  /// compatibility with existing clients.
  #[error("rejected: {0}")]
  Rejected(String),

  #[error("store error: {0}")]
  Store(#[source] CoreError),
}

impl From<CoreError> for ApiError {
  fn from(err: CoreError) -> Self {
    match err {
      CoreError::NotFound | CoreError::NoEligibleContact => {
        ApiError::NotFound(err.to_string())
      }
      CoreError::InvalidDateFormat { .. }
      | CoreError::DateInFuture(_)
      | CoreError::BlankName => ApiError::Rejected(err.to_string()),
      CoreError::Storage(_) => ApiError::Store(err),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Rejected(m) => (StatusCode::INTERNAL_SERVER_ERROR, m.clone()),
      ApiError::Store(e) => {
        tracing::error!("{e}");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
