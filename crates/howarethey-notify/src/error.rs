//! Error type for `howarethey-notify`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to build HTTP client: {0}")]
  Client(#[source] reqwest::Error),

  #[error("webhook request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("webhook responded with {0}")]
  Status(reqwest::StatusCode),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
