//! Error types for `howarethey-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{field} must be in dd/mm/yyyy or yyyy-mm-dd format. {value} does not match")]
  InvalidDateFormat { field: &'static str, value: String },

  #[error("last contacted date {0} is in the future. It must be in the past")]
  DateInFuture(String),

  #[error("name must not be blank")]
  BlankName,

  #[error("no friend is due to be contacted")]
  NoEligibleContact,

  #[error("friend not found")]
  NotFound,

  #[error("storage unavailable: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error as [`Error::Storage`].
  pub fn storage<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Storage(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
