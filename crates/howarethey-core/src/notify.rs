//! The outbound notification seam.

use std::future::Future;

/// Delivers a human-readable message somewhere the user will see it.
///
/// Callers treat delivery as fire-and-forget: a failed or slow notification
/// is logged and never fails the operation that triggered it.
pub trait Notifier: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn notify(
    &self,
    message: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
