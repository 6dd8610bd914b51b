//! Outbound webhook delivery for HowAreThey notifications.
//!
//! [`WebhookNotifier`] implements the core [`Notifier`] trait against either a
//! Discord-compatible webhook or an ntfy topic.
//!
//! [`Notifier`]: howarethey_core::notify::Notifier

pub mod error;
pub mod webhook;

pub use error::{Error, Result};
pub use webhook::{NotificationService, WebhookNotifier};
