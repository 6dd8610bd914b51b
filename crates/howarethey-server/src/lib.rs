//! HowAreThey server: configuration, schedules, and background jobs.
//!
//! The `howarethey` binary wires these together with the SQLite store, the
//! webhook notifier, and the API router.

pub mod cron;
pub mod error;
pub mod jobs;
pub mod schedule;
pub mod settings;

pub use error::{Error, Result};
pub use schedule::Schedule;
pub use settings::ServerConfig;
