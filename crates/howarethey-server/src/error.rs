//! Error type for `howarethey-server`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(
    "unrecognised schedule expression {0:?}; expected @hourly, @daily, @midnight, @weekly, \
     @every <N><s|m|h|d>, daily HH:MM, weekly <mon..sun> HH:MM, or a five-field cron expression"
  )]
  UnknownSchedule(String),

  #[error("invalid {field} field in cron expression {value:?}")]
  InvalidCronField { field: &'static str, value: String },

  #[error("cron expression {0:?} never fires")]
  NeverFires(String),

  #[error("invalid time of day {0:?}, expected HH:MM")]
  InvalidTime(String),

  #[error("invalid interval {0:?}, expected a positive count and unit such as 30m, 12h or 7d")]
  InvalidInterval(String),

  #[error("birthday_check_hour must be between 0 and 23, got {0}")]
  InvalidHour(u32),

  #[error("configuration error: {0}")]
  Config(#[from] config::ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
