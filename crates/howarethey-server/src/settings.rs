//! [`ServerConfig`] — file and environment configuration.

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use config::{Config, ConfigBuilder, Environment, File, Map, builder::DefaultState};
use howarethey_core::service::ServiceOptions;
use howarethey_notify::NotificationService;
use serde::Deserialize;

use crate::{Error, Result, schedule::Schedule};

/// Prefix for environment overrides, e.g. `HOWARETHEY_PORT=9000`.
pub const ENV_PREFIX: &str = "HOWARETHEY";

/// Unprefixed variables still honoured from older deployments. The
/// `HOWARETHEY_*` form of the same key wins when both are set.
pub const LEGACY_ENV_KEYS: [&str; 3] = ["NOTIFICATION_SERVICE", "WEBHOOK_URL", "LOG_LEVEL"];

/// Top-level configuration. Every key is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                   String,
  pub port:                   u16,
  pub database_path:          PathBuf,
  pub log_level:              String,
  pub selection_enabled:      bool,
  pub selection_schedule:     String,
  pub birthday_check_enabled: bool,
  pub birthday_check_hour:    u32,
  pub notification_service:   Option<NotificationService>,
  pub webhook_url:            Option<String>,
  pub reject_future_dates:    bool,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                   "0.0.0.0".to_string(),
      port:                   8080,
      database_path:          PathBuf::from("sql/friends.db"),
      log_level:              "info".to_string(),
      selection_enabled:      true,
      selection_schedule:     "@weekly".to_string(),
      birthday_check_enabled: true,
      birthday_check_hour:    8,
      notification_service:   None,
      webhook_url:            None,
      reject_future_dates:    false,
    }
  }
}

impl ServerConfig {
  /// Read `path` if it exists, then layer the process environment on top.
  pub fn load(path: &Path) -> Result<Self> { Self::load_with_env(path, std::env::vars()) }

  /// Read `path` if it exists, then layer `vars`: the legacy unprefixed keys
  /// first, `HOWARETHEY_*` last.
  pub fn load_with_env(
    path: &Path,
    vars: impl IntoIterator<Item = (String, String)>,
  ) -> Result<Self> {
    let vars: Map<String, String> = vars.into_iter().collect();
    let legacy: Map<String, String> = vars
      .iter()
      .filter(|(key, _)| LEGACY_ENV_KEYS.contains(&key.as_str()))
      .map(|(key, value)| (key.clone(), value.clone()))
      .collect();

    Self::from_builder(
      Config::builder()
        .add_source(File::from(path).required(false))
        .add_source(Environment::default().try_parsing(true).source(Some(legacy)))
        .add_source(
          Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .source(Some(vars)),
        ),
    )
  }

  pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
    Ok(builder.build()?.try_deserialize()?)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// Default tracing directive; `RUST_LOG` still wins when set.
  pub fn log_directive(&self) -> String { self.log_level.trim().to_lowercase() }

  pub fn service_options(&self) -> ServiceOptions {
    ServiceOptions {
      reject_future_dates: self.reject_future_dates,
    }
  }

  pub fn selection_schedule(&self) -> Result<Schedule> {
    self.selection_schedule.parse()
  }

  /// Daily at `birthday_check_hour:00` local time.
  pub fn birthday_schedule(&self) -> Result<Schedule> {
    let at = NaiveTime::from_hms_opt(self.birthday_check_hour, 0, 0)
      .ok_or(Error::InvalidHour(self.birthday_check_hour))?;
    Ok(Schedule::Daily { at })
  }
}
