//! [`WebhookNotifier`] — Discord and ntfy delivery over `reqwest`.

use std::{fmt, time::Duration};

use howarethey_core::notify::Notifier;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The display name Discord shows next to delivered messages.
pub const DISCORD_USERNAME: &str = "HowAreThey";

const TIMEOUT: Duration = Duration::from_secs(10);

// ─── Service selector ────────────────────────────────────────────────────────

/// Which kind of endpoint `webhook_url` points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationService {
  #[serde(alias = "discord")]
  Discord,
  #[serde(alias = "ntfy")]
  Ntfy,
  #[serde(alias = "telegram")]
  Telegram,
}

impl fmt::Display for NotificationService {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Discord => "DISCORD",
      Self::Ntfy => "NTFY",
      Self::Telegram => "TELEGRAM",
    })
  }
}

#[derive(Serialize)]
struct DiscordPayload<'a> {
  content:  &'a str,
  username: &'a str,
}

#[derive(Debug, Clone)]
enum Target {
  Disabled,
  Discord(String),
  Ntfy(String),
  Unsupported(NotificationService),
}

// ─── Notifier ────────────────────────────────────────────────────────────────

/// Posts each message to the configured webhook.
///
/// Built from the two optional settings; with either one missing every
/// message is dropped at debug level.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
  client: Client,
  target: Target,
}

impl WebhookNotifier {
  pub fn new(
    service: Option<NotificationService>,
    webhook_url: Option<String>,
  ) -> Result<Self> {
    let client = Client::builder()
      .timeout(TIMEOUT)
      .build()
      .map_err(Error::Client)?;

    let url = webhook_url.filter(|u| !u.trim().is_empty());
    let target = match (service, url) {
      (Some(NotificationService::Discord), Some(url)) => Target::Discord(url),
      (Some(NotificationService::Ntfy), Some(url)) => Target::Ntfy(url),
      (Some(other @ NotificationService::Telegram), Some(_)) => {
        tracing::warn!("{other} notifications are not supported; messages will be dropped");
        Target::Unsupported(other)
      }
      (Some(service), None) => {
        tracing::warn!("{service} selected but no webhook URL configured");
        Target::Disabled
      }
      (None, _) => Target::Disabled,
    };

    Ok(Self { client, target })
  }

  /// A notifier that drops every message.
  pub fn disabled() -> Result<Self> { Self::new(None, None) }

  /// Whether messages will actually leave the process.
  pub fn is_enabled(&self) -> bool {
    matches!(self.target, Target::Discord(_) | Target::Ntfy(_))
  }

  async fn post_discord(&self, url: &str, message: &str) -> Result<()> {
    let payload = DiscordPayload {
      content:  message,
      username: DISCORD_USERNAME,
    };
    let resp = self.client.post(url).json(&payload).send().await?;
    check_status(resp.status())
  }

  async fn post_ntfy(&self, url: &str, message: String) -> Result<()> {
    let resp = self
      .client
      .post(url)
      .header(reqwest::header::CONTENT_TYPE, "text/plain")
      .body(message)
      .send()
      .await?;
    check_status(resp.status())
  }
}

fn check_status(status: reqwest::StatusCode) -> Result<()> {
  if status.is_success() {
    Ok(())
  } else {
    Err(Error::Status(status))
  }
}

impl Notifier for WebhookNotifier {
  type Error = Error;

  async fn notify(&self, message: String) -> Result<()> {
    match &self.target {
      Target::Disabled => {
        tracing::debug!("no notification service set");
        Ok(())
      }
      Target::Unsupported(service) => {
        tracing::debug!("dropping message for unsupported {service} target");
        Ok(())
      }
      Target::Discord(url) => {
        self.post_discord(url, &message).await?;
        tracing::info!("sent discord notification");
        Ok(())
      }
      Target::Ntfy(url) => {
        self.post_ntfy(url, message).await?;
        tracing::info!("sent ntfy notification");
        Ok(())
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
  };
  use tokio::sync::Mutex;

  use super::*;

  #[derive(Default)]
  struct Captured {
    content_type: Option<String>,
    body:         Vec<u8>,
  }

  /// Bind a capture server on an ephemeral port that answers with `status`.
  async fn capture_server(status: StatusCode) -> (String, Arc<Mutex<Vec<Captured>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
      .route(
        "/hook",
        post(
          move |State(seen): State<Arc<Mutex<Vec<Captured>>>>,
                headers: HeaderMap,
                body: Bytes| async move {
            seen.lock().await.push(Captured {
              content_type: headers
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned),
              body:         body.to_vec(),
            });
            status
          },
        ),
      )
      .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/hook"), seen)
  }

  #[tokio::test]
  async fn discord_posts_json_with_username() {
    let (url, seen) = capture_server(StatusCode::NO_CONTENT).await;
    let notifier =
      WebhookNotifier::new(Some(NotificationService::Discord), Some(url)).unwrap();

    notifier.notify("hello there".into()).await.unwrap();

    let seen = seen.lock().await;
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].content_type.as_deref(), Some("application/json"));
    let body: serde_json::Value = serde_json::from_slice(&seen[0].body).unwrap();
    assert_eq!(body["content"], "hello there");
    assert_eq!(body["username"], "HowAreThey");
  }

  #[tokio::test]
  async fn ntfy_posts_plain_text() {
    let (url, seen) = capture_server(StatusCode::OK).await;
    let notifier =
      WebhookNotifier::new(Some(NotificationService::Ntfy), Some(url)).unwrap();

    notifier.notify("ring ring".into()).await.unwrap();

    let seen = seen.lock().await;
    assert_eq!(seen[0].content_type.as_deref(), Some("text/plain"));
    assert_eq!(seen[0].body, b"ring ring");
  }

  #[tokio::test]
  async fn error_status_is_reported() {
    let (url, _) = capture_server(StatusCode::INTERNAL_SERVER_ERROR).await;
    let notifier =
      WebhookNotifier::new(Some(NotificationService::Ntfy), Some(url)).unwrap();

    let err = notifier.notify("x".into()).await.unwrap_err();
    assert!(matches!(err, Error::Status(s) if s == StatusCode::INTERNAL_SERVER_ERROR));
  }

  #[tokio::test]
  async fn unreachable_target_is_an_error() {
    let notifier = WebhookNotifier::new(
      Some(NotificationService::Discord),
      Some("http://127.0.0.1:1/hook".into()),
    )
    .unwrap();
    assert!(matches!(
      notifier.notify("x".into()).await,
      Err(Error::Request(_))
    ));
  }

  #[tokio::test]
  async fn missing_pieces_disable_delivery() {
    for notifier in [
      WebhookNotifier::disabled().unwrap(),
      WebhookNotifier::new(Some(NotificationService::Discord), None).unwrap(),
      WebhookNotifier::new(Some(NotificationService::Ntfy), Some("  ".into())).unwrap(),
      WebhookNotifier::new(None, Some("http://127.0.0.1:1/hook".into())).unwrap(),
    ] {
      assert!(!notifier.is_enabled());
      notifier.notify("dropped".into()).await.unwrap();
    }
  }

  #[tokio::test]
  async fn telegram_is_accepted_but_inert() {
    let notifier = WebhookNotifier::new(
      Some(NotificationService::Telegram),
      Some("http://127.0.0.1:1/hook".into()),
    )
    .unwrap();
    assert!(!notifier.is_enabled());
    notifier.notify("dropped".into()).await.unwrap();
  }

  #[test]
  fn service_names_deserialize_in_either_case() {
    let upper: NotificationService = serde_json::from_str("\"DISCORD\"").unwrap();
    let lower: NotificationService = serde_json::from_str("\"ntfy\"").unwrap();
    assert_eq!(upper, NotificationService::Discord);
    assert_eq!(lower, NotificationService::Ntfy);
    assert!(serde_json::from_str::<NotificationService>("\"SLACK\"").is_err());
  }
}
