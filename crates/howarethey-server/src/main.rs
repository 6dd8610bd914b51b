//! howarethey server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus any
//! `HOWARETHEY_*` environment overrides, opens the SQLite database, starts
//! the background jobs, and serves the JSON API over HTTP.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use howarethey_core::service::FriendService;
use howarethey_notify::WebhookNotifier;
use howarethey_server::{ServerConfig, jobs};
use howarethey_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{EnvFilter, filter::Directive};

#[derive(Parser)]
#[command(author, version, about = "Reminds you to keep in touch with your friends")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Port to listen on; overrides the configuration file.
  #[arg(short, long, env = "PORT")]
  port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  // Load configuration.
  let mut server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;
  if let Some(port) = cli.port {
    server_cfg.port = port;
  }

  // Initialise tracing. `RUST_LOG` takes precedence over `log_level`.
  let directive = server_cfg
    .log_directive()
    .parse::<Directive>()
    .with_context(|| format!("invalid log_level {:?}", server_cfg.log_level))?;
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(directive)
        .from_env_lossy(),
    )
    .init();

  // Open SQLite store.
  let store = SqliteStore::open(&server_cfg.database_path)
    .await
    .with_context(|| format!("failed to open database at {:?}", server_cfg.database_path))?;

  let notifier = WebhookNotifier::new(
    server_cfg.notification_service,
    server_cfg.webhook_url.clone(),
  )
  .context("failed to build notifier")?;
  if !notifier.is_enabled() {
    tracing::info!("notifications disabled");
  }

  let service = Arc::new(
    FriendService::load(
      Arc::new(store),
      Arc::new(notifier),
      server_cfg.service_options(),
    )
    .await
    .context("failed to load friends")?,
  );

  let background = jobs::start(&server_cfg, &service).context("failed to start scheduler")?;

  let app = howarethey_api::api_router(service)
    .layer(CorsLayer::permissive())
    .layer(TraceLayer::new_for_http());
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  for job in background {
    job.abort();
  }
  tracing::info!("shut down");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!("failed to listen for ctrl-c: {e}");
    std::future::pending::<()>().await;
  }
  tracing::info!("ctrl-c received, shutting down");
}
