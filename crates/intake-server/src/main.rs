//! intake-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! sheet store, and serves the intake endpoints over HTTP.
//!
//! # Preparing the sheet
//!
//! To create the collection and its header row ahead of the first
//! submission:
//!
//! ```
//! cargo run -p intake-server -- --init-sheet
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use clap::Parser;
use intake_mail::AnyMailer;
use intake_server::{AppState, ServerConfig};
use intake_store_sqlite::SqliteSheetStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Contact form intake server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Create the sheet and its header row, then exit.
  #[arg(long)]
  init_sheet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("INTAKE").separator("__"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteSheetStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let mailer = AnyMailer::from_settings(
    server_cfg.mail.relay_url.as_deref(),
    server_cfg.mail.api_token.clone(),
    Duration::from_secs(server_cfg.mail.timeout_secs),
  )
  .context("failed to build mail transport")?;
  if matches!(mailer, AnyMailer::Log(_)) {
    tracing::warn!("no mail relay configured; notifications will only be logged");
  }

  let state = AppState::new(
    Arc::new(store),
    Arc::new(mailer),
    server_cfg.intake_settings(),
  );

  if cli.init_sheet {
    let header = state
      .service
      .init_sheet()
      .await
      .context("failed to initialise sheet")?;
    println!("sheet {:?}: header {header:?}", server_cfg.collection);
    return Ok(());
  }

  let app = intake_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!(
    collection = %server_cfg.collection,
    policy = ?server_cfg.policy,
    layout = ?server_cfg.layout,
    "Listening on http://{address}"
  );
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` in the store path to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
