//! Camley server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite store, makes sure the bootstrap administrator exists, and serves
//! the JSON API under `/api`.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `bootstrap_admin.password_hash`:
//!
//! ```
//! cargo run -p camley-server -- --hash-password
//! ```

mod config;
mod push;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::Router;
use camley_api::{AppState, auth::hash_password};
use camley_core::{
  account::{NewAccount, Role},
  store::AccountStore,
};
use camley_store_sqlite::SqliteStore;
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::{config::ServerConfig, push::WebhookPush};

#[derive(Parser)]
#[command(author, version, about = "Camley school transport server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
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

  // Helper mode: hash a password and exit.
  if cli.hash_password {
    let password = read_password()?;
    let hash = hash_password(&password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    println!("{hash}");
    return Ok(());
  }

  let settings = ::config::Config::builder()
    .add_source(::config::File::from(cli.config).required(false))
    .add_source(
      ::config::Environment::with_prefix("CAMLEY")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let mut store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?
    .with_policy(server_cfg.billing.policy()?)
    .with_locale(server_cfg.locale);

  match &server_cfg.push_relay_url {
    Some(url) => {
      store = store.with_push(Arc::new(WebhookPush::new(url.clone())?));
      tracing::info!(%url, "push relay enabled");
    }
    None => tracing::info!("no push relay configured; notifications stay in-app"),
  }

  if let Some(admin) = &server_cfg.bootstrap_admin {
    let account = store
      .ensure_admin(NewAccount {
        name:          admin.name.clone(),
        email:         admin.email.clone(),
        password_hash: admin.password_hash.clone(),
        phone:         None,
        address:       None,
        gender:        None,
        role:          Role::Admin,
        active:        Some(true),
      })
      .await
      .context("failed to bootstrap administrator")?;
    tracing::info!(email = %account.email, "administrator ready");
  }

  let app = Router::new()
    .nest("/api", camley_api::api_router(AppState::new(store)))
    .layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  let password = line.trim_end_matches(['\n', '\r']).to_owned();
  anyhow::ensure!(!password.is_empty(), "password must not be empty");
  Ok(password)
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/camley.db")), PathBuf::from(home).join("camley.db"));
    assert_eq!(expand_tilde(Path::new("/var/camley.db")), PathBuf::from("/var/camley.db"));
  }

  #[test]
  fn default_billing_matches_policy() {
    let policy = crate::config::BillingConfig::default().policy().unwrap();
    assert_eq!(policy, camley_core::billing::BillingPolicy::default());
  }

  #[test]
  fn out_of_range_billing_is_rejected() {
    let mut billing = crate::config::BillingConfig::default();
    billing.due_days = i64::MAX;
    assert!(billing.policy().is_err());

    let mut billing = crate::config::BillingConfig::default();
    billing.ledger_dedupe_secs = i64::MAX;
    assert!(billing.policy().is_err());

    let mut billing = crate::config::BillingConfig::default();
    billing.due_days = -1;
    assert!(billing.policy().is_err());
  }

  #[test]
  fn minimal_config_uses_defaults() {
    let settings = ::config::Config::builder()
      .add_source(::config::File::from_str(
        "port = 9000\nlocale = \"en\"\n[billing]\ndue_days = 10\n",
        ::config::FileFormat::Toml,
      ))
      .build()
      .unwrap();
    let cfg: ServerConfig = settings.try_deserialize().unwrap();
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.locale, camley_core::messages::Locale::En);
    assert_eq!(cfg.billing.due_days, 10);
    assert_eq!(cfg.billing.ledger_dedupe_secs, 300);
    assert!(cfg.push_relay_url.is_none());
  }
}
