//! Runtime configuration, deserialised from `config.toml` and `CAMLEY_*`
//! environment variables.

use std::path::PathBuf;

use anyhow::Context as _;
use camley_core::{
  billing::{BillingPolicy, validate_amount},
  messages::Locale,
};
use chrono::TimeDelta;
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:            String,
  #[serde(default = "default_port")]
  pub port:            u16,
  #[serde(default = "default_store_path")]
  pub store_path:      PathBuf,
  #[serde(default)]
  pub locale:          Locale,
  #[serde(default)]
  pub billing:         BillingConfig,
  /// Webhook that receives every push message as JSON. Without it,
  /// notifications stay in-app.
  pub push_relay_url:  Option<String>,
  pub bootstrap_admin: Option<AdminConfig>,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/camley/camley.db") }

const MAX_DUE_DAYS: i64 = 3_650;
const MAX_LEDGER_DEDUPE_SECS: i64 = 86_400;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
  pub default_amount:     Decimal,
  pub due_days:           i64,
  pub ledger_dedupe_secs: i64,
}

impl Default for BillingConfig {
  fn default() -> Self {
    let policy = BillingPolicy::default();
    Self {
      default_amount:     policy.default_amount,
      due_days:           policy.due_days,
      ledger_dedupe_secs: policy.ledger_dedupe.num_seconds(),
    }
  }
}

impl BillingConfig {
  pub fn policy(&self) -> anyhow::Result<BillingPolicy> {
    validate_amount(self.default_amount).context("billing.default_amount")?;
    anyhow::ensure!(
      (0..=MAX_DUE_DAYS).contains(&self.due_days),
      "billing.due_days must be between 0 and {MAX_DUE_DAYS}"
    );
    anyhow::ensure!(
      (0..=MAX_LEDGER_DEDUPE_SECS).contains(&self.ledger_dedupe_secs),
      "billing.ledger_dedupe_secs must be between 0 and {MAX_LEDGER_DEDUPE_SECS}"
    );
    Ok(BillingPolicy {
      default_amount: self.default_amount,
      due_days:       self.due_days,
      ledger_dedupe:  TimeDelta::seconds(self.ledger_dedupe_secs),
    })
  }
}

/// The administrator created at startup if no account with this email exists.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
  pub name:          String,
  pub email:         String,
  /// Argon2 PHC string; see `--hash-password`.
  pub password_hash: String,
}
