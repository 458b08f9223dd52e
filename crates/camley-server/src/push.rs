//! Push relay: forwards each committed notification, with the recipient's
//! browser subscriptions, to an external webhook that speaks Web Push.

use std::time::Duration;

use anyhow::Context as _;
use camley_core::push::{PushError, PushFuture, PushMessage, PushSender};
use reqwest::Client;

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct WebhookPush {
  client: Client,
  url:    String,
}

impl WebhookPush {
  pub fn new(url: String) -> anyhow::Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(10))
      .build()
      .context("failed to build push relay client")?;
    Ok(Self { client, url })
  }
}

impl PushSender for WebhookPush {
  fn deliver<'a>(&'a self, message: &'a PushMessage) -> PushFuture<'a> {
    Box::pin(async move {
      let resp = self
        .client
        .post(&self.url)
        .json(message)
        .send()
        .await
        .map_err(|e| PushError(e.to_string()))?;
      if !resp.status().is_success() {
        return Err(PushError(format!("relay answered {}", resp.status())));
      }
      Ok(())
    })
  }
}
