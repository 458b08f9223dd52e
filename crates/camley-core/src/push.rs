//! The external push seam.
//!
//! Push delivery happens after the in-app notification is committed and is
//! best-effort: a failing [`PushSender`] is logged by the caller and never
//! undoes or blocks the primary operation.

use std::{future::Future, pin::Pin};

use serde::Serialize;
use thiserror::Error;

use crate::notification::{Notification, PushSubscription};

#[derive(Debug, Error)]
#[error("push delivery failed: {0}")]
pub struct PushError(pub String);

/// A committed notification together with the recipient's endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct PushMessage {
  pub title:         String,
  pub notification:  Notification,
  pub subscriptions: Vec<PushSubscription>,
}

pub type PushFuture<'a> = Pin<Box<dyn Future<Output = Result<(), PushError>> + Send + 'a>>;

/// Delivers push messages to an external service.
///
/// Object-safe so the concrete transport can be chosen from configuration at
/// startup.
pub trait PushSender: Send + Sync {
  fn deliver<'a>(&'a self, message: &'a PushMessage) -> PushFuture<'a>;
}
