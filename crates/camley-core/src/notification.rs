//! Notification Outbox types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NotificationKind {
  System,
  Payment,
  Attendance,
  Delay,
  Student,
  Problem,
  Arrival,
  Support,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
  pub notification_id: Uuid,
  pub recipient_id:    Uuid,
  pub kind:            NotificationKind,
  pub message:         String,
  /// In-app path the notification points at, e.g. `/parent/dashboard`.
  pub link:            Option<String>,
  pub created_at:      DateTime<Utc>,
  pub read:            bool,
}

/// Input to [`crate::store::OutboxStore::notify`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewNotification {
  pub recipient_id: Uuid,
  pub kind:         NotificationKind,
  pub message:      String,
  pub link:         Option<String>,
}

/// A browser push endpoint registered by an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
  pub endpoint:   String,
  pub account_id: Uuid,
  pub p256dh:     String,
  pub auth:       String,
}

/// The keys half of a browser `PushSubscription` JSON object.
#[derive(Debug, Clone, Deserialize)]
pub struct PushKeys {
  pub p256dh: String,
  pub auth:   String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPushSubscription {
  pub endpoint: String,
  pub keys:     PushKeys,
}

/// Kind of message a driver sends to the families on the route (or, for
/// problems, to the administrator).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DriverReportKind {
  Delay,
  Arrival,
  Problem,
}

impl DriverReportKind {
  pub fn notification_kind(self) -> NotificationKind {
    match self {
      Self::Delay => NotificationKind::Delay,
      Self::Arrival => NotificationKind::Arrival,
      Self::Problem => NotificationKind::Problem,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DriverReport {
  pub kind:    DriverReportKind,
  /// Falls back to a canned message for the kind when empty.
  #[serde(default)]
  pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DelayReport {
  pub reason: String,
  pub eta:    Option<String>,
}
