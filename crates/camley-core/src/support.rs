//! Support tickets opened by users and answered by the administrator or a
//! driver the ticket was forwarded to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::account::Role;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TicketStatus {
  Open,
  Answered,
  Closed,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
  Low,
  #[default]
  Medium,
  High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
  pub ticket_id:   Uuid,
  pub sender_id:   Uuid,
  pub sender_role: Role,
  pub subject:     String,
  pub priority:    Priority,
  pub message:     String,
  pub opened_at:   DateTime<Utc>,
  pub status:      TicketStatus,
  pub answer:      Option<String>,
  pub answered_by: Option<Uuid>,
  pub answered_at: Option<DateTime<Utc>>,
  /// The driver the administrator forwarded this ticket to.
  pub driver_id:   Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTicket {
  #[serde(default = "default_subject")]
  pub subject:  String,
  #[serde(default)]
  pub priority: Priority,
  pub message:  String,
}

fn default_subject() -> String { "inquiry".to_owned() }

#[derive(Debug, Clone, Deserialize)]
pub struct TicketAnswer {
  pub answer:            String,
  /// Administrator only: forward the ticket to this driver.
  pub forward_to_driver: Option<Uuid>,
}
