//! Billing Ledger types: payments owed per student and the income/expense
//! ledger derived from them.
//!
//! A payment moves `pending → paid` and stays there; cancellation is
//! deletion. "Overdue" is not a stored state, only a view over pending
//! payments whose due date has passed.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Deployment-wide billing constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPolicy {
  /// Amount of the first payment created at enrollment.
  pub default_amount: Decimal,
  /// Days from creation until a new payment is due.
  pub due_days:       i64,
  /// An income entry equivalent to one recorded less than this long ago is
  /// not recorded again.
  pub ledger_dedupe:  TimeDelta,
}

impl Default for BillingPolicy {
  fn default() -> Self {
    Self {
      default_amount: Decimal::new(5000, 2),
      due_days:       7,
      ledger_dedupe:  TimeDelta::minutes(5),
    }
  }
}

impl BillingPolicy {
  pub fn due_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
    now + TimeDelta::days(self.due_days)
  }

  /// Whether an equivalent income entry recorded at `last` suppresses a new
  /// one at `now`.
  pub fn suppresses(&self, last: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - last <= self.ledger_dedupe
  }
}

/// Largest amount a single payment or ledger entry may carry.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

pub fn validate_amount(amount: Decimal) -> Result<()> {
  if amount <= Decimal::ZERO {
    return Err(Error::validation("amount", "must be greater than zero"));
  }
  if amount > MAX_AMOUNT {
    return Err(Error::validation("amount", format!("must not exceed {MAX_AMOUNT}")));
  }
  Ok(())
}

/// Interpret a calendar due date as midnight UTC.
pub fn due_at(date: NaiveDate) -> DateTime<Utc> {
  date.and_time(chrono::NaiveTime::MIN).and_utc()
}

// ─── Payments ────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
  Pending,
  Paid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
  pub payment_id:     Uuid,
  pub student_id:     Uuid,
  pub amount:         Decimal,
  pub status:         PaymentStatus,
  pub due_at:         DateTime<Utc>,
  pub paid_at:        Option<DateTime<Utc>>,
  pub created_at:     DateTime<Utc>,
  pub months_covered: u32,
  pub method:         Option<String>,
  pub reference:      Option<String>,
  pub description:    Option<String>,
  pub seen_by_parent: bool,
}

impl Payment {
  pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
    self.status == PaymentStatus::Pending && self.due_at < now
  }
}

pub const DEFAULT_METHOD: &str = "cash";

/// Input to [`crate::store::BillingStore::register_payment`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewPayment {
  pub student_id:     Uuid,
  pub amount:         Decimal,
  #[serde(default = "pending")]
  pub status:         PaymentStatus,
  pub method:         Option<String>,
  pub reference:      Option<String>,
  pub description:    Option<String>,
  /// Defaults to the policy's due offset from now.
  pub due_date:       Option<NaiveDate>,
  pub months_covered: Option<u32>,
}

fn pending() -> PaymentStatus { PaymentStatus::Pending }

/// Explicit administrator edit; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentPatch {
  pub amount:    Option<Decimal>,
  pub status:    Option<PaymentStatus>,
  pub method:    Option<String>,
  pub reference: Option<String>,
  pub due_date:  Option<NaiveDate>,
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
pub enum PaymentFilter {
  #[default]
  All,
  Pending,
  Paid,
  /// Pending and past due.
  Overdue,
}

/// Filter for [`crate::store::BillingStore::list_payments`]. Results are
/// ordered by status, then due date ascending.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentQuery {
  #[serde(default)]
  pub status:     PaymentFilter,
  pub student_id: Option<Uuid>,
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IncomeSource {
  StudentPayment,
  #[default]
  Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Income {
  pub income_id:   Uuid,
  pub description: String,
  pub amount:      Decimal,
  pub source:      IncomeSource,
  pub recorded_at: DateTime<Utc>,
  /// The payment this entry was derived from, if any.
  pub payment_id:  Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewIncome {
  pub description: String,
  pub amount:      Decimal,
  #[serde(default)]
  pub source:      IncomeSource,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExpenseCategory {
  Maintenance,
  Salaries,
  Fuel,
  Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
  pub expense_id:  Uuid,
  pub description: String,
  pub amount:      Decimal,
  pub category:    ExpenseCategory,
  pub recorded_at: DateTime<Utc>,
  pub receipt:     Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewExpense {
  pub description: String,
  pub amount:      Decimal,
  pub category:    ExpenseCategory,
  pub receipt:     Option<String>,
}

pub fn validate_entry(description: &str, amount: Decimal) -> Result<()> {
  if description.trim().is_empty() {
    return Err(Error::validation("description", "must not be empty"));
  }
  validate_amount(amount)
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, h, m, s).unwrap()
  }

  #[test]
  fn first_payment_is_due_a_week_out() {
    let policy = BillingPolicy::default();
    assert_eq!(policy.default_amount.to_string(), "50.00");
    assert_eq!(policy.due_from(at(9, 0, 0)), at(9, 0, 0) + TimeDelta::days(7));
  }

  #[test]
  fn dedupe_window_is_inclusive_of_five_minutes() {
    let policy = BillingPolicy::default();
    assert!(policy.suppresses(at(9, 0, 0), at(9, 4, 59)));
    assert!(policy.suppresses(at(9, 0, 0), at(9, 5, 0)));
    assert!(!policy.suppresses(at(9, 0, 0), at(9, 5, 1)));
  }

  #[test]
  fn overdue_requires_pending_and_past_due() {
    let mut payment = Payment {
      payment_id:     Uuid::new_v4(),
      student_id:     Uuid::new_v4(),
      amount:         Decimal::new(5000, 2),
      status:         PaymentStatus::Pending,
      due_at:         at(9, 0, 0),
      paid_at:        None,
      created_at:     at(8, 0, 0),
      months_covered: 1,
      method:         None,
      reference:      None,
      description:    None,
      seen_by_parent: false,
    };
    assert!(payment.is_overdue(at(10, 0, 0)));
    assert!(!payment.is_overdue(at(8, 30, 0)));
    payment.status = PaymentStatus::Paid;
    assert!(!payment.is_overdue(at(10, 0, 0)));
  }

  #[test]
  fn amounts_must_be_positive() {
    assert!(validate_amount(Decimal::ZERO).is_err());
    assert!(validate_amount(Decimal::new(-1, 0)).is_err());
    assert_eq!(MAX_AMOUNT, Decimal::new(1_000_000_000_000, 0));
    assert!(validate_amount(MAX_AMOUNT).is_ok());
    assert!(validate_amount(MAX_AMOUNT + Decimal::ONE).is_err());
    assert!(validate_amount(Decimal::MAX).is_err());
    assert!(validate_entry(" ", Decimal::ONE).is_err());
    assert!(validate_entry("Fuel", Decimal::ONE).is_ok());
  }
}
