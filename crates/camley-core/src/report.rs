//! Read-only reporting views assembled from the ledger and the attendance
//! log. These are the data behind the administrator's dashboard and exports.

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  attendance::{AttendanceRecord, ManualSummary, Tally},
  billing::{Expense, Income},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
  pub students:          u64,
  pub active_routes:     u64,
  pub active_drivers:    u64,
  pub pending_payments:  u64,
  pub overdue_payments:  u64,
  pub week_starts:       NaiveDate,
  pub week_ends:         NaiveDate,
  pub week_income:       Decimal,
  pub week_expense:      Decimal,
  /// Drivers created inactive and not yet approved.
  pub pending_approvals: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinanceSummary {
  pub total_income:    Decimal,
  pub total_expense:   Decimal,
  pub balance:         Decimal,
  pub month_income:    Decimal,
  pub month_expense:   Decimal,
  pub recent_income:   Vec<Income>,
  pub recent_expenses: Vec<Expense>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverTally {
  pub driver_id:   Uuid,
  pub driver_name: String,
  #[serde(flatten)]
  pub tally:       Tally,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyAttendance {
  pub date:     NaiveDate,
  pub records:  Vec<AttendanceRecord>,
  pub manual:   Vec<ManualSummary>,
  pub drivers:  Vec<DriverTally>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceReport {
  pub driver_id:   Uuid,
  pub driver_name: String,
  pub date:        NaiveDate,
  pub records:     Vec<AttendanceRecord>,
  #[serde(flatten)]
  pub tally:       Tally,
}

/// Monday..Sunday of the week containing `now`.
pub fn week_of(now: DateTime<Utc>) -> (NaiveDate, NaiveDate) {
  let today = now.date_naive();
  let start = today - TimeDelta::days(i64::from(today.weekday().num_days_from_monday()));
  (start, start + TimeDelta::days(6))
}

/// First day of the month containing `now`.
pub fn month_start(now: DateTime<Utc>) -> NaiveDate {
  now.date_naive().with_day(1).unwrap_or_else(|| now.date_naive())
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn week_runs_monday_to_sunday() {
    // 2026-10-17 is a Saturday.
    let now = Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap();
    let (start, end) = week_of(now);
    assert_eq!(start, NaiveDate::from_ymd_opt(2026, 10, 12).unwrap());
    assert_eq!(end, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
  }

  #[test]
  fn month_start_is_the_first() {
    let now = Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap();
    assert_eq!(month_start(now), NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
  }
}
