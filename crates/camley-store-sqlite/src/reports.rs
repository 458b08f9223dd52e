//! [`ReportStore`] for [`SqliteStore`]: read-only views over the ledger and
//! the attendance log.

use std::collections::BTreeMap;

use camley_core::{
  account::Caller,
  attendance::{AttendanceRecord, Tally},
  auth::{Action, authorize},
  billing::{PaymentStatus, due_at},
  report::{
    AttendanceReport, DailyAttendance, Dashboard, DriverTally, FinanceSummary, month_start, week_of,
  },
  store::ReportStore,
};
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
  Error, Result, SqliteStore,
  encode::{
    ATTENDANCE_COLUMNS, EXPENSE_COLUMNS, INCOME_COLUMNS, MANUAL_COLUMNS, RawAttendance,
    RawExpense, RawIncome, RawManualSummary, count, encode_date, encode_dt, encode_uuid,
    query_rows, sum_amounts,
  },
  store::{driver, find_account},
};

/// Entries shown in the "recent" lists of the finance summary.
const RECENT: u32 = 10;

/// Sum of `table.amount` recorded in `[from, until)`.
fn ledger_total(
  conn: &Connection,
  table: &str,
  from: Option<DateTime<Utc>>,
  until: Option<DateTime<Utc>>,
) -> Result<Decimal> {
  sum_amounts(
    conn,
    &format!(
      "SELECT amount FROM {table}
       WHERE (?1 IS NULL OR recorded_at >= ?1) AND (?2 IS NULL OR recorded_at < ?2)"
    ),
    params![from.map(encode_dt), until.map(encode_dt)],
  )
}

fn day_after(date: NaiveDate) -> DateTime<Utc> { due_at(date + TimeDelta::days(1)) }

impl ReportStore for SqliteStore {
  async fn dashboard(&self, caller: Caller) -> Result<Dashboard> {
    authorize(&caller, Action::ViewDashboard)?;
    self
      .read(|conn, ctx| {
        let now = encode_dt(ctx.now);
        let pending = PaymentStatus::Pending.as_ref();
        let (week_starts, week_ends) = week_of(ctx.now);
        let week = (Some(due_at(week_starts)), Some(day_after(week_ends)));
        Ok(Dashboard {
          students: count(conn, "SELECT COUNT(*) FROM students WHERE active = 1", [])?,
          active_routes: count(conn, "SELECT COUNT(*) FROM routes WHERE active = 1", [])?,
          active_drivers: count(
            conn,
            "SELECT COUNT(*) FROM accounts WHERE role = 'driver' AND active = 1",
            [],
          )?,
          pending_payments: count(
            conn,
            "SELECT COUNT(*) FROM payments WHERE status = ?1",
            params![pending],
          )?,
          overdue_payments: count(
            conn,
            "SELECT COUNT(*) FROM payments WHERE status = ?1 AND due_at < ?2",
            params![pending, now],
          )?,
          week_starts,
          week_ends,
          week_income: ledger_total(conn, "incomes", week.0, week.1)?,
          week_expense: ledger_total(conn, "expenses", week.0, week.1)?,
          pending_approvals: count(
            conn,
            "SELECT COUNT(*) FROM accounts WHERE role = 'driver' AND active = 0",
            [],
          )?,
        })
      })
      .await
  }

  async fn finance_summary(&self, caller: Caller) -> Result<FinanceSummary> {
    authorize(&caller, Action::ManageFinance)?;
    self
      .read(|conn, ctx| {
        let total_income = ledger_total(conn, "incomes", None, None)?;
        let total_expense = ledger_total(conn, "expenses", None, None)?;
        let balance = total_income
          .checked_sub(total_expense)
          .ok_or(Error::Decimal(rust_decimal::Error::LessThanMinimumPossibleValue))?;
        let month = Some(due_at(month_start(ctx.now)));
        Ok(FinanceSummary {
          total_income,
          total_expense,
          balance,
          month_income: ledger_total(conn, "incomes", month, None)?,
          month_expense: ledger_total(conn, "expenses", month, None)?,
          recent_income: query_rows::<RawIncome>(
            conn,
            &format!(
              "SELECT {INCOME_COLUMNS} FROM incomes i ORDER BY i.recorded_at DESC LIMIT ?1"
            ),
            params![RECENT],
          )?,
          recent_expenses: query_rows::<RawExpense>(
            conn,
            &format!(
              "SELECT {EXPENSE_COLUMNS} FROM expenses e ORDER BY e.recorded_at DESC LIMIT ?1"
            ),
            params![RECENT],
          )?,
        })
      })
      .await
  }

  async fn daily_attendance(&self, caller: Caller, date: NaiveDate) -> Result<DailyAttendance> {
    authorize(&caller, Action::ReviewAttendance)?;
    self
      .read(move |conn, _| {
        let day = encode_date(date);
        let records = query_rows::<RawAttendance>(
          conn,
          &format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance t WHERE t.date = ?1 ORDER BY t.time"
          ),
          params![day],
        )?;
        let manual = query_rows::<RawManualSummary>(
          conn,
          &format!("SELECT {MANUAL_COLUMNS} FROM manual_attendance m WHERE m.date = ?1"),
          params![day],
        )?;

        let mut tallies: BTreeMap<Uuid, Tally> = BTreeMap::new();
        for record in &records {
          if let Some(driver_id) = record.driver_id {
            tallies.entry(driver_id).or_default().add(record.status);
          }
        }
        let mut drivers = Vec::with_capacity(tallies.len());
        for (driver_id, tally) in tallies {
          let driver_name = find_account(conn, driver_id)?.map(|a| a.name).unwrap_or_default();
          drivers.push(DriverTally { driver_id, driver_name, tally });
        }
        drivers.sort_by(|a, b| a.driver_name.cmp(&b.driver_name));

        Ok(DailyAttendance { date, records, manual, drivers })
      })
      .await
  }

  async fn attendance_report(
    &self,
    caller: Caller,
    driver_id: Uuid,
    date: NaiveDate,
  ) -> Result<AttendanceReport> {
    authorize(&caller, Action::ReviewAttendance)?;
    self
      .read(move |conn, _| {
        let driver = driver(conn, driver_id)?;
        let records: Vec<AttendanceRecord> = query_rows::<RawAttendance>(
          conn,
          &format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance t
             WHERE t.driver_id = ?1 AND t.date = ?2 ORDER BY t.time"
          ),
          params![encode_uuid(driver_id), encode_date(date)],
        )?;
        let tally = Tally::of(&records);
        Ok(AttendanceReport { driver_id, driver_name: driver.name, date, records, tally })
      })
      .await
  }
}
