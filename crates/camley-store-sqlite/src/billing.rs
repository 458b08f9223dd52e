//! [`BillingStore`] for [`SqliteStore`].
//!
//! Settling a payment is a short ordered sequence inside one transaction:
//! flip the status, stamp the paid date and method, then derive the income
//! entry unless an equivalent one landed within the dedupe window.

use camley_core::{
  account::{Caller, Role},
  auth::{Action, authorize},
  billing::{
    DEFAULT_METHOD, Expense, Income, IncomeSource, NewExpense, NewIncome, NewPayment, Payment,
    PaymentFilter, PaymentPatch, PaymentQuery, PaymentStatus, due_at, validate_amount,
    validate_entry,
  },
  notification::NotificationKind,
  store::BillingStore,
};
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::{
  Result, SqliteStore,
  encode::{
    EXPENSE_COLUMNS, INCOME_COLUMNS, PAYMENT_COLUMNS, RawExpense, RawIncome, RawPayment,
    decode_decimal, decode_dt, encode_decimal, encode_dt, encode_opt_uuid, encode_uuid,
    query_one, query_rows,
  },
  store::{Ctx, payment, student},
};

pub(crate) fn insert_payment(conn: &Connection, p: &Payment) -> Result<()> {
  conn.execute(
    "INSERT INTO payments (
       payment_id, student_id, amount, status, due_at, paid_at, created_at,
       months_covered, method, reference, description, seen_by_parent
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    params![
      encode_uuid(p.payment_id),
      encode_uuid(p.student_id),
      encode_decimal(p.amount),
      p.status.as_ref(),
      encode_dt(p.due_at),
      p.paid_at.map(encode_dt),
      encode_dt(p.created_at),
      p.months_covered,
      p.method,
      p.reference,
      p.description,
      p.seen_by_parent,
    ],
  )?;
  Ok(())
}

fn insert_income(conn: &Connection, income: &Income) -> Result<()> {
  conn.execute(
    "INSERT INTO incomes (income_id, description, amount, source, recorded_at, payment_id)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    params![
      encode_uuid(income.income_id),
      income.description,
      encode_decimal(income.amount),
      income.source.as_ref(),
      encode_dt(income.recorded_at),
      encode_opt_uuid(income.payment_id),
    ],
  )?;
  Ok(())
}

/// Derive the income entry for a payment that just became paid.
///
/// Returns `None` when an entry with the same description, amount, and source
/// was recorded within the policy's dedupe window.
fn record_payment_income(
  conn: &Connection,
  ctx: Ctx,
  payment: &Payment,
  student_name: &str,
) -> Result<Option<Income>> {
  let description = ctx.locale.payment_income(student_name);
  let source = IncomeSource::StudentPayment;

  let mut stmt = conn.prepare(
    "SELECT amount, recorded_at FROM incomes
     WHERE description = ?1 AND source = ?2 AND recorded_at <= ?3",
  )?;
  let recent = stmt
    .query_map(params![description, source.as_ref(), encode_dt(ctx.now)], |r| {
      Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  for (amount, recorded_at) in &recent {
    if decode_decimal(amount)? == payment.amount
      && ctx.policy.suppresses(decode_dt(recorded_at)?, ctx.now)
    {
      tracing::debug!(
        payment_id = %payment.payment_id,
        "equivalent income recorded within dedupe window; skipping",
      );
      return Ok(None);
    }
  }

  let income = Income {
    income_id: Uuid::new_v4(),
    description,
    amount: payment.amount,
    source,
    recorded_at: ctx.now,
    payment_id: Some(payment.payment_id),
  };
  insert_income(conn, &income)?;
  Ok(Some(income))
}

impl BillingStore for SqliteStore {
  async fn register_payment(&self, caller: Caller, input: NewPayment) -> Result<Payment> {
    authorize(&caller, Action::ManagePayments)?;
    validate_amount(input.amount)?;

    self
      .transact(move |conn, outbox, ctx| {
        let student = student(conn, input.student_id)?;
        let paid = input.status == PaymentStatus::Paid;
        let payment = Payment {
          payment_id:     Uuid::new_v4(),
          student_id:     student.student_id,
          amount:         input.amount,
          status:         input.status,
          due_at:         input.due_date.map(due_at).unwrap_or(ctx.policy.due_from(ctx.now)),
          paid_at:        paid.then_some(ctx.now),
          created_at:     ctx.now,
          months_covered: input.months_covered.unwrap_or(1),
          method:         input.method.or(paid.then(|| DEFAULT_METHOD.to_owned())),
          reference:      input.reference,
          description:    input.description,
          seen_by_parent: false,
        };
        insert_payment(conn, &payment)?;
        if paid {
          record_payment_income(conn, ctx, &payment, &student.name)?;
        }
        if let Some(parent_id) = student.parent_id {
          outbox.notify(
            conn,
            ctx.now,
            parent_id,
            NotificationKind::Payment,
            ctx.locale.payment_registered(payment.amount, &student.name, payment.due_at),
            Some("/parent/payments"),
          )?;
        }
        Ok(payment)
      })
      .await
  }

  async fn mark_paid(&self, caller: Caller, id: Uuid, method: Option<String>) -> Result<Payment> {
    authorize(&caller, Action::ManagePayments)?;
    let (payment, income) = self
      .transact(move |conn, _, ctx| {
        let current = payment(conn, id)?;
        if current.status == PaymentStatus::Paid {
          return Ok((current, None));
        }
        conn.execute(
          "UPDATE payments SET status = ?2, paid_at = ?3, method = ?4 WHERE payment_id = ?1",
          params![
            encode_uuid(id),
            PaymentStatus::Paid.as_ref(),
            encode_dt(ctx.now),
            method.unwrap_or_else(|| DEFAULT_METHOD.to_owned()),
          ],
        )?;
        let paid = payment(conn, id)?;
        let student = student(conn, paid.student_id)?;
        let income = record_payment_income(conn, ctx, &paid, &student.name)?;
        Ok((paid, income))
      })
      .await?;

    tracing::info!(
      payment_id = %id,
      income_id = ?income.map(|i| i.income_id),
      "payment settled",
    );
    Ok(payment)
  }

  async fn update_payment(&self, caller: Caller, id: Uuid, patch: PaymentPatch) -> Result<Payment> {
    authorize(&caller, Action::ManagePayments)?;
    if let Some(amount) = patch.amount {
      validate_amount(amount)?;
    }

    self
      .transact(move |conn, _, ctx| {
        let before = payment(conn, id)?;
        let status = patch.status.unwrap_or(before.status);
        let paid_at = match status {
          PaymentStatus::Paid => before.paid_at.or(Some(ctx.now)),
          PaymentStatus::Pending => None,
        };
        conn.execute(
          "UPDATE payments SET
             amount = ?2, status = ?3, paid_at = ?4, method = ?5, reference = ?6, due_at = ?7
           WHERE payment_id = ?1",
          params![
            encode_uuid(id),
            encode_decimal(patch.amount.unwrap_or(before.amount)),
            status.as_ref(),
            paid_at.map(encode_dt),
            patch.method.or(before.method),
            patch.reference.or(before.reference),
            encode_dt(patch.due_date.map(due_at).unwrap_or(before.due_at)),
          ],
        )?;
        payment(conn, id)
      })
      .await
  }

  async fn delete_payment(&self, caller: Caller, id: Uuid) -> Result<Payment> {
    authorize(&caller, Action::ManagePayments)?;
    self
      .transact(move |conn, _, _| {
        let payment = payment(conn, id)?;
        conn.execute("DELETE FROM payments WHERE payment_id = ?1", params![encode_uuid(id)])?;
        Ok(payment)
      })
      .await
  }

  async fn purge_overdue(&self, caller: Caller) -> Result<u64> {
    authorize(&caller, Action::ManagePayments)?;
    let removed = self
      .transact(move |conn, _, ctx| {
        let n = conn.execute(
          "DELETE FROM payments WHERE status = ?1 AND due_at < ?2",
          params![PaymentStatus::Pending.as_ref(), encode_dt(ctx.now)],
        )?;
        Ok(n as u64)
      })
      .await?;
    tracing::info!(removed, "overdue payments purged");
    Ok(removed)
  }

  async fn list_payments(&self, caller: Caller, query: PaymentQuery) -> Result<Vec<Payment>> {
    authorize(&caller, Action::ViewPayments)?;
    let parent_id = (caller.role == Role::Parent).then_some(caller.account_id);
    self
      .read(move |conn, ctx| {
        let (status, due_before) = match query.status {
          PaymentFilter::All => (None, None),
          PaymentFilter::Pending => (Some(PaymentStatus::Pending), None),
          PaymentFilter::Paid => (Some(PaymentStatus::Paid), None),
          PaymentFilter::Overdue => (Some(PaymentStatus::Pending), Some(encode_dt(ctx.now))),
        };
        query_rows::<RawPayment>(
          conn,
          &format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments p
             JOIN students s ON s.student_id = p.student_id
             WHERE (?1 IS NULL OR p.student_id = ?1)
               AND (?2 IS NULL OR s.parent_id = ?2)
               AND (?3 IS NULL OR p.status = ?3)
               AND (?4 IS NULL OR p.due_at < ?4)
             ORDER BY p.status, p.due_at"
          ),
          params![
            encode_opt_uuid(query.student_id),
            encode_opt_uuid(parent_id),
            status.map(|s| s.as_ref().to_owned()),
            due_before,
          ],
        )
      })
      .await
  }

  async fn mark_payment_seen(&self, caller: Caller, id: Uuid) -> Result<Payment> {
    authorize(&caller, Action::AcknowledgePayment)?;
    self
      .transact(move |conn, _, _| {
        let current = payment(conn, id)?;
        let student = student(conn, current.student_id)?;
        if student.parent_id != Some(caller.account_id) {
          return Err(camley_core::Error::Forbidden("not your student's payment".into()).into());
        }
        conn.execute(
          "UPDATE payments SET seen_by_parent = 1 WHERE payment_id = ?1",
          params![encode_uuid(id)],
        )?;
        payment(conn, id)
      })
      .await
  }

  async fn record_income(&self, caller: Caller, input: NewIncome) -> Result<Income> {
    authorize(&caller, Action::ManageFinance)?;
    validate_entry(&input.description, input.amount)?;
    self
      .transact(move |conn, _, ctx| {
        let income = Income {
          income_id:   Uuid::new_v4(),
          description: input.description.trim().to_owned(),
          amount:      input.amount,
          source:      input.source,
          recorded_at: ctx.now,
          payment_id:  None,
        };
        insert_income(conn, &income)?;
        Ok(income)
      })
      .await
  }

  async fn record_expense(&self, caller: Caller, input: NewExpense) -> Result<Expense> {
    authorize(&caller, Action::ManageFinance)?;
    validate_entry(&input.description, input.amount)?;
    self
      .transact(move |conn, _, ctx| {
        let expense = Expense {
          expense_id:  Uuid::new_v4(),
          description: input.description.trim().to_owned(),
          amount:      input.amount,
          category:    input.category,
          recorded_at: ctx.now,
          receipt:     input.receipt,
        };
        conn.execute(
          "INSERT INTO expenses (expense_id, description, amount, category, recorded_at, receipt)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          params![
            encode_uuid(expense.expense_id),
            expense.description,
            encode_decimal(expense.amount),
            expense.category.as_ref(),
            encode_dt(expense.recorded_at),
            expense.receipt,
          ],
        )?;
        Ok(expense)
      })
      .await
  }

  async fn delete_income(&self, caller: Caller, id: Uuid) -> Result<Income> {
    authorize(&caller, Action::ManageFinance)?;
    self
      .transact(move |conn, _, _| {
        let key = encode_uuid(id);
        let income = query_one::<RawIncome>(
          conn,
          &format!("SELECT {INCOME_COLUMNS} FROM incomes i WHERE i.income_id = ?1"),
          params![key],
        )?
        .ok_or(camley_core::Error::not_found("income", id))?;
        conn.execute("DELETE FROM incomes WHERE income_id = ?1", params![key])?;
        Ok(income)
      })
      .await
  }

  async fn delete_expense(&self, caller: Caller, id: Uuid) -> Result<Expense> {
    authorize(&caller, Action::ManageFinance)?;
    self
      .transact(move |conn, _, _| {
        let key = encode_uuid(id);
        let expense = query_one::<RawExpense>(
          conn,
          &format!("SELECT {EXPENSE_COLUMNS} FROM expenses e WHERE e.expense_id = ?1"),
          params![key],
        )?
        .ok_or(camley_core::Error::not_found("expense", id))?;
        conn.execute("DELETE FROM expenses WHERE expense_id = ?1", params![key])?;
        Ok(expense)
      })
      .await
  }
}
