//! [`SqliteStore`]: connection handling, the transaction helper every
//! operation runs through, and lookups shared by the component impls.

use std::{path::Path, sync::Arc};

use camley_core::{
  account::{Account, Role},
  billing::{BillingPolicy, Payment},
  clock::{Clock, SystemClock},
  fleet::{Route, Vehicle},
  messages::{Locale, PUSH_TITLE},
  notification::{Notification, NotificationKind},
  push::{PushMessage, PushSender},
  roster::Student,
  store::Backend,
};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    ACCOUNT_COLUMNS, PAYMENT_COLUMNS, ROUTE_COLUMNS, RawAccount, RawPayment, RawRoute, RawStudent,
    RawSubscription, RawVehicle, STUDENT_COLUMNS, SUBSCRIPTION_COLUMNS, VEHICLE_COLUMNS,
    encode_dt, encode_uuid, query_one, query_rows,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Camley store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:   tokio_rusqlite::Connection,
  clock:  Arc<dyn Clock>,
  push:   Option<Arc<dyn PushSender>>,
  policy: BillingPolicy,
  locale: Locale,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store; useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self {
      conn,
      clock: Arc::new(SystemClock),
      push: None,
      policy: BillingPolicy::default(),
      locale: Locale::default(),
    })
  }

  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  /// Hand committed notifications to `push`. Without a sender, notifications
  /// are only kept in-app.
  pub fn with_push(mut self, push: Arc<dyn PushSender>) -> Self {
    self.push = Some(push);
    self
  }

  pub fn with_policy(mut self, policy: BillingPolicy) -> Self {
    self.policy = policy;
    self
  }

  pub fn with_locale(mut self, locale: Locale) -> Self {
    self.locale = locale;
    self
  }

  fn ctx(&self) -> Ctx {
    Ctx { now: self.clock.now(), policy: self.policy, locale: self.locale }
  }

  /// Run `f` inside one SQLite transaction.
  ///
  /// If `f` fails, the transaction is dropped (rolled back) and nothing it
  /// queued in the [`Outbox`] is pushed. On success the transaction commits
  /// first, then every queued message is delivered best-effort.
  pub(crate) async fn transact<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection, &mut Outbox, Ctx) -> Result<T> + Send + 'static,
  {
    let ctx = self.ctx();
    let (value, outbox) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut outbox = Outbox::default();
        match f(&*tx, &mut outbox, ctx) {
          Ok(value) => {
            tx.commit()?;
            Ok(Ok((value, outbox)))
          }
          Err(e) => Ok(Err(e)),
        }
      })
      .await??;
    self.dispatch(outbox).await;
    Ok(value)
  }

  /// Run a read-only `f` against the connection.
  pub(crate) async fn read<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection, Ctx) -> Result<T> + Send + 'static,
  {
    let ctx = self.ctx();
    self.conn.call(move |conn| Ok(f(&*conn, ctx))).await?
  }

  async fn dispatch(&self, outbox: Outbox) {
    let Some(push) = &self.push else { return };
    for message in outbox.messages {
      if message.subscriptions.is_empty() {
        continue;
      }
      if let Err(e) = push.deliver(&message).await {
        tracing::warn!(
          recipient = %message.notification.recipient_id,
          error = %e,
          "push delivery failed; notification kept in-app",
        );
      }
    }
  }
}

impl Backend for SqliteStore {
  type Error = Error;
}

// ─── Per-operation context ───────────────────────────────────────────────────

/// Deployment settings and the operation's timestamp, fixed once per call so
/// every step of a workflow sees the same "now".
#[derive(Debug, Clone, Copy)]
pub(crate) struct Ctx {
  pub now:    DateTime<Utc>,
  pub policy: BillingPolicy,
  pub locale: Locale,
}

// ─── Outbox ──────────────────────────────────────────────────────────────────

/// Notifications written during a transaction, with the recipient's push
/// endpoints, waiting for commit.
#[derive(Default)]
pub(crate) struct Outbox {
  messages: Vec<PushMessage>,
}

impl Outbox {
  /// Persist an in-app notification and queue it for push.
  pub fn notify(
    &mut self,
    conn: &Connection,
    now: DateTime<Utc>,
    recipient_id: Uuid,
    kind: NotificationKind,
    message: String,
    link: Option<&str>,
  ) -> Result<Notification> {
    let notification = Notification {
      notification_id: Uuid::new_v4(),
      recipient_id,
      kind,
      message,
      link: link.map(str::to_owned),
      created_at: now,
      read: false,
    };
    conn.execute(
      "INSERT INTO notifications
         (notification_id, recipient_id, kind, message, link, created_at, read)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
      params![
        encode_uuid(notification.notification_id),
        encode_uuid(recipient_id),
        kind.as_ref(),
        notification.message,
        notification.link,
        encode_dt(now),
      ],
    )?;
    let subscriptions = query_rows::<RawSubscription>(
      conn,
      &format!("SELECT {SUBSCRIPTION_COLUMNS} FROM push_subscriptions ps WHERE ps.account_id = ?1"),
      params![encode_uuid(recipient_id)],
    )?;
    self.messages.push(PushMessage {
      title: PUSH_TITLE.to_owned(),
      notification: notification.clone(),
      subscriptions,
    });
    Ok(notification)
  }

  pub fn len(&self) -> usize { self.messages.len() }
}

// ─── Shared lookups ──────────────────────────────────────────────────────────

pub(crate) fn find_account(conn: &Connection, id: Uuid) -> Result<Option<Account>> {
  query_one::<RawAccount>(
    conn,
    &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts a WHERE a.account_id = ?1"),
    params![encode_uuid(id)],
  )
}

pub(crate) fn account(conn: &Connection, id: Uuid) -> Result<Account> {
  find_account(conn, id)?.ok_or_else(|| camley_core::Error::not_found("account", id).into())
}

/// Load `id` and check it is a driver account.
pub(crate) fn driver(conn: &Connection, id: Uuid) -> Result<Account> {
  let account = account(conn, id)?;
  if account.role != Role::Driver {
    return Err(camley_core::Error::validation("driver_id", format!("{id} is not a driver")).into());
  }
  Ok(account)
}

/// Load `id` and check it is a parent account.
pub(crate) fn parent(conn: &Connection, id: Uuid) -> Result<Account> {
  let account = account(conn, id)?;
  if account.role != Role::Parent {
    return Err(camley_core::Error::validation("parent_id", format!("{id} is not a parent")).into());
  }
  Ok(account)
}

/// The earliest-registered administrator, recipient of system notices.
pub(crate) fn admin_id(conn: &Connection) -> Result<Option<Uuid>> {
  let accounts = query_rows::<RawAccount>(
    conn,
    &format!(
      "SELECT {ACCOUNT_COLUMNS} FROM accounts a
       WHERE a.role = 'admin' ORDER BY a.registered_at LIMIT 1"
    ),
    [],
  )?;
  Ok(accounts.into_iter().next().map(|a| a.account_id))
}

pub(crate) fn student(conn: &Connection, id: Uuid) -> Result<Student> {
  query_one::<RawStudent>(
    conn,
    &format!("SELECT {STUDENT_COLUMNS} FROM students s WHERE s.student_id = ?1"),
    params![encode_uuid(id)],
  )?
  .ok_or_else(|| camley_core::Error::not_found("student", id).into())
}

pub(crate) fn route(conn: &Connection, id: Uuid) -> Result<Route> {
  query_one::<RawRoute>(
    conn,
    &format!("SELECT {ROUTE_COLUMNS} FROM routes r WHERE r.route_id = ?1"),
    params![encode_uuid(id)],
  )?
  .ok_or_else(|| camley_core::Error::not_found("route", id).into())
}

/// The route a driver currently runs, if any.
pub(crate) fn route_of_driver(conn: &Connection, driver_id: Uuid) -> Result<Option<Route>> {
  query_one::<RawRoute>(
    conn,
    &format!(
      "SELECT {ROUTE_COLUMNS} FROM routes r
       WHERE r.driver_id = ?1 ORDER BY r.active DESC, r.name LIMIT 1"
    ),
    params![encode_uuid(driver_id)],
  )
}

pub(crate) fn vehicle(conn: &Connection, id: Uuid) -> Result<Vehicle> {
  query_one::<RawVehicle>(
    conn,
    &format!("SELECT {VEHICLE_COLUMNS} FROM vehicles v WHERE v.vehicle_id = ?1"),
    params![encode_uuid(id)],
  )?
  .ok_or_else(|| camley_core::Error::not_found("vehicle", id).into())
}

pub(crate) fn payment(conn: &Connection, id: Uuid) -> Result<Payment> {
  query_one::<RawPayment>(
    conn,
    &format!("SELECT {PAYMENT_COLUMNS} FROM payments p WHERE p.payment_id = ?1"),
    params![encode_uuid(id)],
  )?
  .ok_or_else(|| camley_core::Error::not_found("payment", id).into())
}

/// Distinct parents of the students riding `route_id`.
pub(crate) fn route_parents(conn: &Connection, route_id: Uuid) -> Result<Vec<Uuid>> {
  let mut stmt = conn.prepare(
    "SELECT DISTINCT parent_id FROM students
     WHERE route_id = ?1 AND parent_id IS NOT NULL ORDER BY parent_id",
  )?;
  let ids = stmt
    .query_map(params![encode_uuid(route_id)], |r| r.get::<_, String>(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  ids.iter().map(|s| crate::encode::decode_uuid(s)).collect()
}

/// Turn a UNIQUE violation into a domain conflict; pass anything else through.
pub(crate) fn unique_or(e: rusqlite::Error, conflict: impl FnOnce() -> String) -> Error {
  match &e {
    rusqlite::Error::SqliteFailure(err, _)
      if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
    {
      camley_core::Error::Conflict(conflict()).into()
    }
    _ => e.into(),
  }
}
