//! [`OutboxStore`] for [`SqliteStore`]: in-app notifications, push
//! subscriptions, and the broadcasts a driver sends from the road.

use camley_core::{
  account::Caller,
  auth::{Action, authorize},
  notification::{
    DelayReport, DriverReport, DriverReportKind, NewNotification, NewPushSubscription,
    Notification, NotificationKind, PushSubscription,
  },
  store::OutboxStore,
};
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::{
  Result, SqliteStore,
  encode::{
    NOTIFICATION_COLUMNS, RawNotification, count, encode_uuid, query_one, query_rows,
  },
  store::{Ctx, Outbox, account, admin_id, route_of_driver, route_parents},
};

const PARENT_LINK: &str = "/parent/dashboard";

/// Longest page of notifications returned at once.
const MAX_PAGE: u32 = 100;

fn notification(conn: &Connection, id: Uuid) -> Result<Notification> {
  query_one::<RawNotification>(
    conn,
    &format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications n WHERE n.notification_id = ?1"),
    params![encode_uuid(id)],
  )?
  .ok_or_else(|| camley_core::Error::not_found("notification", id).into())
}

fn check_recipient(caller: &Caller, recipient_id: Uuid) -> Result<()> {
  if caller.is_admin() || caller.account_id == recipient_id {
    Ok(())
  } else {
    Err(camley_core::Error::Forbidden("not your notifications".into()).into())
  }
}

/// Send `message` to every parent with a child on the calling driver's route.
/// Returns how many parents were notified.
fn notify_route_parents(
  conn: &Connection,
  outbox: &mut Outbox,
  ctx: Ctx,
  driver_id: Uuid,
  kind: NotificationKind,
  message: &str,
) -> Result<u64> {
  let Some(route) = route_of_driver(conn, driver_id)? else {
    return Ok(0);
  };
  let parents = route_parents(conn, route.route_id)?;
  for parent_id in &parents {
    outbox.notify(conn, ctx.now, *parent_id, kind, message.to_owned(), Some(PARENT_LINK))?;
  }
  Ok(parents.len() as u64)
}

impl OutboxStore for SqliteStore {
  async fn notify(&self, caller: Caller, input: NewNotification) -> Result<Notification> {
    authorize(&caller, Action::SendNotification)?;
    if input.message.trim().is_empty() {
      return Err(camley_core::Error::validation("message", "must not be empty").into());
    }
    self
      .transact(move |conn, outbox, ctx| {
        account(conn, input.recipient_id)?;
        outbox.notify(
          conn,
          ctx.now,
          input.recipient_id,
          input.kind,
          input.message,
          input.link.as_deref(),
        )
      })
      .await
  }

  async fn list_notifications(
    &self,
    caller: Caller,
    recipient_id: Uuid,
    limit: u32,
  ) -> Result<Vec<Notification>> {
    authorize(&caller, Action::ReadNotifications)?;
    check_recipient(&caller, recipient_id)?;
    let limit = limit.clamp(1, MAX_PAGE);
    self
      .read(move |conn, _| {
        query_rows::<RawNotification>(
          conn,
          &format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications n
             WHERE n.recipient_id = ?1
             ORDER BY n.created_at DESC, n.rowid DESC LIMIT ?2"
          ),
          params![encode_uuid(recipient_id), limit],
        )
      })
      .await
  }

  async fn unread_count(&self, caller: Caller, recipient_id: Uuid) -> Result<u64> {
    authorize(&caller, Action::ReadNotifications)?;
    check_recipient(&caller, recipient_id)?;
    self
      .read(move |conn, _| {
        count(
          conn,
          "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1 AND read = 0",
          params![encode_uuid(recipient_id)],
        )
      })
      .await
  }

  async fn mark_read(&self, caller: Caller, id: Uuid) -> Result<Notification> {
    authorize(&caller, Action::ReadNotifications)?;
    self
      .transact(move |conn, _, _| {
        let current = notification(conn, id)?;
        check_recipient(&caller, current.recipient_id)?;
        conn.execute(
          "UPDATE notifications SET read = 1 WHERE notification_id = ?1",
          params![encode_uuid(id)],
        )?;
        notification(conn, id)
      })
      .await
  }

  async fn mark_all_read(&self, caller: Caller) -> Result<u64> {
    authorize(&caller, Action::ReadNotifications)?;
    self
      .transact(move |conn, _, _| {
        let n = conn.execute(
          "UPDATE notifications SET read = 1 WHERE recipient_id = ?1 AND read = 0",
          params![encode_uuid(caller.account_id)],
        )?;
        Ok(n as u64)
      })
      .await
  }

  async fn subscribe_push(
    &self,
    caller: Caller,
    input: NewPushSubscription,
  ) -> Result<PushSubscription> {
    authorize(&caller, Action::ManagePushSubscription)?;
    if input.endpoint.trim().is_empty() {
      return Err(camley_core::Error::validation("endpoint", "must not be empty").into());
    }
    self
      .transact(move |conn, _, _| {
        let subscription = PushSubscription {
          endpoint:   input.endpoint,
          account_id: caller.account_id,
          p256dh:     input.keys.p256dh,
          auth:       input.keys.auth,
        };
        conn.execute(
          "INSERT INTO push_subscriptions (endpoint, account_id, p256dh, auth)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (endpoint) DO UPDATE SET
             account_id = excluded.account_id,
             p256dh     = excluded.p256dh,
             auth       = excluded.auth",
          params![
            subscription.endpoint,
            encode_uuid(subscription.account_id),
            subscription.p256dh,
            subscription.auth,
          ],
        )?;
        Ok(subscription)
      })
      .await
  }

  async fn unsubscribe_push(&self, caller: Caller, endpoint: String) -> Result<bool> {
    authorize(&caller, Action::ManagePushSubscription)?;
    self
      .transact(move |conn, _, _| {
        let n = conn.execute(
          "DELETE FROM push_subscriptions WHERE endpoint = ?1 AND account_id = ?2",
          params![endpoint, encode_uuid(caller.account_id)],
        )?;
        Ok(n > 0)
      })
      .await
  }

  async fn report_delay(&self, caller: Caller, input: DelayReport) -> Result<u64> {
    authorize(&caller, Action::BroadcastFromDriver)?;
    if input.reason.trim().is_empty() {
      return Err(camley_core::Error::validation("reason", "must not be empty").into());
    }
    let notified = self
      .transact(move |conn, outbox, ctx| {
        let driver = account(conn, caller.account_id)?;
        let eta = input
          .eta
          .filter(|e| !e.trim().is_empty())
          .unwrap_or_else(|| ctx.locale.default_eta().to_owned());
        let notified = notify_route_parents(
          conn,
          outbox,
          ctx,
          driver.account_id,
          NotificationKind::Delay,
          &ctx.locale.delay_for_parents(&input.reason, &eta),
        )?;
        if let Some(admin) = admin_id(conn)? {
          outbox.notify(
            conn,
            ctx.now,
            admin,
            NotificationKind::Delay,
            ctx.locale.delay_for_admin(&driver.name, &input.reason),
            None,
          )?;
        }
        Ok(notified)
      })
      .await?;
    tracing::info!(driver_id = %caller.account_id, notified, "delay reported");
    Ok(notified)
  }

  async fn driver_report(&self, caller: Caller, input: DriverReport) -> Result<u64> {
    authorize(&caller, Action::BroadcastFromDriver)?;
    self
      .transact(move |conn, outbox, ctx| {
        let driver = account(conn, caller.account_id)?;
        let message = match input.message.trim() {
          "" => ctx.locale.default_report(input.kind).to_owned(),
          text => text.to_owned(),
        };
        match input.kind {
          DriverReportKind::Problem => {
            if let Some(admin) = admin_id(conn)? {
              outbox.notify(
                conn,
                ctx.now,
                admin,
                NotificationKind::Problem,
                ctx.locale.problem_for_admin(&driver.name, &message),
                None,
              )?;
            }
          }
          kind => {
            notify_route_parents(
              conn,
              outbox,
              ctx,
              driver.account_id,
              kind.notification_kind(),
              &message,
            )?;
          }
        }
        Ok(outbox.len() as u64)
      })
      .await
  }
}
