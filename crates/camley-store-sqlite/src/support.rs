//! [`SupportStore`] for [`SqliteStore`].

use camley_core::{
  account::{Caller, Role},
  auth::{Action, authorize},
  notification::NotificationKind,
  store::SupportStore,
  support::{NewTicket, Ticket, TicketAnswer, TicketStatus},
};
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::{
  Result, SqliteStore,
  encode::{RawTicket, TICKET_COLUMNS, encode_dt, encode_opt_uuid, encode_uuid, query_one, query_rows},
  store::{account, admin_id, driver},
};

const SUPPORT_LINK: &str = "/support";

fn ticket(conn: &Connection, id: Uuid) -> Result<Ticket> {
  query_one::<RawTicket>(
    conn,
    &format!("SELECT {TICKET_COLUMNS} FROM tickets k WHERE k.ticket_id = ?1"),
    params![encode_uuid(id)],
  )?
  .ok_or_else(|| camley_core::Error::not_found("ticket", id).into())
}

impl SupportStore for SqliteStore {
  async fn open_ticket(&self, caller: Caller, input: NewTicket) -> Result<Ticket> {
    authorize(&caller, Action::OpenTicket)?;
    if input.message.trim().is_empty() {
      return Err(camley_core::Error::validation("message", "must not be empty").into());
    }
    if input.subject.trim().is_empty() {
      return Err(camley_core::Error::validation("subject", "must not be empty").into());
    }
    self
      .transact(move |conn, outbox, ctx| {
        let sender = account(conn, caller.account_id)?;
        let ticket = Ticket {
          ticket_id:   Uuid::new_v4(),
          sender_id:   sender.account_id,
          sender_role: sender.role,
          subject:     input.subject.trim().to_owned(),
          priority:    input.priority,
          message:     input.message.trim().to_owned(),
          opened_at:   ctx.now,
          status:      TicketStatus::Open,
          answer:      None,
          answered_by: None,
          answered_at: None,
          driver_id:   None,
        };
        conn.execute(
          "INSERT INTO tickets
             (ticket_id, sender_id, sender_role, subject, priority, message, opened_at, status)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          params![
            encode_uuid(ticket.ticket_id),
            encode_uuid(ticket.sender_id),
            ticket.sender_role.as_ref(),
            ticket.subject,
            ticket.priority.as_ref(),
            ticket.message,
            encode_dt(ticket.opened_at),
            ticket.status.as_ref(),
          ],
        )?;
        if let Some(admin) = admin_id(conn)? {
          outbox.notify(
            conn,
            ctx.now,
            admin,
            NotificationKind::Support,
            ctx.locale.ticket_opened(
              &sender.name,
              &sender.email,
              &ticket.subject,
              ticket.priority,
              &ticket.message,
            ),
            Some("/admin/support"),
          )?;
        }
        Ok(ticket)
      })
      .await
  }

  async fn answer_ticket(&self, caller: Caller, id: Uuid, input: TicketAnswer) -> Result<Ticket> {
    authorize(&caller, Action::AnswerTicket)?;
    let answer = input.answer.trim().to_owned();
    if answer.is_empty() {
      return Err(camley_core::Error::validation("answer", "must not be empty").into());
    }
    if caller.role != Role::Admin && input.forward_to_driver.is_some() {
      return Err(
        camley_core::Error::Forbidden("only an administrator may forward tickets".into()).into(),
      );
    }

    self
      .transact(move |conn, outbox, ctx| {
        let current = ticket(conn, id)?;
        if caller.role == Role::Driver && current.driver_id != Some(caller.account_id) {
          return Err(
            camley_core::Error::Forbidden("ticket was not forwarded to you".into()).into(),
          );
        }
        let forwarded_to = match input.forward_to_driver {
          Some(driver_id) => Some(driver(conn, driver_id)?.account_id),
          None => current.driver_id,
        };
        conn.execute(
          "UPDATE tickets SET
             status = ?2, answer = ?3, answered_by = ?4, answered_at = ?5, driver_id = ?6
           WHERE ticket_id = ?1",
          params![
            encode_uuid(id),
            TicketStatus::Answered.as_ref(),
            answer,
            encode_uuid(caller.account_id),
            encode_dt(ctx.now),
            encode_opt_uuid(forwarded_to),
          ],
        )?;

        if caller.role == Role::Driver {
          let driver = account(conn, caller.account_id)?;
          outbox.notify(
            conn,
            ctx.now,
            current.sender_id,
            NotificationKind::Support,
            ctx.locale.ticket_answered_by_driver(&answer),
            Some(SUPPORT_LINK),
          )?;
          if let Some(admin) = admin_id(conn)? {
            outbox.notify(
              conn,
              ctx.now,
              admin,
              NotificationKind::Support,
              ctx.locale.driver_answer_for_admin(&driver.name, &answer),
              Some("/admin/support"),
            )?;
          }
        } else {
          outbox.notify(
            conn,
            ctx.now,
            current.sender_id,
            NotificationKind::Support,
            ctx.locale.ticket_answered(&answer),
            Some(SUPPORT_LINK),
          )?;
          if let Some(driver_id) = input.forward_to_driver {
            outbox.notify(
              conn,
              ctx.now,
              driver_id,
              NotificationKind::Support,
              ctx.locale.ticket_forwarded(&answer),
              Some(SUPPORT_LINK),
            )?;
          }
        }
        ticket(conn, id)
      })
      .await
  }

  async fn list_tickets(&self, caller: Caller) -> Result<Vec<Ticket>> {
    authorize(&caller, Action::ViewTickets)?;
    let (sender_id, driver_id) = match caller.role {
      Role::Admin => (None, None),
      Role::Parent => (Some(caller.account_id), None),
      Role::Driver => (None, Some(caller.account_id)),
    };
    self
      .read(move |conn, _| {
        query_rows::<RawTicket>(
          conn,
          &format!(
            "SELECT {TICKET_COLUMNS} FROM tickets k
             WHERE (?1 IS NULL OR k.sender_id = ?1)
               AND (?2 IS NULL OR k.driver_id = ?2 OR k.sender_id = ?2)
             ORDER BY k.opened_at DESC"
          ),
          params![encode_opt_uuid(sender_id), encode_opt_uuid(driver_id)],
        )
      })
      .await
  }
}
