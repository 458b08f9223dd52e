//! [`AccountStore`] for [`SqliteStore`].

use camley_core::{
  account::{
    Account, AccountPatch, AccountQuery, Caller, Credentials, NewAccount, Role, admission,
    validate_email,
  },
  auth::{Action, authorize},
  notification::NotificationKind,
  store::AccountStore,
};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::{
  Result, SqliteStore,
  encode::{
    ACCOUNT_COLUMNS, RawAccount, RawCredentials, encode_dt, encode_uuid, query_one, query_rows,
  },
  store::{Ctx, Outbox, account, admin_id, unique_or},
};

fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

fn insert_account(
  conn: &Connection,
  input: &NewAccount,
  role: Role,
  active: bool,
  now: DateTime<Utc>,
) -> Result<Account> {
  let account = Account {
    account_id:    Uuid::new_v4(),
    name:          input.name.trim().to_owned(),
    email:         normalize_email(&input.email),
    phone:         input.phone.clone(),
    address:       input.address.clone(),
    gender:        input.gender.clone(),
    role,
    active,
    registered_at: now,
  };
  conn
    .execute(
      "INSERT INTO accounts (
         account_id, name, email, password_hash, phone, address, gender,
         role, active, registered_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
      params![
        encode_uuid(account.account_id),
        account.name,
        account.email,
        input.password_hash,
        account.phone,
        account.address,
        account.gender,
        role.as_ref(),
        active,
        encode_dt(now),
      ],
    )
    .map_err(|e| unique_or(e, || format!("email {} is already registered", account.email)))?;
  Ok(account)
}

/// Tell `account` that its access was granted or revoked.
fn activation_notice(
  conn: &Connection,
  outbox: &mut Outbox,
  ctx: Ctx,
  account: &Account,
) -> Result<()> {
  let message = if account.active {
    ctx.locale.account_activated(account.role)
  } else {
    ctx.locale.account_deactivated()
  };
  outbox.notify(conn, ctx.now, account.account_id, NotificationKind::System, message, None)?;
  Ok(())
}

impl AccountStore for SqliteStore {
  async fn register(&self, caller: Option<Caller>, input: NewAccount) -> Result<Account> {
    input.validate()?;
    let (role, active) = admission(caller.as_ref(), input.role, input.active)?;

    let account = self
      .transact(move |conn, outbox, ctx| {
        let account = insert_account(conn, &input, role, active, ctx.now)?;
        if let Some(admin) = admin_id(conn)? {
          let message = match role {
            Role::Driver => ctx.locale.driver_created(&account.name),
            _ => ctx.locale.parent_pending(&account.name),
          };
          outbox.notify(
            conn,
            ctx.now,
            admin,
            NotificationKind::System,
            message,
            Some("/admin/users"),
          )?;
        }
        Ok(account)
      })
      .await?;

    tracing::info!(
      account_id = %account.account_id,
      role = %account.role,
      active = account.active,
      "account registered",
    );
    Ok(account)
  }

  async fn ensure_admin(&self, input: NewAccount) -> Result<Account> {
    validate_email(&input.email)?;
    if input.name.trim().is_empty() {
      return Err(camley_core::Error::validation("name", "must not be empty").into());
    }

    self
      .transact(move |conn, _, ctx| {
        let existing = query_one::<RawAccount>(
          conn,
          &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts a WHERE a.email = ?1"),
          params![normalize_email(&input.email)],
        )?;
        if let Some(existing) = existing {
          return Ok(existing);
        }
        let account = insert_account(conn, &input, Role::Admin, true, ctx.now)?;
        tracing::info!(account_id = %account.account_id, "bootstrap administrator created");
        Ok(account)
      })
      .await
  }

  async fn credentials(&self, email: String) -> Result<Option<Credentials>> {
    self
      .read(move |conn, _| {
        query_one::<RawCredentials>(
          conn,
          "SELECT account_id, role, active, password_hash FROM accounts WHERE email = ?1",
          params![normalize_email(&email)],
        )
      })
      .await
  }

  async fn get_account(&self, caller: Caller, id: Uuid) -> Result<Account> {
    authorize(&caller, Action::ViewAccount)?;
    if !caller.is_admin() && caller.account_id != id {
      return Err(camley_core::Error::Forbidden("may only view own account".into()).into());
    }
    self.read(move |conn, _| account(conn, id)).await
  }

  async fn list_accounts(&self, caller: Caller, query: AccountQuery) -> Result<Vec<Account>> {
    authorize(&caller, Action::ManageAccounts)?;
    self
      .read(move |conn, _| {
        query_rows::<RawAccount>(
          conn,
          &format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts a
             WHERE (?1 IS NULL OR a.role = ?1) AND (?2 IS NULL OR a.active = ?2)
             ORDER BY a.registered_at DESC"
          ),
          params![query.role.map(|r| r.as_ref().to_owned()), query.active],
        )
      })
      .await
  }

  async fn update_account(
    &self,
    caller: Caller,
    id: Uuid,
    patch: AccountPatch,
  ) -> Result<Account> {
    authorize(&caller, Action::ManageAccounts)?;
    if let Some(email) = &patch.email {
      validate_email(email)?;
    }
    if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
      return Err(camley_core::Error::validation("name", "must not be empty").into());
    }

    self
      .transact(move |conn, outbox, ctx| {
        let before = account(conn, id)?;
        let email = patch.email.as_deref().map(normalize_email).unwrap_or(before.email.clone());
        conn
          .execute(
            "UPDATE accounts SET name = ?2, email = ?3, phone = ?4, active = ?5
             WHERE account_id = ?1",
            params![
              encode_uuid(id),
              patch.name.map(|n| n.trim().to_owned()).unwrap_or(before.name.clone()),
              email,
              patch.phone.or(before.phone.clone()),
              patch.active.unwrap_or(before.active),
            ],
          )
          .map_err(|e| unique_or(e, || format!("email {email} is already registered")))?;
        let after = account(conn, id)?;
        if after.active != before.active {
          activation_notice(conn, outbox, ctx, &after)?;
        }
        Ok(after)
      })
      .await
  }

  async fn set_active(&self, caller: Caller, id: Uuid, active: bool) -> Result<Account> {
    authorize(&caller, Action::ManageAccounts)?;
    let account = self
      .transact(move |conn, outbox, ctx| {
        account(conn, id)?;
        conn.execute(
          "UPDATE accounts SET active = ?2 WHERE account_id = ?1",
          params![encode_uuid(id), active],
        )?;
        let account = account(conn, id)?;
        activation_notice(conn, outbox, ctx, &account)?;
        Ok(account)
      })
      .await?;
    tracing::info!(account_id = %id, active, "account access changed");
    Ok(account)
  }

  async fn delete_account(&self, caller: Caller, id: Uuid) -> Result<Account> {
    authorize(&caller, Action::ManageAccounts)?;
    if caller.account_id == id {
      return Err(camley_core::Error::Conflict("cannot delete your own account".into()).into());
    }
    self
      .transact(move |conn, _, _| {
        let account = account(conn, id)?;
        conn.execute("DELETE FROM accounts WHERE account_id = ?1", params![encode_uuid(id)])?;
        Ok(account)
      })
      .await
  }
}
