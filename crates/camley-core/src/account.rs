//! Account Directory types.
//!
//! Every person who signs in holds exactly one [`Role`], assigned at creation.
//! Nobody can create an administrator through registration; the only path is
//! the startup bootstrap.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

/// The closed set of roles. Authorization matches on this exhaustively; see
/// [`crate::auth`].
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Admin,
  Parent,
  Driver,
}

/// A stored account, without its password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
  pub account_id:    Uuid,
  pub name:          String,
  pub email:         String,
  pub phone:         Option<String>,
  pub address:       Option<String>,
  pub gender:        Option<String>,
  pub role:          Role,
  pub active:        bool,
  pub registered_at: DateTime<Utc>,
}

/// Input to [`crate::store::AccountStore::register`].
///
/// The password arrives already hashed; hashing belongs to the transport
/// layer.
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub name:          String,
  pub email:         String,
  pub password_hash: String,
  pub phone:         Option<String>,
  pub address:       Option<String>,
  pub gender:        Option<String>,
  pub role:          Role,
  /// Honoured only when an administrator creates a driver.
  pub active:        Option<bool>,
}

impl NewAccount {
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::validation("name", "must not be empty"));
    }
    validate_email(&self.email)?;
    if self.password_hash.is_empty() {
      return Err(Error::validation("password", "must not be empty"));
    }
    if self.gender.as_deref().is_none_or(|g| g.trim().is_empty()) {
      return Err(Error::validation("gender", "is required"));
    }
    Ok(())
  }
}

pub fn validate_email(email: &str) -> Result<()> {
  match email.split_once('@') {
    Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
    _ => Err(Error::validation("email", format!("{email:?} is not an address"))),
  }
}

/// Decide the role and activation state of a registration.
///
/// - `admin` can never be requested.
/// - `driver` requires an administrator caller; the administrator may create
///   the account already active.
/// - Everything else is a parent, created inactive pending approval.
pub fn admission(
  caller: Option<&Caller>,
  requested: Role,
  requested_active: Option<bool>,
) -> Result<(Role, bool)> {
  let by_admin = caller.is_some_and(|c| c.role == Role::Admin);
  match requested {
    Role::Admin => Err(Error::Forbidden(
      "administrator accounts cannot be registered".into(),
    )),
    Role::Driver if by_admin => Ok((Role::Driver, requested_active.unwrap_or(false))),
    Role::Driver => Err(Error::Forbidden(
      "only an administrator may create driver accounts".into(),
    )),
    Role::Parent => Ok((Role::Parent, false)),
  }
}

/// Partial update applied by an administrator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountPatch {
  pub name:   Option<String>,
  pub email:  Option<String>,
  pub phone:  Option<String>,
  pub active: Option<bool>,
}

/// Filter for [`crate::store::AccountStore::list_accounts`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountQuery {
  pub role:   Option<Role>,
  pub active: Option<bool>,
}

/// What the authentication layer needs to verify a login.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub account_id:    Uuid,
  pub role:          Role,
  pub active:        bool,
  pub password_hash: String,
}

/// The authenticated principal on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
  pub account_id: Uuid,
  pub role:       Role,
}

impl Caller {
  pub fn new(account_id: Uuid, role: Role) -> Self { Self { account_id, role } }

  pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn admin() -> Caller { Caller::new(Uuid::new_v4(), Role::Admin) }

  #[test]
  fn admin_role_is_never_admitted() {
    assert!(matches!(
      admission(Some(&admin()), Role::Admin, None),
      Err(Error::Forbidden(_))
    ));
    assert!(matches!(admission(None, Role::Admin, None), Err(Error::Forbidden(_))));
  }

  #[test]
  fn driver_requires_admin_caller() {
    let parent = Caller::new(Uuid::new_v4(), Role::Parent);
    assert!(admission(None, Role::Driver, None).is_err());
    assert!(admission(Some(&parent), Role::Driver, Some(true)).is_err());
    assert_eq!(
      admission(Some(&admin()), Role::Driver, Some(true)).unwrap(),
      (Role::Driver, true)
    );
    assert_eq!(
      admission(Some(&admin()), Role::Driver, None).unwrap(),
      (Role::Driver, false)
    );
  }

  #[test]
  fn parents_start_inactive() {
    assert_eq!(admission(None, Role::Parent, Some(true)).unwrap(), (Role::Parent, false));
  }

  #[test]
  fn email_validation() {
    assert!(validate_email("ana@camley.com").is_ok());
    assert!(validate_email("ana").is_err());
    assert!(validate_email("@camley.com").is_err());
  }
}
