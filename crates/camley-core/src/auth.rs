//! The authorization table.
//!
//! Every store operation names its [`Action`] and calls [`authorize`] before
//! touching data. The mapping from action to permitted roles is a single
//! exhaustive `match`, so adding an action without deciding who may perform
//! it does not compile.
//!
//! Resource-level ownership (a driver's own route, a parent's own child) is
//! checked inside the individual operations after this gate.

use strum::{AsRefStr, Display};

use crate::{
  Error, Result,
  account::{Caller, Role},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
  // ── Accounts ─────────────────────────────────────────────────────────────
  ViewAccount,
  ManageAccounts,

  // ── Roster ───────────────────────────────────────────────────────────────
  EnrollStudent,
  EditStudent,
  DeleteStudent,
  ViewStudents,

  // ── Fleet ────────────────────────────────────────────────────────────────
  ManageRoutes,
  ManageVehicles,
  ViewFleet,

  // ── Billing ──────────────────────────────────────────────────────────────
  ManagePayments,
  ViewPayments,
  AcknowledgePayment,
  ManageFinance,

  // ── Attendance ───────────────────────────────────────────────────────────
  RecordAttendance,
  ReviewAttendance,
  SetRunStatus,

  // ── Driver field operations ──────────────────────────────────────────────
  BroadcastFromDriver,
  ReportLocation,
  ViewLocation,
  ViewFleetPositions,

  // ── Outbox ───────────────────────────────────────────────────────────────
  ReadNotifications,
  SendNotification,
  ManagePushSubscription,

  // ── Support ──────────────────────────────────────────────────────────────
  OpenTicket,
  AnswerTicket,
  ViewTickets,

  // ── Reporting ────────────────────────────────────────────────────────────
  ViewDashboard,
}

const ANYONE: &[Role] = &[Role::Admin, Role::Parent, Role::Driver];
const ADMIN: &[Role] = &[Role::Admin];
const DRIVER: &[Role] = &[Role::Driver];
const PARENT: &[Role] = &[Role::Parent];

impl Action {
  /// The roles permitted to perform this action.
  pub fn permitted(self) -> &'static [Role] {
    match self {
      Self::ViewAccount => ANYONE,
      Self::ManageAccounts => ADMIN,

      Self::EnrollStudent => ADMIN,
      Self::EditStudent => ADMIN,
      Self::DeleteStudent => ADMIN,
      Self::ViewStudents => ANYONE,

      Self::ManageRoutes => ADMIN,
      Self::ManageVehicles => ADMIN,
      Self::ViewFleet => ANYONE,

      Self::ManagePayments => ADMIN,
      Self::ViewPayments => &[Role::Admin, Role::Parent],
      Self::AcknowledgePayment => PARENT,
      Self::ManageFinance => ADMIN,

      Self::RecordAttendance => DRIVER,
      Self::ReviewAttendance => ADMIN,
      Self::SetRunStatus => DRIVER,

      Self::BroadcastFromDriver => DRIVER,
      Self::ReportLocation => DRIVER,
      Self::ViewLocation => ANYONE,
      Self::ViewFleetPositions => ADMIN,

      Self::ReadNotifications => ANYONE,
      Self::SendNotification => ADMIN,
      Self::ManagePushSubscription => ANYONE,

      Self::OpenTicket => ANYONE,
      Self::AnswerTicket => &[Role::Admin, Role::Driver],
      Self::ViewTickets => ANYONE,

      Self::ViewDashboard => ADMIN,
    }
  }
}

/// Reject `caller` unless its role may perform `action`.
pub fn authorize(caller: &Caller, action: Action) -> Result<()> {
  if action.permitted().contains(&caller.role) {
    Ok(())
  } else {
    Err(Error::Forbidden(format!("{} may not {}", caller.role, action)))
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  fn caller(role: Role) -> Caller { Caller::new(Uuid::new_v4(), role) }

  #[test]
  fn admin_only_actions_reject_other_roles() {
    for action in [Action::EnrollStudent, Action::ManagePayments, Action::ManageRoutes] {
      assert!(authorize(&caller(Role::Admin), action).is_ok());
      assert!(authorize(&caller(Role::Parent), action).is_err());
      assert!(authorize(&caller(Role::Driver), action).is_err());
    }
  }

  #[test]
  fn attendance_is_entered_by_drivers_only() {
    assert!(authorize(&caller(Role::Driver), Action::RecordAttendance).is_ok());
    assert!(authorize(&caller(Role::Admin), Action::RecordAttendance).is_err());
  }

  #[test]
  fn forbidden_message_names_role_and_action() {
    let err = authorize(&caller(Role::Parent), Action::DeleteStudent).unwrap_err();
    assert_eq!(err.to_string(), "forbidden: parent may not delete_student");
  }
}
