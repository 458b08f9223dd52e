//! Notification texts in each supported locale.
//!
//! The locale is a deployment setting. Ledger descriptions derived from
//! payments are produced here too, so changing the locale of a running
//! deployment resets the ledger dedupe key.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
  account::Role,
  attendance::AttendanceStatus,
  notification::DriverReportKind,
  support::Priority,
};

/// Title used for push deliveries.
pub const PUSH_TITLE: &str = "Camley Transporte";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
  En,
  #[default]
  Es,
}

fn day(at: DateTime<Utc>) -> String { at.format("%d/%m/%Y").to_string() }

impl Locale {
  // ── Accounts ───────────────────────────────────────────────────────────

  pub fn parent_pending(self, name: &str) -> String {
    match self {
      Self::En => format!("New parent registered: {name}. Requires approval."),
      Self::Es => format!("Nuevo padre registrado: {name}. Requiere aprobación."),
    }
  }

  pub fn driver_created(self, name: &str) -> String {
    match self {
      Self::En => format!("New driver created: {name}"),
      Self::Es => format!("Nuevo conductor creado: {name}"),
    }
  }

  pub fn account_activated(self, role: Role) -> String {
    match (self, role) {
      (Self::En, Role::Driver) => "Your driver account has been approved".into(),
      (Self::En, _) => "Your account has been approved".into(),
      (Self::Es, Role::Driver) => "Tu cuenta de conductor ha sido aprobada".into(),
      (Self::Es, Role::Parent) => "Tu cuenta de padre ha sido aprobada".into(),
      (Self::Es, Role::Admin) => "Tu cuenta ha sido aprobada".into(),
    }
  }

  pub fn account_deactivated(self) -> String {
    match self {
      Self::En => "Your account has been deactivated by the administrator".into(),
      Self::Es => "Tu cuenta ha sido desactivada por el administrador".into(),
    }
  }

  // ── Roster and billing ─────────────────────────────────────────────────

  pub fn enrolled(self, student: &str, due: DateTime<Utc>) -> String {
    match self {
      Self::En => format!("{student} has been enrolled. First payment due {}", day(due)),
      Self::Es => format!("{student} ha sido inscrito(a). Primer pago vence {}", day(due)),
    }
  }

  pub fn student_withdrawn(self, student: &str) -> String {
    match self {
      Self::En => format!("{student} has been withdrawn from the service"),
      Self::Es => format!("{student} ha sido dado de baja del sistema"),
    }
  }

  pub fn payment_registered(self, amount: Decimal, student: &str, due: DateTime<Utc>) -> String {
    match self {
      Self::En => format!("New payment: C$ {amount} for {student}. Due: {}", day(due)),
      Self::Es => format!("Nuevo pago: C$ {amount} por {student}. Vence: {}", day(due)),
    }
  }

  /// Description of the income entry derived from a student's payment.
  pub fn payment_income(self, student: &str) -> String {
    match self {
      Self::En => format!("Payment from {student}"),
      Self::Es => format!("Pago de {student}"),
    }
  }

  // ── Fleet ──────────────────────────────────────────────────────────────

  pub fn route_assigned(self, route: &str) -> String {
    match self {
      Self::En => format!("You have been assigned to route: {route}"),
      Self::Es => format!("Has sido asignado a la ruta: {route}"),
    }
  }

  pub fn route_unassigned(self, route: &str) -> String {
    match self {
      Self::En => format!("You have been unassigned from route: {route}"),
      Self::Es => format!("Has sido desasignado de la ruta: {route}"),
    }
  }

  // ── Attendance ─────────────────────────────────────────────────────────

  pub fn attendance_label(self, status: AttendanceStatus) -> &'static str {
    match (self, status) {
      (Self::En, AttendanceStatus::Present) => "present",
      (Self::En, AttendanceStatus::Absent) => "absent",
      (Self::En, AttendanceStatus::Late) => "late",
      (Self::Es, AttendanceStatus::Present) => "presente",
      (Self::Es, AttendanceStatus::Absent) => "ausente",
      (Self::Es, AttendanceStatus::Late) => "con tardanza",
    }
  }

  pub fn attendance_marked(self, student: &str, status: AttendanceStatus) -> String {
    let label = self.attendance_label(status);
    match self {
      Self::En => format!("{student} marked {label} today"),
      Self::Es => format!("{student} marcado como {label} hoy"),
    }
  }

  pub fn run_finished(self, driver: &str) -> String {
    match self {
      Self::En => format!("Route finished by {driver}. Attendance report available."),
      Self::Es => format!("Ruta finalizada por {driver}. Reporte disponible para descargar."),
    }
  }

  // ── Driver broadcasts ──────────────────────────────────────────────────

  pub fn default_eta(self) -> &'static str {
    match self {
      Self::En => "15-20 minutes",
      Self::Es => "15-20 minutos",
    }
  }

  pub fn delay_for_parents(self, reason: &str, eta: &str) -> String {
    match self {
      Self::En => format!("Delay on the route: {reason}. Estimated time: {eta}"),
      Self::Es => format!("Retraso en la ruta: {reason}. Tiempo estimado: {eta}"),
    }
  }

  pub fn delay_for_admin(self, driver: &str, reason: &str) -> String {
    match self {
      Self::En => format!("Driver {driver} reports a delay: {reason}"),
      Self::Es => format!("Conductor {driver} reporta retraso: {reason}"),
    }
  }

  pub fn default_report(self, kind: DriverReportKind) -> &'static str {
    match (self, kind) {
      (Self::En, DriverReportKind::Delay) => {
        "Dear parents, the vehicle will arrive with a short delay."
      }
      (Self::En, DriverReportKind::Arrival) => {
        "Dear parent, the vehicle has arrived and your child is at school."
      }
      (Self::En, DriverReportKind::Problem) => "Problem reported by the driver.",
      (Self::Es, DriverReportKind::Delay) => {
        "Lamentamos informarles estimados padres de que la unidad tendrá un pequeño retraso en llegar."
      }
      (Self::Es, DriverReportKind::Arrival) => {
        "Estimado padre, la unidad ha llegado a su destino y su hijo se encuentra ya en su centro de estudio."
      }
      (Self::Es, DriverReportKind::Problem) => "Reporte de problema por parte del conductor.",
    }
  }

  pub fn problem_for_admin(self, driver: &str, message: &str) -> String {
    format!("{driver}: {message}")
  }

  // ── Support ────────────────────────────────────────────────────────────

  pub fn ticket_opened(
    self,
    sender: &str,
    email: &str,
    subject: &str,
    priority: Priority,
    message: &str,
  ) -> String {
    format!("{sender} ({email}) - {subject} [{priority}]: {message}")
  }

  pub fn ticket_answered(self, answer: &str) -> String {
    match self {
      Self::En => format!("Support answer: {answer}"),
      Self::Es => format!("Respuesta de soporte: {answer}"),
    }
  }

  pub fn ticket_forwarded(self, answer: &str) -> String {
    match self {
      Self::En => format!("Support: {answer}"),
      Self::Es => format!("Soporte: {answer}"),
    }
  }

  pub fn ticket_answered_by_driver(self, answer: &str) -> String {
    match self {
      Self::En => format!("Answer from the driver: {answer}"),
      Self::Es => format!("Respuesta del conductor: {answer}"),
    }
  }

  pub fn driver_answer_for_admin(self, driver: &str, answer: &str) -> String {
    match self {
      Self::En => format!("Answer from driver {driver}: {answer}"),
      Self::Es => format!("Respuesta del conductor {driver}: {answer}"),
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn enrollment_message_carries_due_date() {
    let due = Utc.with_ymd_and_hms(2026, 3, 9, 9, 0, 0).unwrap();
    assert_eq!(
      Locale::En.enrolled("Ana", due),
      "Ana has been enrolled. First payment due 09/03/2026"
    );
  }

  #[test]
  fn attendance_labels_are_localized() {
    assert_eq!(Locale::Es.attendance_label(AttendanceStatus::Late), "con tardanza");
    assert_eq!(
      Locale::En.attendance_marked("Ana", AttendanceStatus::Absent),
      "Ana marked absent today"
    );
  }
}
