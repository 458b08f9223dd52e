//! Storage traits, one per component, and the [`TransportStore`] umbrella.
//!
//! Traits are implemented by storage backends (e.g. `camley-store-sqlite`).
//! The API layer depends on these abstractions, not on any concrete backend.
//!
//! Every operation that acts on behalf of a user takes the [`Caller`] and is
//! responsible for running it through [`crate::auth::authorize`] before
//! touching data. Each mutating operation is atomic: either all of its steps
//! (including the notifications it emits) are persisted, or none are.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  DomainError,
  account::{Account, AccountPatch, AccountQuery, Caller, Credentials, NewAccount},
  attendance::{AttendanceRecord, ManualSummary, ManualSummaryInput, NewAttendance},
  billing::{
    Expense, Income, NewExpense, NewIncome, NewPayment, Payment, PaymentPatch, PaymentQuery,
  },
  fleet::{NewRoute, NewVehicle, Route, RunStatus, Vehicle, VehiclePatch, VehicleStatus},
  location::{Coordinates, FleetPosition, Location, LocationPoint},
  notification::{
    DelayReport, DriverReport, NewNotification, NewPushSubscription, Notification,
    PushSubscription,
  },
  report::{AttendanceReport, DailyAttendance, Dashboard, FinanceSummary},
  roster::{Enrollment, NewStudent, Student, StudentPatch, StudentQuery, StudentRemoval},
  support::{NewTicket, Ticket, TicketAnswer},
};

/// Common root of the component traits: fixes the backend's error type.
pub trait Backend: Send + Sync {
  type Error: DomainError;
}

// ─── Account Directory ───────────────────────────────────────────────────────

pub trait AccountStore: Backend {
  /// Register a new account. `caller` is `None` for self-registration.
  ///
  /// Fails with a conflict if the email is taken. Role and activation follow
  /// [`crate::account::admission`]. The administrator is notified of new
  /// parents and drivers.
  fn register(
    &self,
    caller: Option<Caller>,
    input: NewAccount,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  /// Create the administrator described by `input` unless an account with
  /// that email already exists. Returns the existing or new account.
  fn ensure_admin(
    &self,
    input: NewAccount,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  /// Look up login material by email. Not caller-gated: this is how a caller
  /// comes to exist.
  fn credentials(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + '_;

  /// Administrators may read any account; others only their own.
  fn get_account(
    &self,
    caller: Caller,
    id: Uuid,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  fn list_accounts(
    &self,
    caller: Caller,
    query: AccountQuery,
  ) -> impl Future<Output = Result<Vec<Account>, Self::Error>> + Send + '_;

  fn update_account(
    &self,
    caller: Caller,
    id: Uuid,
    patch: AccountPatch,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  /// Grant or revoke access and notify the affected account.
  fn set_active(
    &self,
    caller: Caller,
    id: Uuid,
    active: bool,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  /// Delete an account. Students, routes, and vehicles pointing at it keep
  /// existing with the link cleared.
  fn delete_account(
    &self,
    caller: Caller,
    id: Uuid,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;
}

// ─── Roster ──────────────────────────────────────────────────────────────────

pub trait RosterStore: Backend {
  /// Enroll a student and open its first billing cycle: one pending payment of
  /// the policy's default amount due `due_days` from now. The parent, if any,
  /// is notified with the due date.
  ///
  /// Fails with a conflict if the same name, grade, school, and parent are
  /// already enrolled.
  fn enroll(
    &self,
    caller: Caller,
    input: NewStudent,
  ) -> impl Future<Output = Result<Enrollment, Self::Error>> + Send + '_;

  fn get_student(
    &self,
    caller: Caller,
    id: Uuid,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + '_;

  /// Administrators see every student matching `query`; parents only their
  /// children; drivers only the students on their route.
  fn list_students(
    &self,
    caller: Caller,
    query: StudentQuery,
  ) -> impl Future<Output = Result<Vec<Student>, Self::Error>> + Send + '_;

  fn update_student(
    &self,
    caller: Caller,
    id: Uuid,
    patch: StudentPatch,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + '_;

  /// Delete a student together with all of its payments and attendance.
  fn delete_student(
    &self,
    caller: Caller,
    id: Uuid,
  ) -> impl Future<Output = Result<StudentRemoval, Self::Error>> + Send + '_;
}

// ─── Route/Vehicle Registry ──────────────────────────────────────────────────

pub trait FleetStore: Backend {
  /// Fails with a conflict if a route with the same name and window exists.
  /// A driver given at creation is notified.
  fn create_route(
    &self,
    caller: Caller,
    input: NewRoute,
  ) -> impl Future<Output = Result<Route, Self::Error>> + Send + '_;

  fn get_route(
    &self,
    caller: Caller,
    id: Uuid,
  ) -> impl Future<Output = Result<Route, Self::Error>> + Send + '_;

  fn list_routes(
    &self,
    caller: Caller,
  ) -> impl Future<Output = Result<Vec<Route>, Self::Error>> + Send + '_;

  /// Full-record edit. A driver change notifies both drivers, as
  /// [`FleetStore::assign_route_driver`] does.
  fn update_route(
    &self,
    caller: Caller,
    id: Uuid,
    input: NewRoute,
  ) -> impl Future<Output = Result<Route, Self::Error>> + Send + '_;

  fn set_route_active(
    &self,
    caller: Caller,
    id: Uuid,
    active: bool,
  ) -> impl Future<Output = Result<Route, Self::Error>> + Send + '_;

  /// Delete a route; its students stay enrolled with no route.
  fn delete_route(
    &self,
    caller: Caller,
    id: Uuid,
  ) -> impl Future<Output = Result<Route, Self::Error>> + Send + '_;

  fn route_students(
    &self,
    caller: Caller,
    id: Uuid,
  ) -> impl Future<Output = Result<Vec<Student>, Self::Error>> + Send + '_;

  /// Put `driver_id` on the route, notifying the new driver and the one it
  /// replaces.
  fn assign_route_driver(
    &self,
    caller: Caller,
    route_id: Uuid,
    driver_id: Uuid,
  ) -> impl Future<Output = Result<Route, Self::Error>> + Send + '_;

  /// Fails with a conflict if the plate is already registered.
  fn create_vehicle(
    &self,
    caller: Caller,
    input: NewVehicle,
  ) -> impl Future<Output = Result<Vehicle, Self::Error>> + Send + '_;

  fn get_vehicle(
    &self,
    caller: Caller,
    id: Uuid,
  ) -> impl Future<Output = Result<Vehicle, Self::Error>> + Send + '_;

  fn list_vehicles(
    &self,
    caller: Caller,
  ) -> impl Future<Output = Result<Vec<Vehicle>, Self::Error>> + Send + '_;

  fn update_vehicle(
    &self,
    caller: Caller,
    id: Uuid,
    patch: VehiclePatch,
  ) -> impl Future<Output = Result<Vehicle, Self::Error>> + Send + '_;

  /// Moving a vehicle into maintenance stamps its last maintenance time.
  fn set_vehicle_status(
    &self,
    caller: Caller,
    id: Uuid,
    status: VehicleStatus,
  ) -> impl Future<Output = Result<Vehicle, Self::Error>> + Send + '_;

  /// Give `vehicle_id` to `driver_id`. If the driver currently runs a route,
  /// that route's vehicle is updated too.
  fn assign_vehicle(
    &self,
    caller: Caller,
    driver_id: Uuid,
    vehicle_id: Uuid,
  ) -> impl Future<Output = Result<Vehicle, Self::Error>> + Send + '_;

  /// Delete a vehicle; routes using it keep existing with no vehicle.
  fn delete_vehicle(
    &self,
    caller: Caller,
    id: Uuid,
  ) -> impl Future<Output = Result<Vehicle, Self::Error>> + Send + '_;
}

// ─── Billing Ledger ──────────────────────────────────────────────────────────

pub trait BillingStore: Backend {
  /// Create a payment in the given status. A payment created already paid is
  /// stamped and produces a deduplicated income entry. The parent is
  /// notified of the charge.
  fn register_payment(
    &self,
    caller: Caller,
    input: NewPayment,
  ) -> impl Future<Output = Result<Payment, Self::Error>> + Send + '_;

  /// Transition a payment to paid, stamp the paid date and method, and derive
  /// its income entry unless an equivalent one was recorded within the
  /// policy's dedupe window. Marking an already-paid payment changes nothing.
  fn mark_paid(
    &self,
    caller: Caller,
    id: Uuid,
    method: Option<String>,
  ) -> impl Future<Output = Result<Payment, Self::Error>> + Send + '_;

  /// Explicit edit; the only way to alter a paid payment.
  fn update_payment(
    &self,
    caller: Caller,
    id: Uuid,
    patch: PaymentPatch,
  ) -> impl Future<Output = Result<Payment, Self::Error>> + Send + '_;

  fn delete_payment(
    &self,
    caller: Caller,
    id: Uuid,
  ) -> impl Future<Output = Result<Payment, Self::Error>> + Send + '_;

  /// Delete every pending payment whose due date has passed and return how
  /// many were removed. Paid payments are never touched. Irreversible.
  fn purge_overdue(
    &self,
    caller: Caller,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Parents only ever see payments of their own children.
  fn list_payments(
    &self,
    caller: Caller,
    query: PaymentQuery,
  ) -> impl Future<Output = Result<Vec<Payment>, Self::Error>> + Send + '_;

  /// A parent acknowledges a payment of one of their children.
  fn mark_payment_seen(
    &self,
    caller: Caller,
    id: Uuid,
  ) -> impl Future<Output = Result<Payment, Self::Error>> + Send + '_;

  fn record_income(
    &self,
    caller: Caller,
    input: NewIncome,
  ) -> impl Future<Output = Result<Income, Self::Error>> + Send + '_;

  fn record_expense(
    &self,
    caller: Caller,
    input: NewExpense,
  ) -> impl Future<Output = Result<Expense, Self::Error>> + Send + '_;

  fn delete_income(
    &self,
    caller: Caller,
    id: Uuid,
  ) -> impl Future<Output = Result<Income, Self::Error>> + Send + '_;

  fn delete_expense(
    &self,
    caller: Caller,
    id: Uuid,
  ) -> impl Future<Output = Result<Expense, Self::Error>> + Send + '_;
}

// ─── Attendance Log ──────────────────────────────────────────────────────────

pub trait AttendanceStore: Backend {
  /// Record today's attendance for a student on the calling driver's route
  /// and notify the parent.
  ///
  /// Fails with forbidden if the student rides another route, and with a
  /// conflict if the student already has a record today.
  fn record_attendance(
    &self,
    caller: Caller,
    input: NewAttendance,
  ) -> impl Future<Output = Result<AttendanceRecord, Self::Error>> + Send + '_;

  /// Insert or replace the calling driver's manual summary for today.
  fn save_manual_summary(
    &self,
    caller: Caller,
    input: ManualSummaryInput,
  ) -> impl Future<Output = Result<ManualSummary, Self::Error>> + Send + '_;

  /// Move the calling driver's run to `status`; see [`RunStatus`].
  fn set_run_status(
    &self,
    caller: Caller,
    status: RunStatus,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Notification Outbox ─────────────────────────────────────────────────────

pub trait OutboxStore: Backend {
  /// Persist a notification for `input.recipient_id` and hand it to the push
  /// sender after commit.
  fn notify(
    &self,
    caller: Caller,
    input: NewNotification,
  ) -> impl Future<Output = Result<Notification, Self::Error>> + Send + '_;

  /// Newest first. Users read only their own unless administrator.
  fn list_notifications(
    &self,
    caller: Caller,
    recipient_id: Uuid,
    limit: u32,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + '_;

  fn unread_count(
    &self,
    caller: Caller,
    recipient_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn mark_read(
    &self,
    caller: Caller,
    id: Uuid,
  ) -> impl Future<Output = Result<Notification, Self::Error>> + Send + '_;

  /// Mark every notification of the caller read; returns how many changed.
  fn mark_all_read(
    &self,
    caller: Caller,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Register (or re-home) a push endpoint for the caller.
  fn subscribe_push(
    &self,
    caller: Caller,
    input: NewPushSubscription,
  ) -> impl Future<Output = Result<PushSubscription, Self::Error>> + Send + '_;

  /// Returns whether a subscription of the caller was removed.
  fn unsubscribe_push(
    &self,
    caller: Caller,
    endpoint: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Tell every parent on the calling driver's route about a delay, and the
  /// administrator. Returns the number of parents notified.
  fn report_delay(
    &self,
    caller: Caller,
    input: DelayReport,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Problems go to the administrator; other kinds to the route's parents.
  /// Returns the number of notifications created.
  fn driver_report(
    &self,
    caller: Caller,
    input: DriverReport,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}

// ─── Location tracking ───────────────────────────────────────────────────────

pub trait TrackingStore: Backend {
  /// Replace the calling driver's latest position and append it to history.
  fn update_location(
    &self,
    caller: Caller,
    position: Coordinates,
  ) -> impl Future<Output = Result<Location, Self::Error>> + Send + '_;

  /// Parents may only locate drivers of routes their children ride.
  fn latest_location(
    &self,
    caller: Caller,
    driver_id: Uuid,
  ) -> impl Future<Output = Result<Location, Self::Error>> + Send + '_;

  /// Oldest first, at most `limit` most recent points.
  fn location_history(
    &self,
    caller: Caller,
    driver_id: Uuid,
    limit: u32,
  ) -> impl Future<Output = Result<Vec<LocationPoint>, Self::Error>> + Send + '_;

  fn fleet_positions(
    &self,
    caller: Caller,
  ) -> impl Future<Output = Result<Vec<FleetPosition>, Self::Error>> + Send + '_;
}

// ─── Support ─────────────────────────────────────────────────────────────────

pub trait SupportStore: Backend {
  fn open_ticket(
    &self,
    caller: Caller,
    input: NewTicket,
  ) -> impl Future<Output = Result<Ticket, Self::Error>> + Send + '_;

  fn answer_ticket(
    &self,
    caller: Caller,
    id: Uuid,
    input: TicketAnswer,
  ) -> impl Future<Output = Result<Ticket, Self::Error>> + Send + '_;

  fn list_tickets(
    &self,
    caller: Caller,
  ) -> impl Future<Output = Result<Vec<Ticket>, Self::Error>> + Send + '_;
}

// ─── Reports ─────────────────────────────────────────────────────────────────

pub trait ReportStore: Backend {
  fn dashboard(
    &self,
    caller: Caller,
  ) -> impl Future<Output = Result<Dashboard, Self::Error>> + Send + '_;

  fn finance_summary(
    &self,
    caller: Caller,
  ) -> impl Future<Output = Result<FinanceSummary, Self::Error>> + Send + '_;

  fn daily_attendance(
    &self,
    caller: Caller,
    date: NaiveDate,
  ) -> impl Future<Output = Result<DailyAttendance, Self::Error>> + Send + '_;

  fn attendance_report(
    &self,
    caller: Caller,
    driver_id: Uuid,
    date: NaiveDate,
  ) -> impl Future<Output = Result<AttendanceReport, Self::Error>> + Send + '_;
}

// ─── Umbrella ────────────────────────────────────────────────────────────────

/// Everything the service needs from a backend.
pub trait TransportStore:
  AccountStore
  + RosterStore
  + FleetStore
  + BillingStore
  + AttendanceStore
  + OutboxStore
  + TrackingStore
  + SupportStore
  + ReportStore
{
}

impl<T> TransportStore for T where
  T: AccountStore
    + RosterStore
    + FleetStore
    + BillingStore
    + AttendanceStore
    + OutboxStore
    + TrackingStore
    + SupportStore
    + ReportStore
{
}
