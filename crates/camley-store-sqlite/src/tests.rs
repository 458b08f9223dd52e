//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::{
  Arc, Mutex,
  atomic::{AtomicBool, Ordering},
};

use camley_core::{
  DomainError, ErrorKind,
  account::{Caller, NewAccount, Role},
  attendance::{AttendanceStatus, ManualSummaryInput, NewAttendance},
  billing::{IncomeSource, NewIncome, NewPayment, PaymentFilter, PaymentQuery, PaymentStatus},
  clock::Clock,
  fleet::{NewRoute, NewVehicle, RunStatus, VehicleStatus},
  location::Coordinates,
  messages::Locale,
  notification::{DelayReport, DriverReport, DriverReportKind, NewPushSubscription, PushKeys},
  push::{PushError, PushFuture, PushMessage, PushSender},
  roster::{NewStudent, StudentQuery},
  store::{
    AccountStore, AttendanceStore, BillingStore, FleetStore, OutboxStore, ReportStore,
    RosterStore, SupportStore, TrackingStore,
  },
  support::{NewTicket, Priority, TicketAnswer, TicketStatus},
};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
  Error, SqliteStore,
  encode::{encode_dt, encode_uuid},
};

// ─── Fixtures ────────────────────────────────────────────────────────────────

struct TestClock(Mutex<DateTime<Utc>>);

impl TestClock {
  fn advance(&self, by: TimeDelta) { *self.0.lock().unwrap() += by; }
}

impl Clock for TestClock {
  fn now(&self) -> DateTime<Utc> { *self.0.lock().unwrap() }
}

#[derive(Default)]
struct RecordingPush {
  delivered: Mutex<Vec<PushMessage>>,
  fail:      AtomicBool,
}

impl PushSender for RecordingPush {
  fn deliver<'a>(&'a self, message: &'a PushMessage) -> PushFuture<'a> {
    Box::pin(async move {
      self.delivered.lock().unwrap().push(message.clone());
      if self.fail.load(Ordering::SeqCst) {
        Err(PushError("relay unreachable".into()))
      } else {
        Ok(())
      }
    })
  }
}

struct Fixture {
  store: SqliteStore,
  clock: Arc<TestClock>,
  push:  Arc<RecordingPush>,
  admin: Caller,
}

/// Monday 2026-03-02 09:00 UTC.
fn start() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap() }

async fn fixture() -> Fixture {
  let clock = Arc::new(TestClock(Mutex::new(start())));
  let push = Arc::new(RecordingPush::default());
  let store = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
    .with_clock(clock.clone())
    .with_push(push.clone())
    .with_locale(Locale::En);
  let admin = store
    .ensure_admin(account_input("Admin", "admin@camley.test", Role::Admin))
    .await
    .unwrap();
  Fixture { store, clock, push, admin: Caller::new(admin.account_id, Role::Admin) }
}

fn account_input(name: &str, email: &str, role: Role) -> NewAccount {
  NewAccount {
    name:          name.into(),
    email:         email.into(),
    password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
    phone:         None,
    address:       None,
    gender:        Some("F".into()),
    role,
    active:        None,
  }
}

impl Fixture {
  async fn parent(&self, name: &str) -> Caller {
    let email = format!("{}@parents.test", name.to_lowercase());
    let account = self.store.register(None, account_input(name, &email, Role::Parent)).await.unwrap();
    self.store.set_active(self.admin, account.account_id, true).await.unwrap();
    Caller::new(account.account_id, Role::Parent)
  }

  async fn driver(&self, name: &str) -> Caller {
    let email = format!("{}@drivers.test", name.to_lowercase());
    let mut input = account_input(name, &email, Role::Driver);
    input.active = Some(true);
    let account = self.store.register(Some(self.admin), input).await.unwrap();
    Caller::new(account.account_id, Role::Driver)
  }

  async fn route(&self, name: &str, driver: Option<&Caller>) -> Uuid {
    self
      .store
      .create_route(self.admin, NewRoute {
        name:        name.into(),
        description: None,
        starts_at:   "06:30".into(),
        ends_at:     "07:45".into(),
        driver_id:   driver.map(|d| d.account_id),
        vehicle_id:  None,
      })
      .await
      .unwrap()
      .route_id
  }

  async fn enroll(&self, name: &str, parent: Option<&Caller>, route: Option<Uuid>) -> Uuid {
    self
      .store
      .enroll(self.admin, student_input(name, parent, route))
      .await
      .unwrap()
      .student
      .student_id
  }

  async fn income_count(&self) -> usize {
    self.store.finance_summary(self.admin).await.unwrap().recent_income.len()
  }
}

fn student_input(name: &str, parent: Option<&Caller>, route: Option<Uuid>) -> NewStudent {
  NewStudent {
    name:      name.into(),
    age:       Some(9),
    gender:    Some("F".into()),
    grade:     "4".into(),
    school:    "Colegio Central".into(),
    condition: None,
    parent_id: parent.map(|p| p.account_id),
    route_id:  route,
  }
}

fn kind(err: &Error) -> ErrorKind { err.kind() }

// ─── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn parents_register_inactive_and_admin_is_told() {
  let f = fixture().await;
  let account = f
    .store
    .register(None, account_input("Marta", "marta@parents.test", Role::Parent))
    .await
    .unwrap();
  assert_eq!(account.role, Role::Parent);
  assert!(!account.active);

  let inbox = f.store.list_notifications(f.admin, f.admin.account_id, 20).await.unwrap();
  assert_eq!(inbox.len(), 1);
  assert!(inbox[0].message.contains("Marta"));
}

#[tokio::test]
async fn admin_and_unauthorised_driver_registration_are_refused() {
  let f = fixture().await;
  let err = f
    .store
    .register(None, account_input("Eve", "eve@x.test", Role::Admin))
    .await
    .unwrap_err();
  assert_eq!(kind(&err), ErrorKind::Forbidden);

  let err = f
    .store
    .register(None, account_input("Dan", "dan@x.test", Role::Driver))
    .await
    .unwrap_err();
  assert_eq!(kind(&err), ErrorKind::Forbidden);
}

#[tokio::test]
async fn duplicate_email_conflicts() {
  let f = fixture().await;
  f.parent("Marta").await;
  let err = f
    .store
    .register(None, account_input("Other", "MARTA@parents.test", Role::Parent))
    .await
    .unwrap_err();
  assert_eq!(kind(&err), ErrorKind::Conflict);
}

#[tokio::test]
async fn ensure_admin_is_idempotent() {
  let f = fixture().await;
  let again = f
    .store
    .ensure_admin(account_input("Admin", "admin@camley.test", Role::Admin))
    .await
    .unwrap();
  assert_eq!(again.account_id, f.admin.account_id);
}

#[tokio::test]
async fn activation_notifies_the_account() {
  let f = fixture().await;
  let parent = f.parent("Marta").await;
  let creds = f.store.credentials("marta@parents.test".into()).await.unwrap().unwrap();
  assert!(creds.active);

  f.store.set_active(f.admin, parent.account_id, false).await.unwrap();
  let inbox = f.store.list_notifications(parent, parent.account_id, 20).await.unwrap();
  assert_eq!(inbox.len(), 2);
  assert!(inbox[0].message.contains("deactivated"));
  assert!(inbox[1].message.contains("approved"));
}

// ─── Enrollment ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn enrollment_creates_exactly_one_payment_due_in_a_week() {
  let f = fixture().await;
  let parent = f.parent("Marta").await;
  let enrollment = f.store.enroll(f.admin, student_input("Ana", Some(&parent), None)).await.unwrap();

  let payment = &enrollment.first_payment;
  assert_eq!(payment.amount, Decimal::new(5000, 2));
  assert_eq!(payment.status, PaymentStatus::Pending);
  assert_eq!(payment.due_at, start() + TimeDelta::days(7));

  let payments = f
    .store
    .list_payments(f.admin, PaymentQuery {
      student_id: Some(enrollment.student.student_id),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(payments.len(), 1);

  let inbox = f.store.list_notifications(parent, parent.account_id, 20).await.unwrap();
  assert!(inbox[0].message.contains("09/03/2026"));
}

#[tokio::test]
async fn duplicate_enrollment_conflicts_and_pushes_nothing() {
  let f = fixture().await;
  let parent = f.parent("Marta").await;
  f.enroll("Ana", Some(&parent), None).await;
  let before = f.push.delivered.lock().unwrap().len();

  let err = f
    .store
    .enroll(f.admin, student_input("Ana", Some(&parent), None))
    .await
    .unwrap_err();
  assert_eq!(kind(&err), ErrorKind::Conflict);
  assert_eq!(f.push.delivered.lock().unwrap().len(), before);
}

#[tokio::test]
async fn only_admins_enroll() {
  let f = fixture().await;
  let parent = f.parent("Marta").await;
  let err = f.store.enroll(parent, student_input("Ana", Some(&parent), None)).await.unwrap_err();
  assert_eq!(kind(&err), ErrorKind::Forbidden);
}

#[tokio::test]
async fn deleting_a_student_removes_payments_and_attendance() {
  let f = fixture().await;
  let driver = f.driver("Luis").await;
  let route = f.route("Norte", Some(&driver)).await;
  let parent = f.parent("Marta").await;
  let student = f.enroll("Ana", Some(&parent), Some(route)).await;
  f.store
    .record_attendance(driver, NewAttendance {
      student_id:   student,
      status:       AttendanceStatus::Present,
      observations: None,
    })
    .await
    .unwrap();

  let removal = f.store.delete_student(f.admin, student).await.unwrap();
  assert_eq!(removal.payments_removed, 1);
  assert_eq!(removal.attendance_removed, 1);

  let payments = f.store.list_payments(f.admin, PaymentQuery::default()).await.unwrap();
  assert!(payments.is_empty());
  let today = f.store.daily_attendance(f.admin, start().date_naive()).await.unwrap();
  assert!(today.records.is_empty());
  let err = f.store.get_student(f.admin, student).await.unwrap_err();
  assert_eq!(kind(&err), ErrorKind::NotFound);
}

#[tokio::test]
async fn parents_only_list_their_own_children() {
  let f = fixture().await;
  let marta = f.parent("Marta").await;
  let jose = f.parent("Jose").await;
  f.enroll("Ana", Some(&marta), None).await;
  f.enroll("Beto", Some(&jose), None).await;

  let visible = f.store.list_students(marta, StudentQuery::default()).await.unwrap();
  assert_eq!(visible.len(), 1);
  assert_eq!(visible[0].name, "Ana");
  assert_eq!(f.store.list_students(f.admin, StudentQuery::default()).await.unwrap().len(), 2);
}

// ─── Billing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn marking_paid_twice_records_one_income() {
  let f = fixture().await;
  let parent = f.parent("Marta").await;
  let enrollment = f.store.enroll(f.admin, student_input("Ana", Some(&parent), None)).await.unwrap();
  let id = enrollment.first_payment.payment_id;

  let paid = f.store.mark_paid(f.admin, id, Some("cash".into())).await.unwrap();
  assert_eq!(paid.status, PaymentStatus::Paid);
  assert_eq!(paid.paid_at, Some(start()));
  assert_eq!(paid.method.as_deref(), Some("cash"));

  f.clock.advance(TimeDelta::minutes(1));
  let again = f.store.mark_paid(f.admin, id, Some("transfer".into())).await.unwrap();
  assert_eq!(again.paid_at, Some(start()));
  assert_eq!(again.method.as_deref(), Some("cash"));

  let summary = f.store.finance_summary(f.admin).await.unwrap();
  assert_eq!(summary.recent_income.len(), 1);
  assert_eq!(summary.total_income, Decimal::new(5000, 2));
  assert_eq!(summary.recent_income[0].description, "Payment from Ana");
  assert_eq!(summary.recent_income[0].payment_id, Some(id));
}

#[tokio::test]
async fn oversized_amounts_are_rejected_and_totals_never_overflow() {
  let f = fixture().await;
  let err = f
    .store
    .record_income(f.admin, NewIncome {
      description: "Grant".into(),
      amount:      Decimal::MAX,
      source:      IncomeSource::Other,
    })
    .await
    .unwrap_err();
  assert_eq!(kind(&err), ErrorKind::Validation);

  // Rows written before amounts were bounded.
  f.store
    .transact(|conn, _, ctx| {
      for _ in 0..2 {
        conn.execute(
          "INSERT INTO incomes (income_id, description, amount, source, recorded_at)
           VALUES (?1, 'Legacy', ?2, 'other', ?3)",
          rusqlite::params![
            encode_uuid(Uuid::new_v4()),
            Decimal::MAX.to_string(),
            encode_dt(ctx.now),
          ],
        )?;
      }
      Ok(())
    })
    .await
    .unwrap();

  let err = f.store.finance_summary(f.admin).await.unwrap_err();
  assert_eq!(kind(&err), ErrorKind::Internal);
  assert!(f.store.dashboard(f.admin).await.is_err());
  // The connection survives the failed sum.
  assert!(f.store.list_routes(f.admin).await.unwrap().is_empty());
}

#[tokio::test]
async fn equivalent_income_is_suppressed_only_within_the_window() {
  let f = fixture().await;
  let student = f.enroll("Ana", None, None).await;
  let pay = |amount| NewPayment {
    student_id:     student,
    amount,
    status:         PaymentStatus::Pending,
    method:         None,
    reference:      None,
    description:    None,
    due_date:       None,
    months_covered: None,
  };
  let fifty = Decimal::new(5000, 2);
  let first = f.store.register_payment(f.admin, pay(fifty)).await.unwrap();
  let second = f.store.register_payment(f.admin, pay(fifty)).await.unwrap();
  let third = f.store.register_payment(f.admin, pay(fifty)).await.unwrap();
  let other = f.store.register_payment(f.admin, pay(Decimal::new(7500, 2))).await.unwrap();

  f.store.mark_paid(f.admin, first.payment_id, None).await.unwrap();
  f.clock.advance(TimeDelta::minutes(4));
  f.store.mark_paid(f.admin, second.payment_id, None).await.unwrap();
  assert_eq!(f.income_count().await, 1);

  // A different amount is not equivalent.
  f.store.mark_paid(f.admin, other.payment_id, None).await.unwrap();
  assert_eq!(f.income_count().await, 2);

  f.clock.advance(TimeDelta::minutes(2));
  f.store.mark_paid(f.admin, third.payment_id, None).await.unwrap();
  assert_eq!(f.income_count().await, 3);
}

#[tokio::test]
async fn payment_created_paid_records_income_and_notifies_parent() {
  let f = fixture().await;
  let parent = f.parent("Marta").await;
  let student = f.enroll("Ana", Some(&parent), None).await;
  let payment = f
    .store
    .register_payment(f.admin, NewPayment {
      student_id:     student,
      amount:         Decimal::new(10000, 2),
      status:         PaymentStatus::Paid,
      method:         None,
      reference:      Some("R-1".into()),
      description:    None,
      due_date:       None,
      months_covered: Some(2),
    })
    .await
    .unwrap();
  assert_eq!(payment.paid_at, Some(start()));
  assert_eq!(payment.method.as_deref(), Some("cash"));
  assert_eq!(f.income_count().await, 1);

  let inbox = f.store.list_notifications(parent, parent.account_id, 20).await.unwrap();
  assert!(inbox[0].message.contains("100.00"));
}

#[tokio::test]
async fn purge_overdue_never_touches_paid_payments() {
  let f = fixture().await;
  let ana = f.enroll("Ana", None, None).await;
  let beto = f.enroll("Beto", None, None).await;
  let payments = f.store.list_payments(f.admin, PaymentQuery::default()).await.unwrap();
  let beto_payment = payments.iter().find(|p| p.student_id == beto).unwrap().payment_id;
  f.store.mark_paid(f.admin, beto_payment, None).await.unwrap();

  f.clock.advance(TimeDelta::days(8));
  let overdue = f
    .store
    .list_payments(f.admin, PaymentQuery { status: PaymentFilter::Overdue, student_id: None })
    .await
    .unwrap();
  assert_eq!(overdue.len(), 1);
  assert_eq!(overdue[0].student_id, ana);

  assert_eq!(f.store.purge_overdue(f.admin).await.unwrap(), 1);
  let left = f.store.list_payments(f.admin, PaymentQuery::default()).await.unwrap();
  assert_eq!(left.len(), 1);
  assert_eq!(left[0].status, PaymentStatus::Paid);
}

#[tokio::test]
async fn payments_are_ordered_by_status_then_due_date() {
  let f = fixture().await;
  let student = f.enroll("Ana", None, None).await;
  let due = |days| (start() + TimeDelta::days(days)).date_naive();
  for days in [20, 3] {
    f.store
      .register_payment(f.admin, NewPayment {
        student_id:     student,
        amount:         Decimal::new(3000, 2),
        status:         PaymentStatus::Pending,
        method:         None,
        reference:      None,
        description:    None,
        due_date:       Some(due(days)),
        months_covered: None,
      })
      .await
      .unwrap();
  }
  let listed = f.store.list_payments(f.admin, PaymentQuery::default()).await.unwrap();
  let dues: Vec<_> = listed.iter().map(|p| p.due_at.date_naive()).collect();
  assert_eq!(dues, vec![due(3), due(7), due(20)]);
}

#[tokio::test]
async fn parents_see_and_acknowledge_only_their_payments() {
  let f = fixture().await;
  let marta = f.parent("Marta").await;
  let jose = f.parent("Jose").await;
  f.enroll("Ana", Some(&marta), None).await;
  f.enroll("Beto", Some(&jose), None).await;

  let mine = f.store.list_payments(marta, PaymentQuery::default()).await.unwrap();
  assert_eq!(mine.len(), 1);
  let seen = f.store.mark_payment_seen(marta, mine[0].payment_id).await.unwrap();
  assert!(seen.seen_by_parent);

  let err = f.store.mark_payment_seen(jose, mine[0].payment_id).await.unwrap_err();
  assert_eq!(kind(&err), ErrorKind::Forbidden);
  let err = f.store.purge_overdue(marta).await.unwrap_err();
  assert_eq!(kind(&err), ErrorKind::Forbidden);
}

// ─── Attendance ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn attendance_is_recorded_once_per_student_per_day() {
  let f = fixture().await;
  let driver = f.driver("Luis").await;
  let route = f.route("Norte", Some(&driver)).await;
  let parent = f.parent("Marta").await;
  let student = f.enroll("Ana", Some(&parent), Some(route)).await;
  let mark = |status| NewAttendance { student_id: student, status, observations: None };

  f.store.record_attendance(driver, mark(AttendanceStatus::Late)).await.unwrap();
  let err = f.store.record_attendance(driver, mark(AttendanceStatus::Present)).await.unwrap_err();
  assert_eq!(kind(&err), ErrorKind::Conflict);

  let inbox = f.store.list_notifications(parent, parent.account_id, 1).await.unwrap();
  assert_eq!(inbox[0].message, "Ana marked late today");

  f.clock.advance(TimeDelta::days(1));
  f.store.record_attendance(driver, mark(AttendanceStatus::Present)).await.unwrap();
}

#[tokio::test]
async fn drivers_only_mark_students_on_their_route() {
  let f = fixture().await;
  let luis = f.driver("Luis").await;
  let rosa = f.driver("Rosa").await;
  f.route("Norte", Some(&luis)).await;
  let sur = f.route("Sur", Some(&rosa)).await;
  let student = f.enroll("Ana", None, Some(sur)).await;

  let err = f
    .store
    .record_attendance(luis, NewAttendance {
      student_id:   student,
      status:       AttendanceStatus::Present,
      observations: None,
    })
    .await
    .unwrap_err();
  assert_eq!(kind(&err), ErrorKind::Forbidden);

  let err = f
    .store
    .record_attendance(f.admin, NewAttendance {
      student_id:   student,
      status:       AttendanceStatus::Present,
      observations: None,
    })
    .await
    .unwrap_err();
  assert_eq!(kind(&err), ErrorKind::Forbidden);
}

#[tokio::test]
async fn a_driver_without_a_route_cannot_change_run_status() {
  let f = fixture().await;
  let driver = f.driver("Luis").await;
  let before = f.store.list_notifications(f.admin, f.admin.account_id, 20).await.unwrap().len();
  let err = f.store.set_run_status(driver, RunStatus::Finished).await.unwrap_err();
  assert_eq!(kind(&err), ErrorKind::Validation);
  let after = f.store.list_notifications(f.admin, f.admin.account_id, 20).await.unwrap().len();
  assert_eq!(before, after);
}

#[tokio::test]
async fn starting_a_run_clears_todays_records_and_finishing_tells_admin() {
  let f = fixture().await;
  let driver = f.driver("Luis").await;
  let route = f.route("Norte", Some(&driver)).await;
  let student = f.enroll("Ana", None, Some(route)).await;
  let mark = NewAttendance { student_id: student, status: AttendanceStatus::Absent, observations: None };

  f.store.record_attendance(driver, mark.clone()).await.unwrap();
  f.store.set_run_status(driver, RunStatus::Started).await.unwrap();
  f.store.record_attendance(driver, mark).await.unwrap();

  f.store.set_run_status(driver, RunStatus::Finished).await.unwrap();
  let inbox = f.store.list_notifications(f.admin, f.admin.account_id, 1).await.unwrap();
  assert!(inbox[0].message.contains("Luis"));

  let report = f
    .store
    .attendance_report(f.admin, driver.account_id, start().date_naive())
    .await
    .unwrap();
  assert_eq!(report.records.len(), 1);
  assert_eq!(report.tally.absent, 1);
}

#[tokio::test]
async fn manual_summary_is_one_per_driver_per_day() {
  let f = fixture().await;
  let driver = f.driver("Luis").await;
  let first = f
    .store
    .save_manual_summary(driver, ManualSummaryInput { present: 10, absent: 2, notes: None })
    .await
    .unwrap();
  let second = f
    .store
    .save_manual_summary(driver, ManualSummaryInput { present: 11, absent: 1, notes: None })
    .await
    .unwrap();
  assert_eq!(first.summary_id, second.summary_id);
  assert_eq!(second.present, 11);

  let daily = f.store.daily_attendance(f.admin, start().date_naive()).await.unwrap();
  assert_eq!(daily.manual.len(), 1);
}

// ─── Routes and vehicles ─────────────────────────────────────────────────────

#[tokio::test]
async fn reassigning_a_route_notifies_both_drivers() {
  let f = fixture().await;
  let luis = f.driver("Luis").await;
  let rosa = f.driver("Rosa").await;
  let route = f.route("Norte", Some(&luis)).await;

  let updated = f.store.assign_route_driver(f.admin, route, rosa.account_id).await.unwrap();
  assert_eq!(updated.driver_id, Some(rosa.account_id));

  let luis_inbox = f.store.list_notifications(luis, luis.account_id, 1).await.unwrap();
  assert_eq!(luis_inbox[0].message, "You have been unassigned from route: Norte");
  let rosa_inbox = f.store.list_notifications(rosa, rosa.account_id, 1).await.unwrap();
  assert_eq!(rosa_inbox[0].message, "You have been assigned to route: Norte");
}

#[tokio::test]
async fn duplicate_route_conflicts() {
  let f = fixture().await;
  f.route("Norte", None).await;
  let err = f
    .store
    .create_route(f.admin, NewRoute {
      name:        "Norte".into(),
      description: None,
      starts_at:   "06:30".into(),
      ends_at:     "07:45".into(),
      driver_id:   None,
      vehicle_id:  None,
    })
    .await
    .unwrap_err();
  assert_eq!(kind(&err), ErrorKind::Conflict);
}

fn vehicle_input(plate: &str) -> NewVehicle {
  NewVehicle {
    plate:     plate.into(),
    brand:     Some("Toyota".into()),
    model:     Some("Hiace".into()),
    year:      Some(2019),
    capacity:  Some(15),
    color:     None,
    status:    VehicleStatus::Active,
    driver_id: None,
    mileage:   None,
    notes:     None,
  }
}

#[tokio::test]
async fn assigning_a_vehicle_syncs_the_drivers_route() {
  let f = fixture().await;
  let driver = f.driver("Luis").await;
  let route = f.route("Norte", Some(&driver)).await;
  let vehicle = f.store.create_vehicle(f.admin, vehicle_input("m 123")).await.unwrap();
  assert_eq!(vehicle.plate, "M 123");

  let assigned = f
    .store
    .assign_vehicle(f.admin, driver.account_id, vehicle.vehicle_id)
    .await
    .unwrap();
  assert_eq!(assigned.driver_id, Some(driver.account_id));
  let route = f.store.get_route(f.admin, route).await.unwrap();
  assert_eq!(route.vehicle_id, Some(vehicle.vehicle_id));
}

#[tokio::test]
async fn vehicles_track_plate_uniqueness_and_maintenance() {
  let f = fixture().await;
  let vehicle = f.store.create_vehicle(f.admin, vehicle_input("M 123")).await.unwrap();
  let err = f.store.create_vehicle(f.admin, vehicle_input("m 123 ")).await.unwrap_err();
  assert_eq!(kind(&err), ErrorKind::Conflict);

  let serviced = f
    .store
    .set_vehicle_status(f.admin, vehicle.vehicle_id, VehicleStatus::Maintenance)
    .await
    .unwrap();
  assert!(serviced.active);
  assert_eq!(serviced.last_maintenance_at, Some(start()));

  let retired = f
    .store
    .set_vehicle_status(f.admin, vehicle.vehicle_id, VehicleStatus::Inactive)
    .await
    .unwrap();
  assert!(!retired.active);
  assert_eq!(retired.last_maintenance_at, Some(start()));
}

#[tokio::test]
async fn deleting_a_route_keeps_its_students() {
  let f = fixture().await;
  let route = f.route("Norte", None).await;
  let student = f.enroll("Ana", None, Some(route)).await;
  f.store.delete_route(f.admin, route).await.unwrap();
  let student = f.store.get_student(f.admin, student).await.unwrap();
  assert_eq!(student.route_id, None);
}

#[tokio::test]
async fn deleting_a_parent_keeps_their_children_and_payments() {
  let f = fixture().await;
  let parent = f.parent("Marta").await;
  let enrollment = f.store.enroll(f.admin, student_input("Ana", Some(&parent), None)).await.unwrap();
  let student = enrollment.student.student_id;

  f.store.delete_account(f.admin, parent.account_id).await.unwrap();

  let student = f.store.get_student(f.admin, student).await.unwrap();
  assert_eq!(student.parent_id, None);
  let payments = f
    .store
    .list_payments(f.admin, PaymentQuery { student_id: Some(student.student_id), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(payments.len(), 1);
  assert_eq!(payments[0].payment_id, enrollment.first_payment.payment_id);
}

#[tokio::test]
async fn deleting_a_vehicle_keeps_its_route() {
  let f = fixture().await;
  let vehicle = f.store.create_vehicle(f.admin, vehicle_input("ABC 123")).await.unwrap();
  let route = f
    .store
    .create_route(f.admin, NewRoute {
      name:        "Sur".into(),
      description: None,
      starts_at:   "13:00".into(),
      ends_at:     "14:15".into(),
      driver_id:   None,
      vehicle_id:  Some(vehicle.vehicle_id),
    })
    .await
    .unwrap();
  assert_eq!(route.vehicle_id, Some(vehicle.vehicle_id));

  f.store.delete_vehicle(f.admin, vehicle.vehicle_id).await.unwrap();

  let route = f.store.get_route(f.admin, route.route_id).await.unwrap();
  assert_eq!(route.vehicle_id, None);
}

// ─── Outbox ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn push_failure_never_undoes_the_operation() {
  let f = fixture().await;
  let parent = f.parent("Marta").await;
  f.store
    .subscribe_push(parent, NewPushSubscription {
      endpoint: "https://push.example/abc".into(),
      keys:     PushKeys { p256dh: "key".into(), auth: "secret".into() },
    })
    .await
    .unwrap();
  f.push.fail.store(true, Ordering::SeqCst);

  let enrollment = f.store.enroll(f.admin, student_input("Ana", Some(&parent), None)).await;
  assert!(enrollment.is_ok());

  let attempts = f.push.delivered.lock().unwrap().clone();
  let attempt = attempts.last().unwrap();
  assert_eq!(attempt.notification.recipient_id, parent.account_id);
  assert_eq!(attempt.subscriptions[0].endpoint, "https://push.example/abc");

  let inbox = f.store.list_notifications(parent, parent.account_id, 20).await.unwrap();
  assert!(inbox.iter().any(|n| n.message.contains("Ana")));
}

#[tokio::test]
async fn mark_all_read_clears_only_the_callers_inbox() {
  let f = fixture().await;
  let parent = f.parent("Marta").await;
  f.enroll("Ana", Some(&parent), None).await;
  f.enroll("Beto", Some(&parent), None).await;
  let admin_unread = f.store.unread_count(f.admin, f.admin.account_id).await.unwrap();
  assert!(admin_unread > 0);

  assert_eq!(f.store.unread_count(parent, parent.account_id).await.unwrap(), 3);
  assert_eq!(f.store.mark_all_read(parent).await.unwrap(), 3);
  assert_eq!(f.store.unread_count(parent, parent.account_id).await.unwrap(), 0);
  assert_eq!(f.store.unread_count(f.admin, f.admin.account_id).await.unwrap(), admin_unread);

  let err = f.store.unread_count(parent, f.admin.account_id).await.unwrap_err();
  assert_eq!(kind(&err), ErrorKind::Forbidden);
}

#[tokio::test]
async fn delay_reports_reach_route_parents_and_admin() {
  let f = fixture().await;
  let driver = f.driver("Luis").await;
  let route = f.route("Norte", Some(&driver)).await;
  let marta = f.parent("Marta").await;
  let jose = f.parent("Jose").await;
  f.enroll("Ana", Some(&marta), Some(route)).await;
  f.enroll("Eva", Some(&marta), Some(route)).await;
  f.enroll("Beto", Some(&jose), Some(route)).await;

  let notified = f
    .store
    .report_delay(driver, DelayReport { reason: "Traffic".into(), eta: None })
    .await
    .unwrap();
  assert_eq!(notified, 2);
  let inbox = f.store.list_notifications(jose, jose.account_id, 1).await.unwrap();
  assert_eq!(inbox[0].message, "Delay on the route: Traffic. Estimated time: 15-20 minutes");

  let sent = f
    .store
    .driver_report(driver, DriverReport { kind: DriverReportKind::Problem, message: String::new() })
    .await
    .unwrap();
  assert_eq!(sent, 1);
  let inbox = f.store.list_notifications(f.admin, f.admin.account_id, 1).await.unwrap();
  assert_eq!(inbox[0].message, "Luis: Problem reported by the driver.");
}

// ─── Tracking ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn parents_locate_only_their_childrens_driver() {
  let f = fixture().await;
  let luis = f.driver("Luis").await;
  let route = f.route("Norte", Some(&luis)).await;
  let marta = f.parent("Marta").await;
  let jose = f.parent("Jose").await;
  f.enroll("Ana", Some(&marta), Some(route)).await;

  f.store.update_location(luis, Coordinates { lat: 12.13, lng: -86.25 }).await.unwrap();
  f.clock.advance(TimeDelta::seconds(30));
  f.store.update_location(luis, Coordinates { lat: 12.14, lng: -86.26 }).await.unwrap();

  let latest = f.store.latest_location(marta, luis.account_id).await.unwrap();
  assert_eq!(latest.position.lat, 12.14);
  let err = f.store.latest_location(jose, luis.account_id).await.unwrap_err();
  assert_eq!(kind(&err), ErrorKind::Forbidden);

  let history = f.store.location_history(f.admin, luis.account_id, 200).await.unwrap();
  assert_eq!(history.len(), 2);
  assert_eq!(history[0].position.lat, 12.13);

  let fleet = f.store.fleet_positions(f.admin).await.unwrap();
  assert_eq!(fleet[0].route_name.as_deref(), Some("Norte"));

  let err = f
    .store
    .update_location(luis, Coordinates { lat: 95.0, lng: 0.0 })
    .await
    .unwrap_err();
  assert_eq!(kind(&err), ErrorKind::Validation);
}

// ─── Support ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn tickets_can_be_forwarded_and_answered_by_the_driver() {
  let f = fixture().await;
  let parent = f.parent("Marta").await;
  let driver = f.driver("Luis").await;
  let ticket = f
    .store
    .open_ticket(parent, NewTicket {
      subject:  "pickup".into(),
      priority: Priority::High,
      message:  "Where is the bus?".into(),
    })
    .await
    .unwrap();
  assert_eq!(ticket.status, TicketStatus::Open);

  let err = f
    .store
    .answer_ticket(driver, ticket.ticket_id, TicketAnswer {
      answer:            "On my way".into(),
      forward_to_driver: None,
    })
    .await
    .unwrap_err();
  assert_eq!(kind(&err), ErrorKind::Forbidden);

  f.store
    .answer_ticket(f.admin, ticket.ticket_id, TicketAnswer {
      answer:            "Checking with the driver".into(),
      forward_to_driver: Some(driver.account_id),
    })
    .await
    .unwrap();
  assert_eq!(f.store.list_tickets(driver).await.unwrap().len(), 1);

  let answered = f
    .store
    .answer_ticket(driver, ticket.ticket_id, TicketAnswer {
      answer:            "Five minutes away".into(),
      forward_to_driver: None,
    })
    .await
    .unwrap();
  assert_eq!(answered.status, TicketStatus::Answered);
  assert_eq!(answered.answered_by, Some(driver.account_id));

  let listed = f.store.list_tickets(parent).await.unwrap();
  assert_eq!(listed[0].subject, "pickup");
  assert_eq!(listed[0].priority, Priority::High);
  assert_eq!(listed[0].message, "Where is the bus?");

  let inbox = f.store.list_notifications(parent, parent.account_id, 1).await.unwrap();
  assert_eq!(inbox[0].message, "Answer from the driver: Five minutes away");
}

// ─── Reports ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn dashboard_counts_the_week() {
  let f = fixture().await;
  let mut pending_driver = account_input("Nuevo", "nuevo@drivers.test", Role::Driver);
  pending_driver.active = Some(false);
  f.store.register(Some(f.admin), pending_driver).await.unwrap();
  let enrollment = f.store.enroll(f.admin, student_input("Ana", None, None)).await.unwrap();
  f.enroll("Beto", None, None).await;
  f.store.mark_paid(f.admin, enrollment.first_payment.payment_id, None).await.unwrap();

  let dashboard = f.store.dashboard(f.admin).await.unwrap();
  assert_eq!(dashboard.students, 2);
  assert_eq!(dashboard.pending_payments, 1);
  assert_eq!(dashboard.overdue_payments, 0);
  assert_eq!(dashboard.week_income, Decimal::new(5000, 2));
  assert_eq!(dashboard.pending_approvals, 1);
  assert_eq!(dashboard.week_starts, start().date_naive());
}
