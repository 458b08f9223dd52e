//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are fixed-width RFC 3339 strings (microseconds, `Z`) so that
//! text comparison in SQL agrees with chronological order. Amounts are
//! decimal strings. UUIDs are hyphenated lowercase strings. Enums are stored
//! as their `strum` names.

use std::str::FromStr;

use camley_core::{
  account::{Account, Credentials},
  attendance::{AttendanceRecord, ManualSummary},
  billing::{Expense, Income, Payment},
  fleet::{Route, Vehicle},
  location::{Coordinates, FleetPosition, Location, LocationPoint},
  notification::{Notification, PushSubscription},
  roster::Student,
  support::Ticket,
};
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension as _, Params, Row};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn encode_opt_uuid(id: Option<Uuid>) -> Option<String> { id.map(encode_uuid) }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

pub fn encode_date(date: NaiveDate) -> String { date.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_time(time: NaiveTime) -> String { time.format("%H:%M:%S").to_string() }

fn decode_time(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, "%H:%M:%S").map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_decimal(d: Decimal) -> String { d.to_string() }

pub fn decode_decimal(s: &str) -> Result<Decimal> { Ok(Decimal::from_str(s)?) }

/// Parse a stored `strum` name back into its enum.
pub fn decode_enum<T: FromStr>(kind: &'static str, s: &str) -> Result<T> {
  T::from_str(s).map_err(|_| {
    camley_core::Error::UnknownVariant { kind, value: s.to_owned() }.into()
  })
}

// ─── Row plumbing ────────────────────────────────────────────────────────────

/// Raw column values read from one row, decoded in a second step so that
/// decoding errors surface as [`Error`] rather than `rusqlite::Error`.
pub trait RawRow: Sized {
  type Decoded;

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

  fn decode(self) -> Result<Self::Decoded>;
}

pub fn query_rows<R: RawRow>(
  conn: &Connection,
  sql: &str,
  params: impl Params,
) -> Result<Vec<R::Decoded>> {
  let mut stmt = conn.prepare(sql)?;
  let raws = stmt
    .query_map(params, R::from_row)?
    .collect::<rusqlite::Result<Vec<R>>>()?;
  raws.into_iter().map(R::decode).collect()
}

pub fn query_one<R: RawRow>(
  conn: &Connection,
  sql: &str,
  params: impl Params,
) -> Result<Option<R::Decoded>> {
  conn
    .query_row(sql, params, R::from_row)
    .optional()?
    .map(R::decode)
    .transpose()
}

/// Sum a column of decimal strings. Fails instead of overflowing.
pub fn sum_amounts(conn: &Connection, sql: &str, params: impl Params) -> Result<Decimal> {
  let mut stmt = conn.prepare(sql)?;
  let amounts = stmt
    .query_map(params, |r| r.get::<_, String>(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  amounts.iter().try_fold(Decimal::ZERO, |acc, s| {
    acc
      .checked_add(decode_decimal(s)?)
      .ok_or(Error::Decimal(rust_decimal::Error::ExceedsMaximumPossibleValue))
  })
}

pub fn count(conn: &Connection, sql: &str, params: impl Params) -> Result<u64> {
  let n = conn.query_row(sql, params, |r| r.get::<_, i64>(0))?;
  Ok(u64::try_from(n).unwrap_or_default())
}

// ─── Accounts ────────────────────────────────────────────────────────────────

pub const ACCOUNT_COLUMNS: &str = "a.account_id, a.name, a.email, a.phone, a.address, \
                                   a.gender, a.role, a.active, a.registered_at";

pub struct RawAccount {
  pub account_id:    String,
  pub name:          String,
  pub email:         String,
  pub phone:         Option<String>,
  pub address:       Option<String>,
  pub gender:        Option<String>,
  pub role:          String,
  pub active:        bool,
  pub registered_at: String,
}

impl RawRow for RawAccount {
  type Decoded = Account;

  fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      account_id:    r.get(0)?,
      name:          r.get(1)?,
      email:         r.get(2)?,
      phone:         r.get(3)?,
      address:       r.get(4)?,
      gender:        r.get(5)?,
      role:          r.get(6)?,
      active:        r.get(7)?,
      registered_at: r.get(8)?,
    })
  }

  fn decode(self) -> Result<Account> {
    Ok(Account {
      account_id:    decode_uuid(&self.account_id)?,
      name:          self.name,
      email:         self.email,
      phone:         self.phone,
      address:       self.address,
      gender:        self.gender,
      role:          decode_enum("role", &self.role)?,
      active:        self.active,
      registered_at: decode_dt(&self.registered_at)?,
    })
  }
}

pub struct RawCredentials {
  pub account_id:    String,
  pub role:          String,
  pub active:        bool,
  pub password_hash: String,
}

impl RawRow for RawCredentials {
  type Decoded = Credentials;

  fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      account_id:    r.get(0)?,
      role:          r.get(1)?,
      active:        r.get(2)?,
      password_hash: r.get(3)?,
    })
  }

  fn decode(self) -> Result<Credentials> {
    Ok(Credentials {
      account_id:    decode_uuid(&self.account_id)?,
      role:          decode_enum("role", &self.role)?,
      active:        self.active,
      password_hash: self.password_hash,
    })
  }
}

// ─── Students ────────────────────────────────────────────────────────────────

pub const STUDENT_COLUMNS: &str = "s.student_id, s.name, s.age, s.gender, s.grade, s.school, \
                                   s.condition, s.parent_id, s.route_id, s.active, \
                                   s.enrolled_at";

pub struct RawStudent {
  pub student_id:  String,
  pub name:        String,
  pub age:         Option<u8>,
  pub gender:      String,
  pub grade:       String,
  pub school:      String,
  pub condition:   Option<String>,
  pub parent_id:   Option<String>,
  pub route_id:    Option<String>,
  pub active:      bool,
  pub enrolled_at: String,
}

impl RawRow for RawStudent {
  type Decoded = Student;

  fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      student_id:  r.get(0)?,
      name:        r.get(1)?,
      age:         r.get(2)?,
      gender:      r.get(3)?,
      grade:       r.get(4)?,
      school:      r.get(5)?,
      condition:   r.get(6)?,
      parent_id:   r.get(7)?,
      route_id:    r.get(8)?,
      active:      r.get(9)?,
      enrolled_at: r.get(10)?,
    })
  }

  fn decode(self) -> Result<Student> {
    Ok(Student {
      student_id:  decode_uuid(&self.student_id)?,
      name:        self.name,
      age:         self.age,
      gender:      self.gender,
      grade:       self.grade,
      school:      self.school,
      condition:   self.condition,
      parent_id:   decode_opt_uuid(self.parent_id)?,
      route_id:    decode_opt_uuid(self.route_id)?,
      active:      self.active,
      enrolled_at: decode_dt(&self.enrolled_at)?,
    })
  }
}

// ─── Routes and vehicles ─────────────────────────────────────────────────────

pub const ROUTE_COLUMNS: &str = "r.route_id, r.name, r.description, r.starts_at, r.ends_at, \
                                 r.driver_id, r.vehicle_id, r.active";

pub struct RawRoute {
  pub route_id:    String,
  pub name:        String,
  pub description: Option<String>,
  pub starts_at:   String,
  pub ends_at:     String,
  pub driver_id:   Option<String>,
  pub vehicle_id:  Option<String>,
  pub active:      bool,
}

impl RawRow for RawRoute {
  type Decoded = Route;

  fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      route_id:    r.get(0)?,
      name:        r.get(1)?,
      description: r.get(2)?,
      starts_at:   r.get(3)?,
      ends_at:     r.get(4)?,
      driver_id:   r.get(5)?,
      vehicle_id:  r.get(6)?,
      active:      r.get(7)?,
    })
  }

  fn decode(self) -> Result<Route> {
    Ok(Route {
      route_id:    decode_uuid(&self.route_id)?,
      name:        self.name,
      description: self.description,
      starts_at:   self.starts_at,
      ends_at:     self.ends_at,
      driver_id:   decode_opt_uuid(self.driver_id)?,
      vehicle_id:  decode_opt_uuid(self.vehicle_id)?,
      active:      self.active,
    })
  }
}

pub const VEHICLE_COLUMNS: &str = "v.vehicle_id, v.plate, v.brand, v.model, v.year, \
                                   v.capacity, v.color, v.status, v.driver_id, v.mileage, \
                                   v.last_maintenance_at, v.notes";

pub struct RawVehicle {
  pub vehicle_id:          String,
  pub plate:               String,
  pub brand:               Option<String>,
  pub model:               Option<String>,
  pub year:                Option<u16>,
  pub capacity:            Option<u16>,
  pub color:               Option<String>,
  pub status:              String,
  pub driver_id:           Option<String>,
  pub mileage:             Option<u32>,
  pub last_maintenance_at: Option<String>,
  pub notes:               Option<String>,
}

impl RawRow for RawVehicle {
  type Decoded = Vehicle;

  fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      vehicle_id:          r.get(0)?,
      plate:               r.get(1)?,
      brand:               r.get(2)?,
      model:               r.get(3)?,
      year:                r.get(4)?,
      capacity:            r.get(5)?,
      color:               r.get(6)?,
      status:              r.get(7)?,
      driver_id:           r.get(8)?,
      mileage:             r.get(9)?,
      last_maintenance_at: r.get(10)?,
      notes:               r.get(11)?,
    })
  }

  fn decode(self) -> Result<Vehicle> {
    let status: camley_core::fleet::VehicleStatus = decode_enum("vehicle status", &self.status)?;
    Ok(Vehicle {
      vehicle_id: decode_uuid(&self.vehicle_id)?,
      plate: self.plate,
      brand: self.brand,
      model: self.model,
      year: self.year,
      capacity: self.capacity,
      color: self.color,
      status,
      active: status.is_active(),
      driver_id: decode_opt_uuid(self.driver_id)?,
      mileage: self.mileage,
      last_maintenance_at: decode_opt_dt(self.last_maintenance_at)?,
      notes: self.notes,
    })
  }
}

// ─── Billing ─────────────────────────────────────────────────────────────────

pub const PAYMENT_COLUMNS: &str = "p.payment_id, p.student_id, p.amount, p.status, p.due_at, \
                                   p.paid_at, p.created_at, p.months_covered, p.method, \
                                   p.reference, p.description, p.seen_by_parent";

pub struct RawPayment {
  pub payment_id:     String,
  pub student_id:     String,
  pub amount:         String,
  pub status:         String,
  pub due_at:         String,
  pub paid_at:        Option<String>,
  pub created_at:     String,
  pub months_covered: u32,
  pub method:         Option<String>,
  pub reference:      Option<String>,
  pub description:    Option<String>,
  pub seen_by_parent: bool,
}

impl RawRow for RawPayment {
  type Decoded = Payment;

  fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      payment_id:     r.get(0)?,
      student_id:     r.get(1)?,
      amount:         r.get(2)?,
      status:         r.get(3)?,
      due_at:         r.get(4)?,
      paid_at:        r.get(5)?,
      created_at:     r.get(6)?,
      months_covered: r.get(7)?,
      method:         r.get(8)?,
      reference:      r.get(9)?,
      description:    r.get(10)?,
      seen_by_parent: r.get(11)?,
    })
  }

  fn decode(self) -> Result<Payment> {
    Ok(Payment {
      payment_id:     decode_uuid(&self.payment_id)?,
      student_id:     decode_uuid(&self.student_id)?,
      amount:         decode_decimal(&self.amount)?,
      status:         decode_enum("payment status", &self.status)?,
      due_at:         decode_dt(&self.due_at)?,
      paid_at:        decode_opt_dt(self.paid_at)?,
      created_at:     decode_dt(&self.created_at)?,
      months_covered: self.months_covered,
      method:         self.method,
      reference:      self.reference,
      description:    self.description,
      seen_by_parent: self.seen_by_parent,
    })
  }
}

pub const INCOME_COLUMNS: &str =
  "i.income_id, i.description, i.amount, i.source, i.recorded_at, i.payment_id";

pub struct RawIncome {
  pub income_id:   String,
  pub description: String,
  pub amount:      String,
  pub source:      String,
  pub recorded_at: String,
  pub payment_id:  Option<String>,
}

impl RawRow for RawIncome {
  type Decoded = Income;

  fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      income_id:   r.get(0)?,
      description: r.get(1)?,
      amount:      r.get(2)?,
      source:      r.get(3)?,
      recorded_at: r.get(4)?,
      payment_id:  r.get(5)?,
    })
  }

  fn decode(self) -> Result<Income> {
    Ok(Income {
      income_id:   decode_uuid(&self.income_id)?,
      description: self.description,
      amount:      decode_decimal(&self.amount)?,
      source:      decode_enum("income source", &self.source)?,
      recorded_at: decode_dt(&self.recorded_at)?,
      payment_id:  decode_opt_uuid(self.payment_id)?,
    })
  }
}

pub const EXPENSE_COLUMNS: &str =
  "e.expense_id, e.description, e.amount, e.category, e.recorded_at, e.receipt";

pub struct RawExpense {
  pub expense_id:  String,
  pub description: String,
  pub amount:      String,
  pub category:    String,
  pub recorded_at: String,
  pub receipt:     Option<String>,
}

impl RawRow for RawExpense {
  type Decoded = Expense;

  fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      expense_id:  r.get(0)?,
      description: r.get(1)?,
      amount:      r.get(2)?,
      category:    r.get(3)?,
      recorded_at: r.get(4)?,
      receipt:     r.get(5)?,
    })
  }

  fn decode(self) -> Result<Expense> {
    Ok(Expense {
      expense_id:  decode_uuid(&self.expense_id)?,
      description: self.description,
      amount:      decode_decimal(&self.amount)?,
      category:    decode_enum("expense category", &self.category)?,
      recorded_at: decode_dt(&self.recorded_at)?,
      receipt:     self.receipt,
    })
  }
}

// ─── Attendance ──────────────────────────────────────────────────────────────

pub const ATTENDANCE_COLUMNS: &str = "t.attendance_id, t.student_id, t.date, t.time, t.status, \
                                      t.observations, t.driver_id";

pub struct RawAttendance {
  pub attendance_id: String,
  pub student_id:    String,
  pub date:          String,
  pub time:          String,
  pub status:        String,
  pub observations:  Option<String>,
  pub driver_id:     Option<String>,
}

impl RawRow for RawAttendance {
  type Decoded = AttendanceRecord;

  fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      attendance_id: r.get(0)?,
      student_id:    r.get(1)?,
      date:          r.get(2)?,
      time:          r.get(3)?,
      status:        r.get(4)?,
      observations:  r.get(5)?,
      driver_id:     r.get(6)?,
    })
  }

  fn decode(self) -> Result<AttendanceRecord> {
    Ok(AttendanceRecord {
      attendance_id: decode_uuid(&self.attendance_id)?,
      student_id:    decode_uuid(&self.student_id)?,
      date:          decode_date(&self.date)?,
      time:          decode_time(&self.time)?,
      status:        decode_enum("attendance status", &self.status)?,
      observations:  self.observations,
      driver_id:     decode_opt_uuid(self.driver_id)?,
    })
  }
}

pub const MANUAL_COLUMNS: &str = "m.summary_id, m.driver_id, m.date, m.present, m.absent, m.notes";

pub struct RawManualSummary {
  pub summary_id: String,
  pub driver_id:  String,
  pub date:       String,
  pub present:    u32,
  pub absent:     u32,
  pub notes:      Option<String>,
}

impl RawRow for RawManualSummary {
  type Decoded = ManualSummary;

  fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      summary_id: r.get(0)?,
      driver_id:  r.get(1)?,
      date:       r.get(2)?,
      present:    r.get(3)?,
      absent:     r.get(4)?,
      notes:      r.get(5)?,
    })
  }

  fn decode(self) -> Result<ManualSummary> {
    Ok(ManualSummary {
      summary_id: decode_uuid(&self.summary_id)?,
      driver_id:  decode_uuid(&self.driver_id)?,
      date:       decode_date(&self.date)?,
      present:    self.present,
      absent:     self.absent,
      notes:      self.notes,
    })
  }
}

// ─── Outbox ──────────────────────────────────────────────────────────────────

pub const NOTIFICATION_COLUMNS: &str =
  "n.notification_id, n.recipient_id, n.kind, n.message, n.link, n.created_at, n.read";

pub struct RawNotification {
  pub notification_id: String,
  pub recipient_id:    String,
  pub kind:            String,
  pub message:         String,
  pub link:            Option<String>,
  pub created_at:      String,
  pub read:            bool,
}

impl RawRow for RawNotification {
  type Decoded = Notification;

  fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      notification_id: r.get(0)?,
      recipient_id:    r.get(1)?,
      kind:            r.get(2)?,
      message:         r.get(3)?,
      link:            r.get(4)?,
      created_at:      r.get(5)?,
      read:            r.get(6)?,
    })
  }

  fn decode(self) -> Result<Notification> {
    Ok(Notification {
      notification_id: decode_uuid(&self.notification_id)?,
      recipient_id:    decode_uuid(&self.recipient_id)?,
      kind:            decode_enum("notification kind", &self.kind)?,
      message:         self.message,
      link:            self.link,
      created_at:      decode_dt(&self.created_at)?,
      read:            self.read,
    })
  }
}

pub const SUBSCRIPTION_COLUMNS: &str = "ps.endpoint, ps.account_id, ps.p256dh, ps.auth";

pub struct RawSubscription {
  pub endpoint:   String,
  pub account_id: String,
  pub p256dh:     String,
  pub auth:       String,
}

impl RawRow for RawSubscription {
  type Decoded = PushSubscription;

  fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      endpoint:   r.get(0)?,
      account_id: r.get(1)?,
      p256dh:     r.get(2)?,
      auth:       r.get(3)?,
    })
  }

  fn decode(self) -> Result<PushSubscription> {
    Ok(PushSubscription {
      endpoint:   self.endpoint,
      account_id: decode_uuid(&self.account_id)?,
      p256dh:     self.p256dh,
      auth:       self.auth,
    })
  }
}

// ─── Locations ───────────────────────────────────────────────────────────────

pub struct RawLocation {
  pub driver_id:  String,
  pub lat:        f64,
  pub lng:        f64,
  pub updated_at: String,
}

impl RawRow for RawLocation {
  type Decoded = Location;

  fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      driver_id:  r.get(0)?,
      lat:        r.get(1)?,
      lng:        r.get(2)?,
      updated_at: r.get(3)?,
    })
  }

  fn decode(self) -> Result<Location> {
    Ok(Location {
      driver_id:  decode_uuid(&self.driver_id)?,
      position:   Coordinates { lat: self.lat, lng: self.lng },
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawLocationPoint {
  pub lat:         f64,
  pub lng:         f64,
  pub recorded_at: String,
}

impl RawRow for RawLocationPoint {
  type Decoded = LocationPoint;

  fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { lat: r.get(0)?, lng: r.get(1)?, recorded_at: r.get(2)? })
  }

  fn decode(self) -> Result<LocationPoint> {
    Ok(LocationPoint {
      position:    Coordinates { lat: self.lat, lng: self.lng },
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

pub struct RawFleetPosition {
  pub driver_id:   String,
  pub driver_name: String,
  pub active:      bool,
  pub route_name:  Option<String>,
  pub lat:         f64,
  pub lng:         f64,
  pub updated_at:  String,
}

impl RawRow for RawFleetPosition {
  type Decoded = FleetPosition;

  fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      driver_id:   r.get(0)?,
      driver_name: r.get(1)?,
      active:      r.get(2)?,
      route_name:  r.get(3)?,
      lat:         r.get(4)?,
      lng:         r.get(5)?,
      updated_at:  r.get(6)?,
    })
  }

  fn decode(self) -> Result<FleetPosition> {
    Ok(FleetPosition {
      driver_id:   decode_uuid(&self.driver_id)?,
      driver_name: self.driver_name,
      active:      self.active,
      route_name:  self.route_name,
      position:    Coordinates { lat: self.lat, lng: self.lng },
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Tickets ─────────────────────────────────────────────────────────────────

pub const TICKET_COLUMNS: &str = "k.ticket_id, k.sender_id, k.sender_role, k.subject, \
                                  k.priority, k.message, k.opened_at, k.status, k.answer, \
                                  k.answered_by, k.answered_at, k.driver_id";

pub struct RawTicket {
  pub ticket_id:   String,
  pub sender_id:   String,
  pub sender_role: String,
  pub subject:     String,
  pub priority:    String,
  pub message:     String,
  pub opened_at:   String,
  pub status:      String,
  pub answer:      Option<String>,
  pub answered_by: Option<String>,
  pub answered_at: Option<String>,
  pub driver_id:   Option<String>,
}

impl RawRow for RawTicket {
  type Decoded = Ticket;

  fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      ticket_id:   r.get(0)?,
      sender_id:   r.get(1)?,
      sender_role: r.get(2)?,
      subject:     r.get(3)?,
      priority:    r.get(4)?,
      message:     r.get(5)?,
      opened_at:   r.get(6)?,
      status:      r.get(7)?,
      answer:      r.get(8)?,
      answered_by: r.get(9)?,
      answered_at: r.get(10)?,
      driver_id:   r.get(11)?,
    })
  }

  fn decode(self) -> Result<Ticket> {
    Ok(Ticket {
      ticket_id:   decode_uuid(&self.ticket_id)?,
      sender_id:   decode_uuid(&self.sender_id)?,
      sender_role: decode_enum("role", &self.sender_role)?,
      subject:     self.subject,
      priority:    decode_enum("priority", &self.priority)?,
      message:     self.message,
      opened_at:   decode_dt(&self.opened_at)?,
      status:      decode_enum("ticket status", &self.status)?,
      answer:      self.answer,
      answered_by: decode_opt_uuid(self.answered_by)?,
      answered_at: decode_opt_dt(self.answered_at)?,
      driver_id:   decode_opt_uuid(self.driver_id)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_are_fixed_width() {
    let a = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
    let b = a + chrono::TimeDelta::microseconds(1500);
    assert_eq!(encode_dt(a), "2026-03-02T09:00:00.000000Z");
    assert_eq!(encode_dt(a).len(), encode_dt(b).len());
    assert!(encode_dt(a) < encode_dt(b));
    assert_eq!(decode_dt(&encode_dt(b)).unwrap(), b);
  }

  #[test]
  fn unknown_enum_names_are_reported() {
    let err = decode_enum::<camley_core::account::Role>("role", "owner").unwrap_err();
    assert!(err.to_string().contains("owner"));
  }
}
