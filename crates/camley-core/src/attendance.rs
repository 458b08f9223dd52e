//! Attendance Log types.
//!
//! Individual records are keyed by student and calendar day: at most one per
//! student per day. Manual summaries are a coarse per-driver-per-day count
//! kept independently of the individual records.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
  Present,
  Absent,
  Late,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
  pub attendance_id: Uuid,
  pub student_id:    Uuid,
  pub date:          NaiveDate,
  pub time:          NaiveTime,
  pub status:        AttendanceStatus,
  pub observations:  Option<String>,
  pub driver_id:     Option<Uuid>,
}

/// Input to [`crate::store::AttendanceStore::record_attendance`]. The date is
/// always "today" and the driver is always the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAttendance {
  pub student_id:   Uuid,
  pub status:       AttendanceStatus,
  pub observations: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualSummary {
  pub summary_id: Uuid,
  pub driver_id:  Uuid,
  pub date:       NaiveDate,
  pub present:    u32,
  pub absent:     u32,
  pub notes:      Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManualSummaryInput {
  #[serde(default)]
  pub present: u32,
  #[serde(default)]
  pub absent:  u32,
  pub notes:   Option<String>,
}

/// Present/absent/late counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
  pub present: u32,
  pub absent:  u32,
  pub late:    u32,
}

impl Tally {
  pub fn add(&mut self, status: AttendanceStatus) {
    match status {
      AttendanceStatus::Present => self.present += 1,
      AttendanceStatus::Absent => self.absent += 1,
      AttendanceStatus::Late => self.late += 1,
    }
  }

  pub fn of<'a>(records: impl IntoIterator<Item = &'a AttendanceRecord>) -> Self {
    let mut tally = Self::default();
    for record in records {
      tally.add(record.status);
    }
    tally
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(status: AttendanceStatus) -> AttendanceRecord {
    AttendanceRecord {
      attendance_id: Uuid::new_v4(),
      student_id:    Uuid::new_v4(),
      date:          NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
      time:          NaiveTime::from_hms_opt(7, 15, 0).unwrap(),
      status,
      observations:  None,
      driver_id:     None,
    }
  }

  #[test]
  fn tally_counts_each_status() {
    let records = [
      record(AttendanceStatus::Present),
      record(AttendanceStatus::Present),
      record(AttendanceStatus::Late),
      record(AttendanceStatus::Absent),
    ];
    assert_eq!(Tally::of(&records), Tally { present: 2, absent: 1, late: 1 });
  }
}
