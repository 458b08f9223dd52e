//! Route/Vehicle Registry types.
//!
//! A route links at most one driver and at most one vehicle at a time; a
//! vehicle links at most one driver. Deleting either side nulls the link
//! rather than cascading.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Routes ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
  pub route_id:    Uuid,
  pub name:        String,
  pub description: Option<String>,
  /// Start of the schedule window, `HH:MM`.
  pub starts_at:   String,
  /// End of the schedule window, `HH:MM`.
  pub ends_at:     String,
  pub driver_id:   Option<Uuid>,
  pub vehicle_id:  Option<Uuid>,
  pub active:      bool,
}

/// Input to [`crate::store::FleetStore::create_route`]. Also used as the
/// full-record edit body.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRoute {
  pub name:        String,
  pub description: Option<String>,
  pub starts_at:   String,
  pub ends_at:     String,
  pub driver_id:   Option<Uuid>,
  pub vehicle_id:  Option<Uuid>,
}

impl NewRoute {
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::validation("name", "must not be empty"));
    }
    let start = parse_clock("starts_at", &self.starts_at)?;
    let end = parse_clock("ends_at", &self.ends_at)?;
    if end <= start {
      return Err(Error::validation("ends_at", "must be after starts_at"));
    }
    Ok(())
  }
}

fn parse_clock(field: &'static str, s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, "%H:%M")
    .map_err(|_| Error::validation(field, format!("{s:?} is not HH:MM")))
}

/// Lifecycle of a driver's run for the current day.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RunStatus {
  /// Starting a run discards the driver's attendance entered earlier today.
  Started,
  Paused,
  /// Finishing a run tells the administrator the day's report is ready.
  Finished,
}

// ─── Vehicles ────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VehicleStatus {
  #[default]
  Active,
  Maintenance,
  Inactive,
}

impl VehicleStatus {
  /// A vehicle in maintenance is still in the fleet; only `inactive` is not.
  pub fn is_active(self) -> bool { self != Self::Inactive }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
  pub vehicle_id:          Uuid,
  /// Always upper-case.
  pub plate:               String,
  pub brand:               Option<String>,
  pub model:               Option<String>,
  pub year:                Option<u16>,
  pub capacity:            Option<u16>,
  pub color:               Option<String>,
  pub status:              VehicleStatus,
  /// Derived from `status`.
  pub active:              bool,
  pub driver_id:           Option<Uuid>,
  pub mileage:             Option<u32>,
  pub last_maintenance_at: Option<DateTime<Utc>>,
  pub notes:               Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVehicle {
  pub plate:     String,
  pub brand:     Option<String>,
  pub model:     Option<String>,
  pub year:      Option<u16>,
  pub capacity:  Option<u16>,
  pub color:     Option<String>,
  #[serde(default)]
  pub status:    VehicleStatus,
  pub driver_id: Option<Uuid>,
  pub mileage:   Option<u32>,
  pub notes:     Option<String>,
}

impl NewVehicle {
  pub fn validate(&self) -> Result<()> {
    normalize_plate(&self.plate).map(|_| ())
  }
}

/// Partial vehicle edit; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehiclePatch {
  pub plate:    Option<String>,
  pub brand:    Option<String>,
  pub model:    Option<String>,
  pub year:     Option<u16>,
  pub capacity: Option<u16>,
  pub color:    Option<String>,
  pub status:   Option<VehicleStatus>,
  pub mileage:  Option<u32>,
  pub notes:    Option<String>,
}

/// Trim and upper-case a licence plate, rejecting empty input.
pub fn normalize_plate(plate: &str) -> Result<String> {
  let plate = plate.trim().to_uppercase();
  if plate.is_empty() {
    return Err(Error::validation("plate", "must not be empty"));
  }
  Ok(plate)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn route(starts_at: &str, ends_at: &str) -> NewRoute {
    NewRoute {
      name:        "Norte".into(),
      description: None,
      starts_at:   starts_at.into(),
      ends_at:     ends_at.into(),
      driver_id:   None,
      vehicle_id:  None,
    }
  }

  #[test]
  fn schedule_window_must_be_ordered() {
    assert!(route("07:00", "08:30").validate().is_ok());
    assert!(route("08:30", "07:00").validate().is_err());
    assert!(route("7am", "08:30").validate().is_err());
  }

  #[test]
  fn only_inactive_vehicles_are_inactive() {
    assert!(VehicleStatus::Active.is_active());
    assert!(VehicleStatus::Maintenance.is_active());
    assert!(!VehicleStatus::Inactive.is_active());
  }

  #[test]
  fn plates_are_upper_cased() {
    assert_eq!(normalize_plate(" m 123-abc ").unwrap(), "M 123-ABC");
    assert!(normalize_plate("  ").is_err());
  }
}
