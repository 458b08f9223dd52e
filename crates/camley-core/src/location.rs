//! GPS location reporting types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Longest history a single request may ask for.
pub const MAX_HISTORY: u32 = 500;
pub const DEFAULT_HISTORY: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
  pub lat: f64,
  pub lng: f64,
}

impl Coordinates {
  pub fn validate(&self) -> Result<()> {
    if !(-90.0..=90.0).contains(&self.lat) {
      return Err(Error::validation("lat", format!("{} is out of range", self.lat)));
    }
    if !(-180.0..=180.0).contains(&self.lng) {
      return Err(Error::validation("lng", format!("{} is out of range", self.lng)));
    }
    Ok(())
  }
}

/// The latest known position of a driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
  pub driver_id:  Uuid,
  #[serde(flatten)]
  pub position:   Coordinates,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationPoint {
  #[serde(flatten)]
  pub position:    Coordinates,
  pub recorded_at: DateTime<Utc>,
}

/// One row of the administrator's live fleet map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetPosition {
  pub driver_id:   Uuid,
  pub driver_name: String,
  pub active:      bool,
  pub route_name:  Option<String>,
  #[serde(flatten)]
  pub position:    Coordinates,
  pub updated_at:  DateTime<Utc>,
}
