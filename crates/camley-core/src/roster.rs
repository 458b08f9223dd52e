//! Roster types: students, their enrollment and removal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, billing::Payment};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
  pub student_id:  Uuid,
  pub name:        String,
  pub age:         Option<u8>,
  pub gender:      String,
  pub grade:       String,
  pub school:      String,
  /// Medical condition or other observations for the driver.
  pub condition:   Option<String>,
  pub parent_id:   Option<Uuid>,
  pub route_id:    Option<Uuid>,
  pub active:      bool,
  pub enrolled_at: DateTime<Utc>,
}

/// Input to [`crate::store::RosterStore::enroll`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewStudent {
  pub name:      String,
  pub age:       Option<u8>,
  pub gender:    Option<String>,
  pub grade:     String,
  #[serde(default)]
  pub school:    String,
  pub condition: Option<String>,
  pub parent_id: Option<Uuid>,
  pub route_id:  Option<Uuid>,
}

impl NewStudent {
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::validation("name", "must not be empty"));
    }
    if self.gender.as_deref().is_none_or(|g| g.trim().is_empty()) {
      return Err(Error::validation("gender", "is required"));
    }
    Ok(())
  }
}

/// Full-record edit; `None` on an optional link clears it.
#[derive(Debug, Clone, Deserialize)]
pub struct StudentPatch {
  pub name:      String,
  pub age:       Option<u8>,
  pub gender:    Option<String>,
  pub grade:     String,
  #[serde(default)]
  pub school:    String,
  pub condition: Option<String>,
  pub parent_id: Option<Uuid>,
  pub route_id:  Option<Uuid>,
}

/// Filter for [`crate::store::RosterStore::list_students`]. Parents and
/// drivers are always narrowed to their own students regardless of filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentQuery {
  pub parent_id: Option<Uuid>,
  pub route_id:  Option<Uuid>,
}

/// The result of a successful enrollment: the student plus the first billing
/// cycle created alongside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
  pub student:       Student,
  pub first_payment: Payment,
}

/// What a student deletion took with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRemoval {
  pub student:            Student,
  pub payments_removed:   u64,
  pub attendance_removed: u64,
}
