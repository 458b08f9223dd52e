//! Handlers for attendance entry and review.
//!
//! | Method | Path                    | Notes |
//! |--------|-------------------------|-------|
//! | `POST` | `/attendance`           | Driver; today's record for a student on their route |
//! | `PUT`  | `/attendance/manual`    | Driver; today's headcount summary, replaced on repeat |
//! | `POST` | `/run/status`           | Driver; body: `{"status":"started\|paused\|finished"}` |
//! | `GET`  | `/attendance/daily`     | Admin; `?date=YYYY-MM-DD` |
//! | `GET`  | `/attendance/report`    | Admin; `?driver_id=&date=` |

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
};
use camley_core::{
  attendance::{AttendanceRecord, ManualSummary, ManualSummaryInput, NewAttendance},
  fleet::RunStatus,
  report::{AttendanceReport, DailyAttendance},
  store::TransportStore,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::Authenticated, error::ApiError};

/// `POST /attendance`
pub async fn record<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<NewAttendance>,
) -> Result<(StatusCode, Json<AttendanceRecord>), ApiError> {
  let record =
    state.store.record_attendance(caller, body).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(record)))
}

/// `PUT /attendance/manual`
pub async fn save_manual<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<ManualSummaryInput>,
) -> Result<Json<ManualSummary>, ApiError> {
  let summary =
    state.store.save_manual_summary(caller, body).await.map_err(ApiError::from_store)?;
  Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct RunBody {
  pub status: RunStatus,
}

/// `POST /run/status`
pub async fn set_run_status<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<RunBody>,
) -> Result<StatusCode, ApiError> {
  state.store.set_run_status(caller, body.status).await.map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct DailyParams {
  pub date: NaiveDate,
}

/// `GET /attendance/daily?date=<date>`
pub async fn daily<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Query(params): Query<DailyParams>,
) -> Result<Json<DailyAttendance>, ApiError> {
  let daily =
    state.store.daily_attendance(caller, params.date).await.map_err(ApiError::from_store)?;
  Ok(Json(daily))
}

#[derive(Debug, Deserialize)]
pub struct ReportParams {
  pub driver_id: Uuid,
  pub date:      NaiveDate,
}

/// `GET /attendance/report?driver_id=<id>&date=<date>`
pub async fn report<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Query(params): Query<ReportParams>,
) -> Result<Json<AttendanceReport>, ApiError> {
  let report = state
    .store
    .attendance_report(caller, params.driver_id, params.date)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(report))
}
