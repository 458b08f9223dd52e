//! Handlers for `/students` endpoints.
//!
//! | Method   | Path              | Notes |
//! |----------|-------------------|-------|
//! | `GET`    | `/students`       | Scoped by role; admin may filter `?parent_id=&route_id=` |
//! | `POST`   | `/students`       | Admin; returns 201 with the student and its first payment |
//! | `GET`    | `/students/{id}`  | |
//! | `PUT`    | `/students/{id}`  | Admin; full-record edit |
//! | `DELETE` | `/students/{id}`  | Admin; removes payments and attendance too |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use camley_core::{
  roster::{Enrollment, NewStudent, Student, StudentPatch, StudentQuery, StudentRemoval},
  store::TransportStore,
};
use uuid::Uuid;

use crate::{AppState, auth::Authenticated, error::ApiError};

/// `GET /students`
pub async fn list<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Query(query): Query<StudentQuery>,
) -> Result<Json<Vec<Student>>, ApiError> {
  let students = state.store.list_students(caller, query).await.map_err(ApiError::from_store)?;
  Ok(Json(students))
}

/// `POST /students`
pub async fn enroll<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<NewStudent>,
) -> Result<(StatusCode, Json<Enrollment>), ApiError> {
  let enrollment = state.store.enroll(caller, body).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(enrollment)))
}

/// `GET /students/{id}`
pub async fn get_one<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Student>, ApiError> {
  let student = state.store.get_student(caller, id).await.map_err(ApiError::from_store)?;
  Ok(Json(student))
}

/// `PUT /students/{id}`
pub async fn update<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
  Json(patch): Json<StudentPatch>,
) -> Result<Json<Student>, ApiError> {
  let student =
    state.store.update_student(caller, id, patch).await.map_err(ApiError::from_store)?;
  Ok(Json(student))
}

/// `DELETE /students/{id}`
pub async fn delete<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<StudentRemoval>, ApiError> {
  let removal = state.store.delete_student(caller, id).await.map_err(ApiError::from_store)?;
  Ok(Json(removal))
}
