//! Handlers for `/routes` and `/vehicles` endpoints.
//!
//! | Method   | Path                      | Notes |
//! |----------|---------------------------|-------|
//! | `GET`    | `/routes`                 | |
//! | `POST`   | `/routes`                 | Admin; body: [`NewRoute`] |
//! | `GET`    | `/routes/{id}`            | |
//! | `PUT`    | `/routes/{id}`            | Admin; full-record edit |
//! | `DELETE` | `/routes/{id}`            | Admin |
//! | `POST`   | `/routes/{id}/active`     | Admin; body: `{"active":false}` |
//! | `POST`   | `/routes/{id}/driver`     | Admin; body: `{"driver_id":"..."}` |
//! | `GET`    | `/routes/{id}/students`   | Admin, or the route's driver |
//! | `GET`    | `/vehicles`               | |
//! | `POST`   | `/vehicles`               | Admin; body: [`NewVehicle`] |
//! | `GET`    | `/vehicles/{id}`          | |
//! | `PATCH`  | `/vehicles/{id}`          | Admin; body: [`VehiclePatch`] |
//! | `DELETE` | `/vehicles/{id}`          | Admin |
//! | `POST`   | `/vehicles/{id}/status`   | Admin; body: `{"status":"maintenance"}` |
//! | `POST`   | `/vehicles/{id}/driver`   | Admin; also moves the driver's route onto this vehicle |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use camley_core::{
  fleet::{NewRoute, NewVehicle, Route, Vehicle, VehiclePatch, VehicleStatus},
  roster::Student,
  store::TransportStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, accounts::ActiveBody, auth::Authenticated, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct DriverBody {
  pub driver_id: Uuid,
}

// ─── Routes ───────────────────────────────────────────────────────────────────

/// `GET /routes`
pub async fn list_routes<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<Vec<Route>>, ApiError> {
  let routes = state.store.list_routes(caller).await.map_err(ApiError::from_store)?;
  Ok(Json(routes))
}

/// `POST /routes`
pub async fn create_route<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<NewRoute>,
) -> Result<(StatusCode, Json<Route>), ApiError> {
  let route = state.store.create_route(caller, body).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(route)))
}

/// `GET /routes/{id}`
pub async fn get_route<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Route>, ApiError> {
  let route = state.store.get_route(caller, id).await.map_err(ApiError::from_store)?;
  Ok(Json(route))
}

/// `PUT /routes/{id}`
pub async fn update_route<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<NewRoute>,
) -> Result<Json<Route>, ApiError> {
  let route = state.store.update_route(caller, id, body).await.map_err(ApiError::from_store)?;
  Ok(Json(route))
}

/// `DELETE /routes/{id}`
pub async fn delete_route<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Route>, ApiError> {
  let route = state.store.delete_route(caller, id).await.map_err(ApiError::from_store)?;
  Ok(Json(route))
}

/// `POST /routes/{id}/active`
pub async fn set_route_active<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<ActiveBody>,
) -> Result<Json<Route>, ApiError> {
  let route = state
    .store
    .set_route_active(caller, id, body.active)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(route))
}

/// `POST /routes/{id}/driver`
pub async fn assign_route_driver<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<DriverBody>,
) -> Result<Json<Route>, ApiError> {
  let route = state
    .store
    .assign_route_driver(caller, id, body.driver_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(route))
}

/// `GET /routes/{id}/students`
pub async fn route_students<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Student>>, ApiError> {
  let students = state.store.route_students(caller, id).await.map_err(ApiError::from_store)?;
  Ok(Json(students))
}

// ─── Vehicles ─────────────────────────────────────────────────────────────────

/// `GET /vehicles`
pub async fn list_vehicles<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<Vec<Vehicle>>, ApiError> {
  let vehicles = state.store.list_vehicles(caller).await.map_err(ApiError::from_store)?;
  Ok(Json(vehicles))
}

/// `POST /vehicles`
pub async fn create_vehicle<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<NewVehicle>,
) -> Result<(StatusCode, Json<Vehicle>), ApiError> {
  let vehicle = state.store.create_vehicle(caller, body).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(vehicle)))
}

/// `GET /vehicles/{id}`
pub async fn get_vehicle<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Vehicle>, ApiError> {
  let vehicle = state.store.get_vehicle(caller, id).await.map_err(ApiError::from_store)?;
  Ok(Json(vehicle))
}

/// `PATCH /vehicles/{id}`
pub async fn update_vehicle<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
  Json(patch): Json<VehiclePatch>,
) -> Result<Json<Vehicle>, ApiError> {
  let vehicle =
    state.store.update_vehicle(caller, id, patch).await.map_err(ApiError::from_store)?;
  Ok(Json(vehicle))
}

/// `DELETE /vehicles/{id}`
pub async fn delete_vehicle<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Vehicle>, ApiError> {
  let vehicle = state.store.delete_vehicle(caller, id).await.map_err(ApiError::from_store)?;
  Ok(Json(vehicle))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: VehicleStatus,
}

/// `POST /vehicles/{id}/status`
pub async fn set_vehicle_status<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Vehicle>, ApiError> {
  let vehicle = state
    .store
    .set_vehicle_status(caller, id, body.status)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(vehicle))
}

/// `POST /vehicles/{id}/driver`
pub async fn assign_vehicle<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<DriverBody>,
) -> Result<Json<Vehicle>, ApiError> {
  let vehicle = state
    .store
    .assign_vehicle(caller, body.driver_id, id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(vehicle))
}
