//! Handlers for GPS location endpoints.
//!
//! | Method | Path                               | Notes |
//! |--------|------------------------------------|-------|
//! | `PUT`  | `/location`                        | Driver; body: `{"lat":..,"lng":..}` |
//! | `GET`  | `/location/{driver_id}`            | Admin, the driver, or a parent riding the route |
//! | `GET`  | `/location/{driver_id}/history`    | Admin; `?limit=` (default 200, max 500) |
//! | `GET`  | `/fleet/positions`                 | Admin |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use camley_core::{
  location::{Coordinates, DEFAULT_HISTORY, FleetPosition, Location, LocationPoint},
  store::TransportStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::Authenticated, error::ApiError};

/// `PUT /location`
pub async fn update<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<Coordinates>,
) -> Result<Json<Location>, ApiError> {
  let location = state.store.update_location(caller, body).await.map_err(ApiError::from_store)?;
  Ok(Json(location))
}

/// `GET /location/{driver_id}`
pub async fn latest<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(driver_id): Path<Uuid>,
) -> Result<Json<Location>, ApiError> {
  let location =
    state.store.latest_location(caller, driver_id).await.map_err(ApiError::from_store)?;
  Ok(Json(location))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
  pub limit: Option<u32>,
}

/// `GET /location/{driver_id}/history`
pub async fn history<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(driver_id): Path<Uuid>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<LocationPoint>>, ApiError> {
  let points = state
    .store
    .location_history(caller, driver_id, params.limit.unwrap_or(DEFAULT_HISTORY))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(points))
}

/// `GET /fleet/positions`
pub async fn fleet<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<Vec<FleetPosition>>, ApiError> {
  let positions = state.store.fleet_positions(caller).await.map_err(ApiError::from_store)?;
  Ok(Json(positions))
}
