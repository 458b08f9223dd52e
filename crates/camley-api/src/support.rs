//! Handlers for `/tickets` endpoints.
//!
//! | Method | Path                     | Notes |
//! |--------|--------------------------|-------|
//! | `GET`  | `/tickets`               | Scoped by role |
//! | `POST` | `/tickets`               | Any account; body: [`NewTicket`] |
//! | `POST` | `/tickets/{id}/answer`   | Admin, or the driver it was forwarded to |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use camley_core::{
  store::TransportStore,
  support::{NewTicket, Ticket, TicketAnswer},
};
use uuid::Uuid;

use crate::{AppState, auth::Authenticated, error::ApiError};

/// `GET /tickets`
pub async fn list<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<Vec<Ticket>>, ApiError> {
  let tickets = state.store.list_tickets(caller).await.map_err(ApiError::from_store)?;
  Ok(Json(tickets))
}

/// `POST /tickets`
pub async fn open<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<NewTicket>,
) -> Result<(StatusCode, Json<Ticket>), ApiError> {
  let ticket = state.store.open_ticket(caller, body).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(ticket)))
}

/// `POST /tickets/{id}/answer`
pub async fn answer<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<TicketAnswer>,
) -> Result<Json<Ticket>, ApiError> {
  let ticket = state.store.answer_ticket(caller, id, body).await.map_err(ApiError::from_store)?;
  Ok(Json(ticket))
}
