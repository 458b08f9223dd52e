//! Handlers for notifications, push subscriptions, and driver broadcasts.
//!
//! | Method   | Path                          | Notes |
//! |----------|-------------------------------|-------|
//! | `GET`    | `/notifications`              | `?recipient_id=&limit=`; defaults to the caller, 20 items |
//! | `POST`   | `/notifications`              | Admin; body: [`NewNotification`] |
//! | `GET`    | `/notifications/unread`       | `{"unread":n}` for the caller or `?recipient_id=` |
//! | `POST`   | `/notifications/{id}/read`    | |
//! | `POST`   | `/notifications/read-all`     | Returns `{"updated":n}` |
//! | `POST`   | `/push/subscriptions`         | Browser `PushSubscription` JSON |
//! | `DELETE` | `/push/subscriptions`         | Body: `{"endpoint":"..."}` |
//! | `POST`   | `/driver/delay`               | Driver; body: [`DelayReport`] |
//! | `POST`   | `/driver/reports`             | Driver; body: [`DriverReport`] |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use camley_core::{
  notification::{
    DelayReport, DriverReport, NewNotification, NewPushSubscription, Notification,
    PushSubscription,
  },
  store::TransportStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, auth::Authenticated, error::ApiError};

const DEFAULT_LIMIT: u32 = 20;

// ─── Notifications ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub recipient_id: Option<Uuid>,
  pub limit:        Option<u32>,
}

/// `GET /notifications`
pub async fn list<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Notification>>, ApiError> {
  let recipient = params.recipient_id.unwrap_or(caller.account_id);
  let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
  let notifications = state
    .store
    .list_notifications(caller, recipient, limit)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(notifications))
}

/// `POST /notifications`
pub async fn send<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<NewNotification>,
) -> Result<(StatusCode, Json<Notification>), ApiError> {
  let notification = state.store.notify(caller, body).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(notification)))
}

#[derive(Debug, Serialize)]
pub struct Unread {
  pub unread: u64,
}

/// `GET /notifications/unread`
pub async fn unread<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Query(params): Query<ListParams>,
) -> Result<Json<Unread>, ApiError> {
  let recipient = params.recipient_id.unwrap_or(caller.account_id);
  let unread =
    state.store.unread_count(caller, recipient).await.map_err(ApiError::from_store)?;
  Ok(Json(Unread { unread }))
}

/// `POST /notifications/{id}/read`
pub async fn mark_read<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
  let notification = state.store.mark_read(caller, id).await.map_err(ApiError::from_store)?;
  Ok(Json(notification))
}

#[derive(Debug, Serialize)]
pub struct Updated {
  pub updated: u64,
}

/// `POST /notifications/read-all`
pub async fn mark_all_read<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<Updated>, ApiError> {
  let updated = state.store.mark_all_read(caller).await.map_err(ApiError::from_store)?;
  Ok(Json(Updated { updated }))
}

// ─── Push subscriptions ───────────────────────────────────────────────────────

/// `POST /push/subscriptions`
pub async fn subscribe<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<NewPushSubscription>,
) -> Result<(StatusCode, Json<PushSubscription>), ApiError> {
  let subscription =
    state.store.subscribe_push(caller, body).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(subscription)))
}

#[derive(Debug, Deserialize)]
pub struct EndpointBody {
  pub endpoint: String,
}

/// `DELETE /push/subscriptions`
pub async fn unsubscribe<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<EndpointBody>,
) -> Result<StatusCode, ApiError> {
  let removed =
    state.store.unsubscribe_push(caller, body.endpoint).await.map_err(ApiError::from_store)?;
  Ok(if removed { StatusCode::NO_CONTENT } else { StatusCode::NOT_FOUND })
}

// ─── Driver broadcasts ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Notified {
  pub notified: u64,
}

/// `POST /driver/delay`
pub async fn report_delay<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<DelayReport>,
) -> Result<Json<Notified>, ApiError> {
  let notified = state.store.report_delay(caller, body).await.map_err(ApiError::from_store)?;
  Ok(Json(Notified { notified }))
}

/// `POST /driver/reports`
pub async fn driver_report<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<DriverReport>,
) -> Result<Json<Notified>, ApiError> {
  let notified = state.store.driver_report(caller, body).await.map_err(ApiError::from_store)?;
  Ok(Json(Notified { notified }))
}
