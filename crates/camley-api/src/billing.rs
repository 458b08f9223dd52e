//! Handlers for `/payments` and `/finance` endpoints.
//!
//! | Method   | Path                          | Notes |
//! |----------|-------------------------------|-------|
//! | `GET`    | `/payments`                   | `?status=all\|pending\|paid\|overdue&student_id=`; parents see their children only |
//! | `POST`   | `/payments`                   | Admin; body: [`NewPayment`] |
//! | `PATCH`  | `/payments/{id}`              | Admin; explicit edit, no ledger entry |
//! | `DELETE` | `/payments/{id}`              | Admin |
//! | `POST`   | `/payments/{id}/paid`         | Admin; body: `{"method":"transfer"}`, method optional |
//! | `POST`   | `/payments/{id}/seen`         | Parent acknowledgement |
//! | `POST`   | `/payments/purge-overdue`     | Admin; returns `{"purged":n}` |
//! | `POST`   | `/finance/income`             | Admin; manual income entry |
//! | `DELETE` | `/finance/income/{id}`        | Admin |
//! | `POST`   | `/finance/expenses`           | Admin; manual expense entry |
//! | `DELETE` | `/finance/expenses/{id}`      | Admin |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use camley_core::{
  billing::{
    Expense, Income, NewExpense, NewIncome, NewPayment, Payment, PaymentPatch, PaymentQuery,
  },
  store::TransportStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, auth::Authenticated, error::ApiError};

// ─── Payments ─────────────────────────────────────────────────────────────────

/// `GET /payments`
pub async fn list<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Query(query): Query<PaymentQuery>,
) -> Result<Json<Vec<Payment>>, ApiError> {
  let payments = state.store.list_payments(caller, query).await.map_err(ApiError::from_store)?;
  Ok(Json(payments))
}

/// `POST /payments`
pub async fn register<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<NewPayment>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
  let payment =
    state.store.register_payment(caller, body).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(payment)))
}

/// `PATCH /payments/{id}`
pub async fn update<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
  Json(patch): Json<PaymentPatch>,
) -> Result<Json<Payment>, ApiError> {
  let payment =
    state.store.update_payment(caller, id, patch).await.map_err(ApiError::from_store)?;
  Ok(Json(payment))
}

/// `DELETE /payments/{id}`
pub async fn delete<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Payment>, ApiError> {
  let payment = state.store.delete_payment(caller, id).await.map_err(ApiError::from_store)?;
  Ok(Json(payment))
}

#[derive(Debug, Default, Deserialize)]
pub struct MarkPaidBody {
  pub method: Option<String>,
}

/// `POST /payments/{id}/paid`
pub async fn mark_paid<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<MarkPaidBody>,
) -> Result<Json<Payment>, ApiError> {
  let payment = state.store.mark_paid(caller, id, body.method).await.map_err(ApiError::from_store)?;
  Ok(Json(payment))
}

/// `POST /payments/{id}/seen`
pub async fn mark_seen<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Payment>, ApiError> {
  let payment =
    state.store.mark_payment_seen(caller, id).await.map_err(ApiError::from_store)?;
  Ok(Json(payment))
}

#[derive(Debug, Serialize)]
pub struct Purged {
  pub purged: u64,
}

/// `POST /payments/purge-overdue`
pub async fn purge_overdue<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<Purged>, ApiError> {
  let purged = state.store.purge_overdue(caller).await.map_err(ApiError::from_store)?;
  Ok(Json(Purged { purged }))
}

// ─── Ledger ───────────────────────────────────────────────────────────────────

/// `POST /finance/income`
pub async fn record_income<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<NewIncome>,
) -> Result<(StatusCode, Json<Income>), ApiError> {
  let income = state.store.record_income(caller, body).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(income)))
}

/// `DELETE /finance/income/{id}`
pub async fn delete_income<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Income>, ApiError> {
  let income = state.store.delete_income(caller, id).await.map_err(ApiError::from_store)?;
  Ok(Json(income))
}

/// `POST /finance/expenses`
pub async fn record_expense<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<NewExpense>,
) -> Result<(StatusCode, Json<Expense>), ApiError> {
  let expense = state.store.record_expense(caller, body).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(expense)))
}

/// `DELETE /finance/expenses/{id}`
pub async fn delete_expense<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Expense>, ApiError> {
  let expense = state.store.delete_expense(caller, id).await.map_err(ApiError::from_store)?;
  Ok(Json(expense))
}
