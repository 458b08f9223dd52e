//! Handlers for `/accounts` endpoints.
//!
//! | Method   | Path                     | Notes |
//! |----------|--------------------------|-------|
//! | `POST`   | `/accounts/register`     | Open to anyone; an admin caller may create drivers |
//! | `GET`    | `/accounts/me`           | The caller's own account |
//! | `GET`    | `/accounts`              | Admin; `?role=&active=` |
//! | `GET`    | `/accounts/{id}`         | Admin, or the account itself |
//! | `PATCH`  | `/accounts/{id}`         | Admin; body: [`AccountPatch`] |
//! | `POST`   | `/accounts/{id}/active`  | Admin; body: `{"active":true}` |
//! | `DELETE` | `/accounts/{id}`         | Admin |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use camley_core::{
  Error,
  account::{Account, AccountPatch, AccountQuery, NewAccount, Role},
  store::TransportStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  auth::{Authenticated, MaybeAuthenticated, hash_password},
  error::ApiError,
};

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub name:     String,
  pub email:    String,
  pub password: String,
  pub phone:    Option<String>,
  pub address:  Option<String>,
  pub gender:   Option<String>,
  /// Unknown or missing roles register a parent.
  pub role:     Option<String>,
  pub active:   Option<bool>,
}

/// `POST /accounts/register`
pub async fn register<S: TransportStore>(
  State(state): State<AppState<S>>,
  MaybeAuthenticated(caller): MaybeAuthenticated,
  Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
  if body.password.is_empty() {
    return Err(Error::validation("password", "must not be empty").into());
  }
  let role = body.role.as_deref().and_then(|r| r.parse().ok()).unwrap_or(Role::Parent);
  let input = NewAccount {
    name: body.name,
    email: body.email,
    password_hash: hash_password(&body.password)?,
    phone: body.phone,
    address: body.address,
    gender: body.gender,
    role,
    active: body.active,
  };
  let account = state.store.register(caller, input).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(account)))
}

// ─── Read ─────────────────────────────────────────────────────────────────────

/// `GET /accounts/me`
pub async fn me<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<Account>, ApiError> {
  let account = state
    .store
    .get_account(caller, caller.account_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(account))
}

/// `GET /accounts[?role=<role>][&active=<bool>]`
pub async fn list<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Query(query): Query<AccountQuery>,
) -> Result<Json<Vec<Account>>, ApiError> {
  let accounts = state.store.list_accounts(caller, query).await.map_err(ApiError::from_store)?;
  Ok(Json(accounts))
}

/// `GET /accounts/{id}`
pub async fn get_one<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Account>, ApiError> {
  let account = state.store.get_account(caller, id).await.map_err(ApiError::from_store)?;
  Ok(Json(account))
}

// ─── Administer ───────────────────────────────────────────────────────────────

/// `PATCH /accounts/{id}`
pub async fn update<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
  Json(patch): Json<AccountPatch>,
) -> Result<Json<Account>, ApiError> {
  let account =
    state.store.update_account(caller, id, patch).await.map_err(ApiError::from_store)?;
  Ok(Json(account))
}

#[derive(Debug, Deserialize)]
pub struct ActiveBody {
  pub active: bool,
}

/// `POST /accounts/{id}/active`
pub async fn set_active<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<ActiveBody>,
) -> Result<Json<Account>, ApiError> {
  let account =
    state.store.set_active(caller, id, body.active).await.map_err(ApiError::from_store)?;
  Ok(Json(account))
}

/// `DELETE /accounts/{id}`
pub async fn delete<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Account>, ApiError> {
  let account = state.store.delete_account(caller, id).await.map_err(ApiError::from_store)?;
  Ok(Json(account))
}
