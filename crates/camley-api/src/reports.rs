//! Administrator dashboards.
//!
//! | Method | Path                | Notes |
//! |--------|---------------------|-------|
//! | `GET`  | `/dashboard`        | Counts and this week's ledger totals |
//! | `GET`  | `/finance/summary`  | Totals, month to date, latest entries |

use axum::{Json, extract::State};
use camley_core::{
  report::{Dashboard, FinanceSummary},
  store::TransportStore,
};

use crate::{AppState, auth::Authenticated, error::ApiError};

/// `GET /dashboard`
pub async fn dashboard<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<Dashboard>, ApiError> {
  let dashboard = state.store.dashboard(caller).await.map_err(ApiError::from_store)?;
  Ok(Json(dashboard))
}

/// `GET /finance/summary`
pub async fn finance<S: TransportStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<FinanceSummary>, ApiError> {
  let summary = state.store.finance_summary(caller).await.map_err(ApiError::from_store)?;
  Ok(Json(summary))
}
