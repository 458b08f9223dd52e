//! JSON REST API for Camley.
//!
//! Exposes an axum [`Router`] backed by any [`TransportStore`]. Callers
//! authenticate with HTTP Basic (email and password) on every request; the
//! store decides what each role may do. TLS and request tracing are the
//! binary's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", camley_api::api_router(AppState::new(store)))
//! ```

pub mod accounts;
pub mod attendance;
pub mod auth;
pub mod billing;
pub mod error;
pub mod fleet;
pub mod outbox;
pub mod reports;
pub mod students;
pub mod support;
pub mod tracking;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, patch, post, put},
};
use camley_core::store::TransportStore;

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store: Arc<S>,
}

impl<S> AppState<S> {
  pub fn new(store: S) -> Self { Self { store: Arc::new(store) } }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: TransportStore + 'static,
{
  Router::new()
    // Accounts
    .route("/accounts", get(accounts::list::<S>))
    .route("/accounts/register", post(accounts::register::<S>))
    .route("/accounts/me", get(accounts::me::<S>))
    .route(
      "/accounts/{id}",
      get(accounts::get_one::<S>).patch(accounts::update::<S>).delete(accounts::delete::<S>),
    )
    .route("/accounts/{id}/active", post(accounts::set_active::<S>))
    // Roster
    .route("/students", get(students::list::<S>).post(students::enroll::<S>))
    .route(
      "/students/{id}",
      get(students::get_one::<S>).put(students::update::<S>).delete(students::delete::<S>),
    )
    // Routes
    .route("/routes", get(fleet::list_routes::<S>).post(fleet::create_route::<S>))
    .route(
      "/routes/{id}",
      get(fleet::get_route::<S>).put(fleet::update_route::<S>).delete(fleet::delete_route::<S>),
    )
    .route("/routes/{id}/active", post(fleet::set_route_active::<S>))
    .route("/routes/{id}/driver", post(fleet::assign_route_driver::<S>))
    .route("/routes/{id}/students", get(fleet::route_students::<S>))
    // Vehicles
    .route("/vehicles", get(fleet::list_vehicles::<S>).post(fleet::create_vehicle::<S>))
    .route(
      "/vehicles/{id}",
      get(fleet::get_vehicle::<S>)
        .patch(fleet::update_vehicle::<S>)
        .delete(fleet::delete_vehicle::<S>),
    )
    .route("/vehicles/{id}/status", post(fleet::set_vehicle_status::<S>))
    .route("/vehicles/{id}/driver", post(fleet::assign_vehicle::<S>))
    // Billing
    .route("/payments", get(billing::list::<S>).post(billing::register::<S>))
    .route("/payments/purge-overdue", post(billing::purge_overdue::<S>))
    .route(
      "/payments/{id}",
      patch(billing::update::<S>).delete(billing::delete::<S>),
    )
    .route("/payments/{id}/paid", post(billing::mark_paid::<S>))
    .route("/payments/{id}/seen", post(billing::mark_seen::<S>))
    .route("/finance/income", post(billing::record_income::<S>))
    .route("/finance/income/{id}", delete(billing::delete_income::<S>))
    .route("/finance/expenses", post(billing::record_expense::<S>))
    .route("/finance/expenses/{id}", delete(billing::delete_expense::<S>))
    .route("/finance/summary", get(reports::finance::<S>))
    // Attendance
    .route("/attendance", post(attendance::record::<S>))
    .route("/attendance/manual", put(attendance::save_manual::<S>))
    .route("/attendance/daily", get(attendance::daily::<S>))
    .route("/attendance/report", get(attendance::report::<S>))
    .route("/run/status", post(attendance::set_run_status::<S>))
    // Outbox
    .route("/notifications", get(outbox::list::<S>).post(outbox::send::<S>))
    .route("/notifications/unread", get(outbox::unread::<S>))
    .route("/notifications/read-all", post(outbox::mark_all_read::<S>))
    .route("/notifications/{id}/read", post(outbox::mark_read::<S>))
    .route(
      "/push/subscriptions",
      post(outbox::subscribe::<S>).delete(outbox::unsubscribe::<S>),
    )
    .route("/driver/delay", post(outbox::report_delay::<S>))
    .route("/driver/reports", post(outbox::driver_report::<S>))
    // Tracking
    .route("/location", put(tracking::update::<S>))
    .route("/location/{driver_id}", get(tracking::latest::<S>))
    .route("/location/{driver_id}/history", get(tracking::history::<S>))
    .route("/fleet/positions", get(tracking::fleet::<S>))
    // Support
    .route("/tickets", get(support::list::<S>).post(support::open::<S>))
    .route("/tickets/{id}/answer", post(support::answer::<S>))
    // Reports
    .route("/dashboard", get(reports::dashboard::<S>))
    .with_state(state)
}
