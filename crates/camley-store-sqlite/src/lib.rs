//! SQLite backend for the Camley school-transport service.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Each mutating operation runs as one
//! SQLite transaction; notifications it creates are pushed only after commit.

mod accounts;
mod attendance;
mod billing;
mod encode;
mod fleet;
mod outbox;
mod reports;
mod roster;
mod schema;
mod store;
mod support;
mod tracking;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
