//! Core types and trait definitions for the Camley school-transport service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement the traits in [`store`]; the API layer depends
//! only on those traits.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod attendance;
pub mod auth;
pub mod billing;
pub mod clock;
pub mod error;
pub mod fleet;
pub mod location;
pub mod messages;
pub mod notification;
pub mod push;
pub mod report;
pub mod roster;
pub mod store;
pub mod support;

pub use error::{DomainError, Error, ErrorKind, Result};
