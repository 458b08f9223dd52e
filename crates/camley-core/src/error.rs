//! Error types for `camley-core`.
//!
//! [`Error`] carries the domain taxonomy shared by every backend. Backends
//! wrap it in their own error type and expose the classification through
//! [`DomainError`], which is all the HTTP layer needs to pick a status code.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("invalid {field}: {reason}")]
  Validation { field: &'static str, reason: String },

  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: Uuid },

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("account is inactive; contact the administrator")]
  AccountInactive,

  #[error("invalid email or password")]
  InvalidCredentials,

  #[error("unknown {kind} value: {value:?}")]
  UnknownVariant { kind: &'static str, value: String },
}

impl Error {
  pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
    Self::Validation { field, reason: reason.into() }
  }

  pub fn not_found(entity: &'static str, id: Uuid) -> Self {
    Self::NotFound { entity, id }
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Forbidden(_) => ErrorKind::Forbidden,
      Self::Validation { .. } => ErrorKind::Validation,
      Self::NotFound { .. } => ErrorKind::NotFound,
      Self::Conflict(_) => ErrorKind::Conflict,
      Self::AccountInactive => ErrorKind::Inactive,
      Self::InvalidCredentials => ErrorKind::Unauthenticated,
      Self::UnknownVariant { .. } => ErrorKind::Internal,
    }
  }
}

/// Coarse classification of a failure, independent of the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
  Forbidden,
  Validation,
  NotFound,
  Conflict,
  Inactive,
  Unauthenticated,
  Internal,
}

/// Implemented by backend error types so callers can classify failures
/// without knowing the concrete backend.
pub trait DomainError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> ErrorKind;
}

impl DomainError for Error {
  fn kind(&self) -> ErrorKind { Error::kind(self) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
