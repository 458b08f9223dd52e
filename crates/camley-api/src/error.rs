//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure carries the backend-independent [`ErrorKind`], which picks
//! the status code. The body is always `{"error": "...", "kind": "..."}`.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use camley_core::{DomainError, ErrorKind};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
  pub kind:    ErrorKind,
  pub message: String,
}

impl ApiError {
  /// Classify a backend failure. Internal failures are logged here and
  /// replaced with a generic message so driver details never leave the
  /// process.
  pub fn from_store<E: DomainError>(err: E) -> Self {
    let kind = err.kind();
    let message = if kind == ErrorKind::Internal {
      tracing::error!(error = %err, "store operation failed");
      "internal error".to_owned()
    } else {
      err.to_string()
    };
    Self { kind, message }
  }

  pub fn internal(context: impl std::fmt::Display) -> Self {
    tracing::error!(error = %context, "request failed");
    Self { kind: ErrorKind::Internal, message: "internal error".to_owned() }
  }

  pub fn status(&self) -> StatusCode {
    match self.kind {
      ErrorKind::Forbidden | ErrorKind::Inactive => StatusCode::FORBIDDEN,
      ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
      ErrorKind::NotFound => StatusCode::NOT_FOUND,
      ErrorKind::Conflict => StatusCode::CONFLICT,
      ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
      ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<camley_core::Error> for ApiError {
  fn from(err: camley_core::Error) -> Self { Self::from_store(err) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = Json(json!({ "error": self.message, "kind": self.kind.as_ref() }));
    let mut res = (status, body).into_response();
    if self.kind == ErrorKind::Unauthenticated {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"camley\""),
      );
    }
    res
  }
}

#[cfg(test)]
mod tests {
  use camley_core::Error;
  use uuid::Uuid;

  use super::*;

  #[test]
  fn taxonomy_maps_to_status_codes() {
    let cases = [
      (Error::Forbidden("no".into()), StatusCode::FORBIDDEN),
      (Error::AccountInactive, StatusCode::FORBIDDEN),
      (Error::validation("name", "must not be empty"), StatusCode::UNPROCESSABLE_ENTITY),
      (Error::not_found("student", Uuid::nil()), StatusCode::NOT_FOUND),
      (Error::Conflict("twice".into()), StatusCode::CONFLICT),
      (Error::InvalidCredentials, StatusCode::UNAUTHORIZED),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::from(err).status(), status);
    }
  }

  #[test]
  fn internal_errors_hide_their_message() {
    let err = ApiError::from(Error::UnknownVariant { kind: "role", value: "root".into() });
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.message, "internal error");
  }

  #[test]
  fn unauthenticated_carries_challenge() {
    let res = ApiError::from(Error::InvalidCredentials).into_response();
    assert_eq!(
      res.headers().get(header::WWW_AUTHENTICATE).unwrap(),
      "Basic realm=\"camley\""
    );
  }
}
