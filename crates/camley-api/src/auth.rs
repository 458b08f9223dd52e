//! HTTP Basic authentication against the Account Directory.
//!
//! The username is the account email. Every request is verified on its own;
//! there are no sessions.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use camley_core::{
  Error,
  account::Caller,
  store::{AccountStore, TransportStore},
};
use rand_core::OsRng;

use crate::{AppState, error::ApiError};

/// The verified caller. Rejects the request with 401 when credentials are
/// missing or wrong and with 403 when the account is inactive.
pub struct Authenticated(pub Caller);

/// Like [`Authenticated`], but a request without an `Authorization` header
/// passes through as `None`. Bad credentials are still rejected.
pub struct MaybeAuthenticated(pub Option<Caller>);

fn denied() -> ApiError { Error::InvalidCredentials.into() }

/// Hash a plaintext password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| ApiError::internal(format!("argon2: {e}")))
}

fn decode_basic(value: &str) -> Result<(String, String), ApiError> {
  let encoded = value.strip_prefix("Basic ").ok_or_else(denied)?;
  let decoded = B64.decode(encoded).map_err(|_| denied())?;
  let creds = String::from_utf8(decoded).map_err(|_| denied())?;
  let (email, password) = creds.split_once(':').ok_or_else(denied)?;
  Ok((email.to_owned(), password.to_owned()))
}

/// Verify the `Authorization` header, if any, against `store`.
pub async fn authenticate<S: AccountStore>(
  store: &S,
  headers: &HeaderMap,
) -> Result<Option<Caller>, ApiError> {
  let Some(value) = headers.get(header::AUTHORIZATION) else {
    return Ok(None);
  };
  let value = value.to_str().map_err(|_| denied())?;
  let (email, password) = decode_basic(value)?;

  let creds = store
    .credentials(email)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(denied)?;

  let parsed = PasswordHash::new(&creds.password_hash).map_err(|_| denied())?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .map_err(|_| denied())?;

  if !creds.active {
    return Err(Error::AccountInactive.into());
  }
  Ok(Some(Caller::new(creds.account_id, creds.role)))
}

impl<S: TransportStore> FromRequestParts<AppState<S>> for Authenticated {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    authenticate(&*state.store, &parts.headers).await?.map(Self).ok_or_else(denied)
  }
}

impl<S: TransportStore> FromRequestParts<AppState<S>> for MaybeAuthenticated {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    authenticate(&*state.store, &parts.headers).await.map(Self)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  #[test]
  fn decodes_email_and_password() {
    let (email, password) = decode_basic(&basic("ana@camley.com", "s3:cret")).unwrap();
    assert_eq!(email, "ana@camley.com");
    assert_eq!(password, "s3:cret");
  }

  #[test]
  fn rejects_other_schemes_and_bad_base64() {
    assert!(decode_basic("Bearer abc").is_err());
    assert!(decode_basic("Basic !!!not-base64!!!").is_err());
    assert!(decode_basic(&format!("Basic {}", B64.encode("no-colon"))).is_err());
  }

  #[test]
  fn hashes_verify() {
    let hash = hash_password("secret").unwrap();
    let parsed = PasswordHash::new(&hash).unwrap();
    assert!(Argon2::default().verify_password(b"secret", &parsed).is_ok());
    assert!(Argon2::default().verify_password(b"wrong", &parsed).is_err());
  }
}
