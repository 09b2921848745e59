//! HTTP Basic-auth actor extraction.
//!
//! The Basic username is the account address; the password is checked
//! against the argon2 PHC string configured for that account. A handler that
//! takes an [`Actor`] only runs for an authenticated account, and the actor
//! it receives is the one every lifecycle rule is checked against.

use std::collections::HashMap;

use aigoal_core::{Address, store::GoalStore};
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

/// One entry of the server's `accounts` list.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
  pub address:       Address,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// The accounts allowed to submit mutations.
#[derive(Debug, Clone, Default)]
pub struct Accounts {
  hashes: HashMap<Address, String>,
}

impl Accounts {
  pub fn new(configs: impl IntoIterator<Item = AccountConfig>) -> Self {
    Self {
      hashes: configs
        .into_iter()
        .map(|c| (c.address, c.password_hash))
        .collect(),
    }
  }

  pub fn len(&self) -> usize { self.hashes.len() }

  pub fn is_empty(&self) -> bool { self.hashes.is_empty() }

  /// Verify Basic credentials from `headers` and return the account.
  pub fn verify(&self, headers: &HeaderMap) -> Result<Address, ApiError> {
    let (address, password) = basic_credentials(headers)?;
    let stored = self.hashes.get(&address).ok_or(ApiError::Unauthorized)?;

    let parsed_hash = PasswordHash::new(stored).map_err(|_| ApiError::Unauthorized)?;
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed_hash)
      .map_err(|_| ApiError::Unauthorized)?;

    Ok(address)
  }
}

fn basic_credentials(headers: &HeaderMap) -> Result<(Address, String), ApiError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds   = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  let address = username.parse().map_err(|_| ApiError::Unauthorized)?;
  Ok((address, password.to_owned()))
}

/// The authenticated account behind a mutation request.
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub Address);

impl<S> FromRequestParts<AppState<S>> for Actor
where
  S: GoalStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let accounts = state.accounts.clone();
    let headers  = parts.headers.clone();
    // argon2 verification blocks; run it off the async workers.
    let address = tokio::task::spawn_blocking(move || accounts.verify(&headers))
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))??;
    tracing::debug!(%address, "authenticated");
    Ok(Actor(address))
  }
}
