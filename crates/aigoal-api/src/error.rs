//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error renders as `{"error": "<message>", "kind": "<kind>"}`.

use aigoal_core::{ErrorKind, store::StoreError};
use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  Validation(String),

  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized")]
  Unauthorized,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a store failure: rule rejections keep their message and map by
  /// kind; everything else is an internal error.
  pub fn from_store<E: StoreError>(e: E) -> Self {
    let Some(kind) = e.rejection().and_then(|r| r.kind()) else {
      tracing::error!(error = %e, "store failure");
      return Self::Store(Box::new(e));
    };
    tracing::debug!(error = %e, ?kind, "request rejected");
    match kind {
      ErrorKind::Validation => Self::Validation(e.to_string()),
      ErrorKind::Authorization => Self::Forbidden(e.to_string()),
      ErrorKind::NotFound => Self::NotFound(e.to_string()),
    }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      Self::Validation(_) => "validation",
      Self::Forbidden(_) => "authorization",
      Self::NotFound(_) => "not_found",
      Self::BadRequest(_) => "bad_request",
      Self::Unauthorized => "unauthenticated",
      Self::Store(_) => "internal",
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
      Self::Forbidden(_) => StatusCode::FORBIDDEN,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Unauthorized => StatusCode::UNAUTHORIZED,
      Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let body = Json(json!({ "error": self.to_string(), "kind": self.kind() }));
    let mut res = (self.status(), body).into_response();
    if matches!(self, Self::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"aigoal\""),
      );
    }
    res
  }
}

impl From<aigoal_core::Error> for ApiError {
  fn from(e: aigoal_core::Error) -> Self { Self::from_store(e) }
}

// ─── Extractor rejections ────────────────────────────────────────────────────

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}
