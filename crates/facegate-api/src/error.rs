//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use facegate_core::{matching::MatchError, store::StoreError, validate::ValidationError};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("invalid payload: {0}")]
  Validation(#[from] ValidationError),

  /// The store could not be reached or did not answer in time.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// The store answered, but with something it should never hold.
  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store<E: StoreError>(e: E) -> Self {
    if e.is_unavailable() {
      tracing::error!(error = %e, "identity store unavailable");
      ApiError::Store(Box::new(e))
    } else {
      tracing::error!(error = %e, "identity store returned bad data");
      ApiError::Internal(Box::new(e))
    }
  }
}

impl From<facegate_core::Error> for ApiError {
  fn from(e: facegate_core::Error) -> Self {
    match e {
      facegate_core::Error::InvalidId(_) => ApiError::BadRequest(e.to_string()),
      facegate_core::Error::NotFound(_) => ApiError::NotFound(e.to_string()),
    }
  }
}

impl<E: StoreError> From<MatchError<E>> for ApiError {
  fn from(e: MatchError<E>) -> Self {
    match e {
      MatchError::InvalidGeometry(_) => ApiError::BadRequest(e.to_string()),
      MatchError::Store(inner) => ApiError::store(inner),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
      ApiError::Store(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
      ApiError::Internal(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
