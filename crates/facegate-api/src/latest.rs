//! Handlers for `/latest`, the hand-off slot between a capture process and a
//! polling client.
//!
//! | Method | Path      | Notes |
//! |--------|-----------|-------|
//! | `POST` | `/latest` | Body: a full geometry; 204 |
//! | `GET`  | `/latest` | 200 `{face, age_ms}`, or 404 when nothing fresh |

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
};
use facegate_core::{geometry::Geometry, store::IdentityStore, validate::validate_geometry};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct LatestBody {
  pub face:   Geometry,
  pub age_ms: u64,
}

/// `POST /latest`
pub async fn publish<S>(
  State(state): State<ApiState<S>>,
  body: Result<Json<Value>, JsonRejection>,
) -> Result<StatusCode, ApiError>
where
  S: IdentityStore,
{
  let Json(payload) = body?;
  let face = validate_geometry(&payload)?;
  state.latest.publish(face);
  debug!(?face, "published latest reading");
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /latest`
pub async fn current<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<LatestBody>, ApiError>
where
  S: IdentityStore,
{
  let reading = state.latest.current().ok_or_else(|| {
    ApiError::NotFound(format!(
      "no face reading in the last {}s",
      state.latest.freshness().as_secs()
    ))
  })?;

  Ok(Json(LatestBody {
    face:   reading.face,
    age_ms: u64::try_from(reading.age.as_millis()).unwrap_or(u64::MAX),
  }))
}
