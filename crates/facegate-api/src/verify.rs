//! Handler for `POST /verify`.
//!
//! Body: `{"face": {"eyes": [{"x":..,"y":..}, {"x":..,"y":..}]}}`. A match
//! answers 200 with the identity; no match answers 404
//! `{"status": "Face not found"}`. Store failures are reported as such and
//! never turned into a denial.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use facegate_core::{matching::MatchOutcome, store::IdentityStore, validate::validate_verify};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::{ApiState, error::ApiError};

pub const ACCESS_GRANTED: &str = "Access Granted";
pub const FACE_NOT_FOUND: &str = "Face not found";

#[derive(Debug, Serialize)]
pub struct GrantedBody {
  pub status:     &'static str,
  pub name:       String,
  pub department: String,
}

#[derive(Debug, Serialize)]
pub struct DeniedBody {
  pub status: &'static str,
}

/// `POST /verify`
pub async fn handler<S>(
  State(state): State<ApiState<S>>,
  body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError>
where
  S: IdentityStore,
{
  let Json(payload) = body?;
  let probe = validate_verify(&payload)?;

  let outcome = state.engine.verify(state.store.as_ref(), &probe.eyes).await?;

  let response = match outcome {
    MatchOutcome::Access(record) => {
      info!(
        id = %record.id,
        eyes = ?probe.eyes,
        face_width = ?probe.face_width,
        face_height = ?probe.face_height,
        "access granted"
      );
      Json(GrantedBody {
        status:     ACCESS_GRANTED,
        name:       record.name,
        department: record.department,
      })
      .into_response()
    }
    MatchOutcome::Denied => {
      info!(eyes = ?probe.eyes, "access denied: face not found");
      (StatusCode::NOT_FOUND, Json(DeniedBody { status: FACE_NOT_FOUND })).into_response()
    }
  };
  Ok(response)
}
