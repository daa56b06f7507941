//! Handlers for the identity record lifecycle.
//!
//! | Method   | Path         | Notes |
//! |----------|--------------|-------|
//! | `POST`   | `/save`      | Body: `{name, department, face}`; 201 + `{message, id}` |
//! | `GET`    | `/all`       | Every record, oldest first |
//! | `PUT`    | `/user/{id}` | Body: `{name?, department?}`; other keys ignored |
//! | `DELETE` | `/user/{id}` | 404 if already gone |

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use facegate_core::{
  identity::{IdentityRecord, parse_identity_id},
  store::IdentityStore,
  validate::{validate_create, validate_update},
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct SavedBody {
  pub message: &'static str,
  pub id:      Uuid,
}

#[derive(Debug, Serialize)]
pub struct MessageBody {
  pub message: &'static str,
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /save`
pub async fn save<S>(
  State(state): State<ApiState<S>>,
  body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IdentityStore,
{
  let Json(payload) = body?;
  let input = validate_create(&payload)?;

  let record = state.store.insert(input).await.map_err(ApiError::store)?;
  info!(id = %record.id, name = %record.name, department = %record.department, "registered identity");

  Ok((
    StatusCode::CREATED,
    Json(SavedBody { message: "Data saved", id: record.id }),
  ))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /all`
pub async fn all<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<IdentityRecord>>, ApiError>
where
  S: IdentityStore,
{
  let records = state.store.list_all().await.map_err(ApiError::store)?;
  Ok(Json(records))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /user/{id}`
pub async fn update<S>(
  State(state): State<ApiState<S>>,
  Path(raw_id): Path<String>,
  body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<MessageBody>, ApiError>
where
  S: IdentityStore,
{
  let id = parse_identity_id(&raw_id)?;
  let Json(payload) = body?;
  let patch = validate_update(&payload)?;

  let matched = state
    .store
    .update_fields(id, patch)
    .await
    .map_err(ApiError::store)?;
  if !matched {
    return Err(facegate_core::Error::NotFound(id).into());
  }

  info!(%id, "updated identity");
  Ok(Json(MessageBody { message: "User updated" }))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /user/{id}`
pub async fn remove<S>(
  State(state): State<ApiState<S>>,
  Path(raw_id): Path<String>,
) -> Result<Json<MessageBody>, ApiError>
where
  S: IdentityStore,
{
  let id = parse_identity_id(&raw_id)?;

  if !state.store.delete(id).await.map_err(ApiError::store)? {
    return Err(facegate_core::Error::NotFound(id).into());
  }

  info!(%id, "deleted identity");
  Ok(Json(MessageBody { message: "User deleted" }))
}
