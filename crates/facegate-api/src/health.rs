//! Banner and store connectivity probe.

use axum::{
  extract::State,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use facegate_core::store::{IdentityStore, StoreError as _};
use tracing::error;

use crate::ApiState;

/// `GET /`
pub async fn index() -> &'static str { "facegate: face geometry registration and verification" }

/// `GET /test-db`: plain-text record count, or the store error with 503
/// (unreachable) or 500 (bad data).
pub async fn test_db<S>(State(state): State<ApiState<S>>) -> Response
where
  S: IdentityStore,
{
  match state.store.count().await {
    Ok(n) => (StatusCode::OK, format!("Store connection works! You have {n} records.")).into_response(),
    Err(e) => {
      error!(error = %e, "store connectivity check failed");
      let status = if e.is_unavailable() {
        StatusCode::SERVICE_UNAVAILABLE
      } else {
        StatusCode::INTERNAL_SERVER_ERROR
      };
      (status, format!("Store connection failed: {e}")).into_response()
    }
  }
}
