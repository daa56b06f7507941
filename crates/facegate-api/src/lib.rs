//! JSON HTTP API for facegate.
//!
//! Exposes an axum [`Router`] backed by any
//! [`facegate_core::store::IdentityStore`]. CORS, tracing layers and the
//! listener are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = facegate_api::api_router(ApiState::new(store, engine, latest));
//! ```

pub mod error;
pub mod health;
pub mod latest;
pub mod records;
pub mod verify;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use facegate_core::{latest::LatestReading, matching::MatchEngine, store::IdentityStore};

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:  Arc<S>,
  pub engine: MatchEngine,
  pub latest: Arc<LatestReading>,
}

impl<S> ApiState<S> {
  pub fn new(store: Arc<S>, engine: MatchEngine, latest: Arc<LatestReading>) -> Self {
    Self { store, engine, latest }
  }
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      engine: self.engine,
      latest: Arc::clone(&self.latest),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: IdentityStore + 'static,
{
  Router::new()
    .route("/", get(health::index))
    .route("/test-db", get(health::test_db::<S>))
    // Lifecycle
    .route("/save", post(records::save::<S>))
    .route("/all", get(records::all::<S>))
    .route("/user/{id}", put(records::update::<S>).delete(records::remove::<S>))
    // Matching
    .route("/verify", post(verify::handler::<S>))
    // Latest reading hand-off
    .route("/latest", get(latest::current::<S>).post(latest::publish::<S>))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use std::convert::Infallible;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use facegate_core::{
    identity::{IdentityPatch, IdentityRecord, NewIdentity},
    store::{RangeQuery, StoreError},
  };
  use facegate_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  async fn make_state() -> ApiState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    ApiState::new(
      Arc::new(store),
      MatchEngine::new(5),
      Arc::new(LatestReading::default()),
    )
  }

  async fn send<S>(state: ApiState<S>, method: &str, uri: &str, body: Option<Value>) -> Response
  where
    S: IdentityStore + 'static,
  {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    api_router(state).oneshot(builder.body(body).unwrap()).await.unwrap()
  }

  async fn json_of(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn text_of(resp: Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
  }

  fn ann() -> Value {
    json!({
      "name": "Ann",
      "department": "Eng",
      "face": {
        "face_width": 80,
        "face_height": 90,
        "eyes": [{"x": 10, "y": 10}, {"x": 40, "y": 10}],
      },
    })
  }

  fn probe(left: (i64, i64), right: (i64, i64)) -> Value {
    json!({"face": {"eyes": [
      {"x": left.0, "y": left.1},
      {"x": right.0, "y": right.1},
    ]}})
  }

  async fn save(state: &ApiState<SqliteStore>, body: Value) -> String {
    let resp = send(state.clone(), "POST", "/save", Some(body)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    json_of(resp).await["id"].as_str().unwrap().to_owned()
  }

  // ── Save / verify ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn save_then_verify_grants_access() {
    let state = make_state().await;

    let resp = send(state.clone(), "POST", "/save", Some(ann())).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json_of(resp).await;
    assert_eq!(body["message"], "Data saved");
    assert!(!body["id"].as_str().unwrap().is_empty());

    let resp = send(state, "POST", "/verify", Some(probe((12, 9), (42, 11)))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      json_of(resp).await,
      json!({"status": "Access Granted", "name": "Ann", "department": "Eng"})
    );
  }

  #[tokio::test]
  async fn verify_outside_tolerance_is_face_not_found() {
    let state = make_state().await;
    let mut body = ann();
    body["face"]["eyes"] = json!([{"x": 100, "y": 100}, {"x": 200, "y": 100}]);
    save(&state, body).await;

    let resp = send(state.clone(), "POST", "/verify", Some(probe((105, 100), (195, 100)))).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(state, "POST", "/verify", Some(probe((106, 100), (200, 100)))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_of(resp).await, json!({"status": "Face not found"}));
  }

  #[tokio::test]
  async fn save_rejects_missing_fields() {
    let state = make_state().await;
    let resp = send(state.clone(), "POST", "/save", Some(json!({"name": "Ann"}))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err = json_of(resp).await["error"].as_str().unwrap().to_owned();
    assert!(err.contains("department"), "error: {err}");

    assert_eq!(state.store.count().await.unwrap(), 0);
  }

  #[tokio::test]
  async fn save_rejects_single_eye() {
    let state = make_state().await;
    let mut body = ann();
    body["face"]["eyes"] = json!([{"x": 10, "y": 10}]);
    let resp = send(state.clone(), "POST", "/save", Some(body)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state.store.count().await.unwrap(), 0);
  }

  #[tokio::test]
  async fn malformed_json_is_bad_request() {
    let state = make_state().await;
    let req = Request::builder()
      .method("POST")
      .uri("/save")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from("{not json"))
      .unwrap();
    let resp = api_router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json_of(resp).await["error"].is_string());
  }

  #[tokio::test]
  async fn missing_body_is_bad_request() {
    let state = make_state().await;
    let resp = send(state, "POST", "/verify", None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Verify never touches the store on bad input ─────────────────────────────

  /// A store that must not be reached.
  struct UnreachableStore;

  impl IdentityStore for UnreachableStore {
    type Error = Infallible;

    async fn insert(&self, _: NewIdentity) -> Result<IdentityRecord, Infallible> {
      unreachable!("insert")
    }
    async fn find_by_id(&self, _: Uuid) -> Result<Option<IdentityRecord>, Infallible> {
      unreachable!("find_by_id")
    }
    async fn find_range(&self, _: &RangeQuery) -> Result<Vec<IdentityRecord>, Infallible> {
      unreachable!("find_range")
    }
    async fn update_fields(&self, _: Uuid, _: IdentityPatch) -> Result<bool, Infallible> {
      unreachable!("update_fields")
    }
    async fn delete(&self, _: Uuid) -> Result<bool, Infallible> { unreachable!("delete") }
    async fn list_all(&self) -> Result<Vec<IdentityRecord>, Infallible> {
      unreachable!("list_all")
    }
    async fn count(&self) -> Result<u64, Infallible> { unreachable!("count") }
  }

  fn unreachable_state() -> ApiState<UnreachableStore> {
    ApiState::new(
      Arc::new(UnreachableStore),
      MatchEngine::default(),
      Arc::new(LatestReading::default()),
    )
  }

  #[tokio::test]
  async fn verify_with_one_eye_is_rejected_before_store() {
    let body = json!({"face": {"eyes": [{"x": 10, "y": 10}]}});
    let resp = send(unreachable_state(), "POST", "/verify", Some(body)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err = json_of(resp).await["error"].as_str().unwrap().to_owned();
    assert!(err.contains("exactly 2"), "error: {err}");
  }

  #[tokio::test]
  async fn invalid_ids_are_rejected_before_store() {
    let resp = send(unreachable_state(), "DELETE", "/user/12345", None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(unreachable_state(), "PUT", "/user/xyz", Some(json!({"name": "X"}))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Store failures ──────────────────────────────────────────────────────────

  #[derive(Debug, Clone, Copy, thiserror::Error)]
  enum Fault {
    #[error("store offline")]
    Offline,
    #[error("corrupt row: face_width 0")]
    Corrupt,
  }

  impl StoreError for Fault {
    fn is_unavailable(&self) -> bool { matches!(self, Fault::Offline) }
  }

  /// A store that fails every call with the same fault.
  struct FaultyStore(Fault);

  impl IdentityStore for FaultyStore {
    type Error = Fault;

    async fn insert(&self, _: NewIdentity) -> Result<IdentityRecord, Fault> { Err(self.0) }
    async fn find_by_id(&self, _: Uuid) -> Result<Option<IdentityRecord>, Fault> { Err(self.0) }
    async fn find_range(&self, _: &RangeQuery) -> Result<Vec<IdentityRecord>, Fault> { Err(self.0) }
    async fn update_fields(&self, _: Uuid, _: IdentityPatch) -> Result<bool, Fault> { Err(self.0) }
    async fn delete(&self, _: Uuid) -> Result<bool, Fault> { Err(self.0) }
    async fn list_all(&self) -> Result<Vec<IdentityRecord>, Fault> { Err(self.0) }
    async fn count(&self) -> Result<u64, Fault> { Err(self.0) }
  }

  fn faulty_state(fault: Fault) -> ApiState<FaultyStore> {
    ApiState::new(
      Arc::new(FaultyStore(fault)),
      MatchEngine::default(),
      Arc::new(LatestReading::default()),
    )
  }

  #[tokio::test]
  async fn store_failure_is_not_a_denial() {
    let resp = send(faulty_state(Fault::Offline), "POST", "/verify", Some(probe((12, 9), (42, 11)))).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let err = json_of(resp).await["error"].as_str().unwrap().to_owned();
    assert!(err.contains("store offline"), "error: {err}");
  }

  #[tokio::test]
  async fn test_db_reports_store_failure() {
    let resp = send(faulty_state(Fault::Offline), "GET", "/test-db", None).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(text_of(resp).await.contains("store offline"));
  }

  #[tokio::test]
  async fn bad_stored_data_is_an_internal_error() {
    let resp = send(faulty_state(Fault::Corrupt), "GET", "/all", None).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let err = json_of(resp).await["error"].as_str().unwrap().to_owned();
    assert!(err.contains("corrupt row"), "error: {err}");

    let resp = send(faulty_state(Fault::Corrupt), "POST", "/verify", Some(probe((12, 9), (42, 11)))).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let resp = send(faulty_state(Fault::Corrupt), "GET", "/test-db", None).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  // ── List / count ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn all_lists_records_with_text_ids() {
    let state = make_state().await;
    let id = save(&state, ann()).await;

    let resp = send(state.clone(), "GET", "/all", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_of(resp).await;
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["id"], id.as_str());
    assert_eq!(records[0]["name"], "Ann");
    assert_eq!(records[0]["face"]["eyes"][1], json!({"x": 40, "y": 10}));

    let resp = send(state, "GET", "/test-db", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(text_of(resp).await.contains("You have 1 records"));
  }

  // ── Update ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn update_changes_name_only() {
    let state = make_state().await;
    let id = save(&state, ann()).await;

    let body = json!({"name": "X", "face": {"face_width": 1}});
    let resp = send(state.clone(), "PUT", &format!("/user/{id}"), Some(body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_of(resp).await["message"], "User updated");

    let record = state
      .store
      .find_by_id(id.parse().unwrap())
      .await
      .unwrap()
      .unwrap();
    assert_eq!(record.name, "X");
    assert_eq!(record.department, "Eng");
    assert_eq!(record.face.face_width, 80);
  }

  #[tokio::test]
  async fn update_without_allowed_fields_is_bad_request() {
    let state = make_state().await;
    let id = save(&state, ann()).await;
    let resp = send(state, "PUT", &format!("/user/{id}"), Some(json!({"face": {}}))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn update_unknown_user_is_not_found() {
    let state = make_state().await;
    let uri = format!("/user/{}", Uuid::new_v4());
    let resp = send(state, "PUT", &uri, Some(json!({"department": "Ops"}))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Delete ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn delete_then_delete_again_is_not_found() {
    let state = make_state().await;
    let id = save(&state, ann()).await;
    let uri = format!("/user/{id}");

    let resp = send(state.clone(), "DELETE", &uri, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_of(resp).await["message"], "User deleted");

    let resp = send(state.clone(), "DELETE", &uri, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(state, "POST", "/verify", Some(probe((10, 10), (40, 10)))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Latest reading ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn latest_reading_handoff() {
    let state = make_state().await;

    let resp = send(state.clone(), "GET", "/latest", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let face = ann()["face"].clone();
    let resp = send(state.clone(), "POST", "/latest", Some(face.clone())).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(state.clone(), "GET", "/latest", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_of(resp).await;
    assert_eq!(body["face"], face);
    assert!(body["age_ms"].is_u64());

    let resp = send(state, "POST", "/latest", Some(json!({"eyes": []}))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn index_serves_banner() {
    let state = make_state().await;
    let resp = send(state, "GET", "/", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(text_of(resp).await.starts_with("facegate"));
  }
}
