//! Application assembly for the facegate server: configuration, shared state
//! and the HTTP layers wrapped around [`facegate_api::api_router`].

pub mod config;

use std::sync::Arc;

use anyhow::Context as _;
use axum::{Router, http::HeaderValue};
use facegate_api::ApiState;
use facegate_core::{latest::LatestReading, matching::MatchEngine, store::IdentityStore};
use tower_http::{
  cors::{AllowOrigin, Any, CorsLayer},
  trace::TraceLayer,
};

pub use config::ServerConfig;

/// Build the served application for `store` under `config`.
pub fn app<S>(config: &ServerConfig, store: Arc<S>) -> anyhow::Result<Router>
where
  S: IdentityStore + 'static,
{
  let state = ApiState::new(
    store,
    MatchEngine::new(config.match_tolerance),
    Arc::new(LatestReading::new(config.latest_freshness())),
  );

  Ok(
    facegate_api::api_router(state)
      .layer(cors_layer(&config.cors_origins)?)
      .layer(TraceLayer::new_for_http()),
  )
}

fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
  let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
  if origins.is_empty() {
    return Ok(layer.allow_origin(Any));
  }

  let origins = origins
    .iter()
    .map(|o| {
      o.parse::<HeaderValue>()
        .with_context(|| format!("invalid CORS origin {o:?}"))
    })
    .collect::<anyhow::Result<Vec<_>>>()?;
  Ok(layer.allow_origin(AllowOrigin::list(origins)))
}
