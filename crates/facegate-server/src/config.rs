//! Runtime server configuration.
//!
//! Layered from an optional TOML file and `FACEGATE_*` environment
//! variables (environment wins). Built once in `main` and handed to the
//! components that need it.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use config::{Config, Environment, File, Source};
use facegate_core::{latest::DEFAULT_FRESHNESS, matching::DEFAULT_TOLERANCE};
use serde::Deserialize;

/// Server configuration, deserialised from `facegate.toml` and the
/// environment.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                  String,
  #[serde(default = "default_port")]
  pub port:                  u16,
  /// SQLite file; a leading `~/` is expanded.
  #[serde(default = "default_store_path")]
  pub store_path:            PathBuf,
  /// Per-coordinate pixel tolerance for verification.
  #[serde(default = "default_match_tolerance")]
  pub match_tolerance:       u32,
  #[serde(default = "default_store_timeout_ms")]
  pub store_timeout_ms:      u64,
  /// Readings older than this are not served from `/latest`.
  #[serde(default = "default_latest_freshness_secs")]
  pub latest_freshness_secs: u64,
  /// Allowed CORS origins. Empty allows any origin.
  #[serde(default)]
  pub cors_origins:          Vec<String>,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 5000 }
fn default_store_path() -> PathBuf { PathBuf::from("facegate.db") }
fn default_match_tolerance() -> u32 { DEFAULT_TOLERANCE }
fn default_store_timeout_ms() -> u64 { 5_000 }
fn default_latest_freshness_secs() -> u64 { DEFAULT_FRESHNESS.as_secs() }

impl ServerConfig {
  /// Read `path` (if it exists) and overlay the process environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    Self::from_sources(File::from(path).required(false), environment())
  }

  fn from_sources<F>(file: F, env: Environment) -> anyhow::Result<Self>
  where
    F: Source + Send + Sync + 'static,
  {
    Config::builder()
      .add_source(file)
      .add_source(env)
      .build()
      .context("failed to read config")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn store_timeout(&self) -> Duration { Duration::from_millis(self.store_timeout_ms) }

  pub fn latest_freshness(&self) -> Duration { Duration::from_secs(self.latest_freshness_secs) }

  /// `store_path` with a leading `~` expanded to the user's home directory.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

fn environment() -> Environment {
  Environment::with_prefix("FACEGATE")
    .try_parsing(true)
    .list_separator(",")
    .with_list_parse_key("cors_origins")
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
