//! Error types for `facegate-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid identity id: {0:?}")]
  InvalidId(String),

  #[error("identity not found: {0}")]
  NotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
