//! Error type for `facegate-store-sqlite`.

use std::time::Duration;

use facegate_core::store::StoreError;
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("store did not answer within {0:?}")]
  Timeout(Duration),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored row violates an invariant the schema should have enforced.
  #[error("corrupt row: {0}")]
  Corrupt(String),
}

impl StoreError for Error {
  fn is_unavailable(&self) -> bool {
    match self {
      Error::Timeout(_) | Error::Database(tokio_rusqlite::Error::ConnectionClosed) => true,
      Error::Database(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(f, _))) => {
        matches!(
          f.code,
          ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::CannotOpen
            | ErrorCode::SystemIoFailure
        )
      }
      _ => false,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
