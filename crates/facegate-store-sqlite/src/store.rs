//! [`SqliteStore`], the SQLite implementation of [`IdentityStore`].

use std::{
  path::Path,
  pin::pin,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
  time::Duration,
};

use chrono::Utc;
use rusqlite::{ErrorCode, InterruptHandle, OptionalExtension as _};
use tracing::{debug, info, warn};
use uuid::Uuid;

use facegate_core::{
  identity::{IdentityPatch, IdentityRecord, NewIdentity},
  store::{IdentityStore, RangeQuery},
};

use crate::{
  encode::{IDENTITY_COLUMNS, RawIdentity, encode_dt, encode_uuid},
  schema::SCHEMA,
  Error, Result,
};

/// How long a single store call may take before it fails with
/// [`Error::Timeout`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A facegate identity store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:      tokio_rusqlite::Connection,
  interrupt: Arc<InterruptHandle>,
  timeout:   Duration,
}

/// Where a single [`SqliteStore::call`] is, as seen from both sides of the
/// connection thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallState {
  Queued,
  Running,
  Finished,
  /// The caller gave up before the work started; it must not run.
  Abandoned,
}

fn lock(state: &Mutex<CallState>) -> MutexGuard<'_, CallState> {
  state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn is_interrupt(e: &tokio_rusqlite::Error) -> bool {
  matches!(
    e,
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(f, _))
      if f.code == ErrorCode::OperationInterrupted
  )
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self::from_connection(conn).await?;
    info!(path = %path.display(), "opened identity store");
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::from_connection(conn).await
  }

  async fn from_connection(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let interrupt = conn.call(|c| Ok(c.get_interrupt_handle())).await?;
    let store = Self { conn, interrupt: Arc::new(interrupt), timeout: DEFAULT_TIMEOUT };
    store.init_schema().await?;
    Ok(store)
  }

  /// Replace the per-call timeout.
  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn timeout(&self) -> Duration { self.timeout }

  async fn init_schema(&self) -> Result<()> {
    self
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
  }

  /// Run `function` on the connection thread, giving up after the
  /// configured timeout.
  ///
  /// A timed-out call leaves nothing behind. Work still queued behind other
  /// calls is skipped when its turn comes; work already running is
  /// interrupted and then awaited, so a statement that committed before the
  /// interrupt landed is reported as the success it was.
  pub(crate) async fn call<F, R>(&self, function: F) -> Result<R>
  where
    F: FnOnce(&mut rusqlite::Connection) -> tokio_rusqlite::Result<R> + Send + 'static,
    R: Send + 'static,
  {
    let state = Arc::new(Mutex::new(CallState::Queued));
    let worker_state = Arc::clone(&state);
    let job = move |conn: &mut rusqlite::Connection| {
      {
        let mut s = lock(&worker_state);
        if *s == CallState::Abandoned {
          return Err(tokio_rusqlite::Error::Other("call abandoned after timeout".into()));
        }
        *s = CallState::Running;
      }
      let result = function(conn);
      *lock(&worker_state) = CallState::Finished;
      result
    };

    let mut pending = pin!(self.conn.call(job));
    if let Ok(result) = tokio::time::timeout(self.timeout, pending.as_mut()).await {
      return Ok(result?);
    }

    {
      let mut s = lock(&state);
      match *s {
        CallState::Queued => {
          *s = CallState::Abandoned;
          warn!(timeout = ?self.timeout, "sqlite call timed out before it started");
          return Err(Error::Timeout(self.timeout));
        }
        // The job cannot mark itself finished, and so no later job can
        // start, while this lock is held.
        CallState::Running => self.interrupt.interrupt(),
        CallState::Finished | CallState::Abandoned => {}
      }
    }

    match pending.await {
      Ok(value) => {
        warn!(timeout = ?self.timeout, "sqlite call overran its timeout but completed");
        Ok(value)
      }
      Err(e) if is_interrupt(&e) => {
        warn!(timeout = ?self.timeout, "sqlite call timed out and was interrupted");
        Err(Error::Timeout(self.timeout))
      }
      Err(e) => Err(e.into()),
    }
  }

  async fn select_many(
    &self,
    sql: String,
    params: Vec<i64>,
  ) -> Result<Vec<IdentityRecord>> {
    let raws: Vec<RawIdentity> = self
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawIdentity::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawIdentity::into_record).collect()
  }
}

// ─── IdentityStore impl ──────────────────────────────────────────────────────

impl IdentityStore for SqliteStore {
  type Error = Error;

  async fn insert(&self, input: NewIdentity) -> Result<IdentityRecord> {
    let record = IdentityRecord {
      id:            Uuid::new_v4(),
      name:          input.name,
      department:    input.department,
      face:          input.face,
      registered_at: Utc::now(),
    };

    let id_str     = encode_uuid(record.id);
    let name       = record.name.clone();
    let department = record.department.clone();
    let width      = i64::from(record.face.face_width);
    let height     = i64::from(record.face.face_height);
    let [left, right] = record.face.eyes;
    let at_str     = encode_dt(record.registered_at);

    self
      .call(move |conn| {
        conn.execute(
          "INSERT INTO identities (
             identity_id, name, department, face_width, face_height,
             left_eye_x, left_eye_y, right_eye_x, right_eye_y, registered_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str, name, department, width, height,
            left.x, left.y, right.x, right.y, at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    debug!(id = %record.id, "inserted identity");
    Ok(record)
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<IdentityRecord>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawIdentity> = self
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE identity_id = ?1"),
              rusqlite::params![id_str],
              RawIdentity::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawIdentity::into_record).transpose()
  }

  async fn find_range(&self, query: &RangeQuery) -> Result<Vec<IdentityRecord>> {
    let [left, right] = query.eyes;
    let sql = format!(
      "SELECT {IDENTITY_COLUMNS} FROM identities
       WHERE left_eye_x  BETWEEN ?1 AND ?2
         AND left_eye_y  BETWEEN ?3 AND ?4
         AND right_eye_x BETWEEN ?5 AND ?6
         AND right_eye_y BETWEEN ?7 AND ?8
       ORDER BY seq"
    );
    let params = vec![
      left.x.min, left.x.max, left.y.min, left.y.max,
      right.x.min, right.x.max, right.y.min, right.y.max,
    ];
    self.select_many(sql, params).await
  }

  async fn update_fields(&self, id: Uuid, patch: IdentityPatch) -> Result<bool> {
    let id_str = encode_uuid(id);

    let changed = self
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE identities
             SET name       = COALESCE(?2, name),
                 department = COALESCE(?3, department)
           WHERE identity_id = ?1",
          rusqlite::params![id_str, patch.name, patch.department],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn delete(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let removed = self
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM identities WHERE identity_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    if removed > 0 {
      debug!(%id, "deleted identity");
    }
    Ok(removed > 0)
  }

  async fn list_all(&self) -> Result<Vec<IdentityRecord>> {
    self
      .select_many(
        format!("SELECT {IDENTITY_COLUMNS} FROM identities ORDER BY seq"),
        Vec::new(),
      )
      .await
  }

  async fn count(&self) -> Result<u64> {
    let n: i64 = self
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM identities", [], |r| r.get(0))?)
      })
      .await?;

    u64::try_from(n).map_err(|_| Error::Corrupt(format!("row count {n}")))
  }
}
