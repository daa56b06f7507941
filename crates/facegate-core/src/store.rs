//! The `IdentityStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `facegate-store-sqlite`). The HTTP layer and the match engine depend on
//! this abstraction, not on any concrete backend.

use std::{convert::Infallible, future::Future};

use uuid::Uuid;

use crate::{
  geometry::{Eye, LEFT_EYE, RIGHT_EYE},
  identity::{IdentityPatch, IdentityRecord, NewIdentity},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// An inclusive `[min, max]` window on one coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordRange {
  pub min: i64,
  pub max: i64,
}

impl CoordRange {
  /// `[value - tolerance, value + tolerance]`, clamped at the `i64` limits.
  pub fn around(value: i64, tolerance: i64) -> Self {
    Self {
      min: value.saturating_sub(tolerance),
      max: value.saturating_add(tolerance),
    }
  }

  pub fn contains(&self, value: i64) -> bool {
    self.min <= value && value <= self.max
  }
}

/// Windows on both coordinates of one eye.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EyeWindow {
  pub x: CoordRange,
  pub y: CoordRange,
}

impl EyeWindow {
  pub fn around(eye: Eye, tolerance: i64) -> Self {
    Self {
      x: CoordRange::around(eye.x, tolerance),
      y: CoordRange::around(eye.y, tolerance),
    }
  }

  pub fn contains(&self, eye: Eye) -> bool {
    self.x.contains(eye.x) && self.y.contains(eye.y)
  }
}

/// Parameters for [`IdentityStore::find_range`]. All four coordinate windows
/// must hold at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeQuery {
  pub eyes: [EyeWindow; 2],
}

impl RangeQuery {
  pub fn around(eyes: [Eye; 2], tolerance: i64) -> Self {
    Self {
      eyes: [
        EyeWindow::around(eyes[LEFT_EYE], tolerance),
        EyeWindow::around(eyes[RIGHT_EYE], tolerance),
      ],
    }
  }

  /// Whether a stored record falls inside every window.
  pub fn matches(&self, record: &IdentityRecord) -> bool {
    self.eyes[LEFT_EYE].contains(record.face.left_eye())
      && self.eyes[RIGHT_EYE].contains(record.face.right_eye())
  }
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Backend error as seen by callers that must decide how to report it.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The store could not be reached or did not answer in time, as opposed
  /// to answering with data it cannot decode.
  fn is_unavailable(&self) -> bool;
}

impl StoreError for Infallible {
  fn is_unavailable(&self) -> bool { match *self {} }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a facegate identity store backend.
///
/// Writes are single-record and atomic; nothing requires cross-record
/// consistency. Validation happens before any of these methods is called.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait IdentityStore: Send + Sync {
  type Error: StoreError;

  /// Persist a validated identity and return it with its assigned id.
  fn insert(
    &self,
    input: NewIdentity,
  ) -> impl Future<Output = Result<IdentityRecord, Self::Error>> + Send + '_;

  /// Retrieve a record by id. Returns `None` if not found.
  fn find_by_id(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<IdentityRecord>, Self::Error>> + Send + '_;

  /// Every record whose eye coordinates fall inside all of `query`'s
  /// windows, oldest registration first.
  fn find_range<'a>(
    &'a self,
    query: &'a RangeQuery,
  ) -> impl Future<Output = Result<Vec<IdentityRecord>, Self::Error>> + Send + 'a;

  /// Apply `patch` to `name`/`department`. Returns whether the record
  /// existed.
  fn update_fields(
    &self,
    id: Uuid,
    patch: IdentityPatch,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Permanently remove a record. Returns whether it existed.
  fn delete(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// All records, oldest registration first.
  fn list_all(
    &self,
  ) -> impl Future<Output = Result<Vec<IdentityRecord>, Self::Error>> + Send + '_;

  /// Number of stored records.
  fn count(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
