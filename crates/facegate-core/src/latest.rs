//! A single hand-off slot for the most recent extractor reading.
//!
//! A capture process publishes geometry as it sees faces; a polling client
//! reads whatever is current. Readings older than the freshness window are
//! treated as absent. Ages are measured on the monotonic clock.

use std::{
  sync::{Mutex, PoisonError},
  time::{Duration, Instant},
};

use crate::geometry::Geometry;

/// Freshness window used unless configured otherwise.
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
  pub face: Geometry,
  pub age:  Duration,
}

#[derive(Debug)]
pub struct LatestReading {
  freshness: Duration,
  slot:      Mutex<Option<(Instant, Geometry)>>,
}

impl Default for LatestReading {
  fn default() -> Self { Self::new(DEFAULT_FRESHNESS) }
}

impl LatestReading {
  pub fn new(freshness: Duration) -> Self {
    Self { freshness, slot: Mutex::new(None) }
  }

  pub fn freshness(&self) -> Duration { self.freshness }

  /// Replace the current reading.
  pub fn publish(&self, face: Geometry) { self.publish_at(face, Instant::now()) }

  /// The current reading, if one was published within the freshness window.
  pub fn current(&self) -> Option<Reading> { self.current_at(Instant::now()) }

  fn publish_at(&self, face: Geometry, at: Instant) {
    *self.lock() = Some((at, face));
  }

  fn current_at(&self, now: Instant) -> Option<Reading> {
    let (at, face) = (*self.lock())?;
    let age = now.saturating_duration_since(at);
    (age <= self.freshness).then_some(Reading { face, age })
  }

  // A panic while holding the lock cannot leave the slot half-written.
  fn lock(&self) -> std::sync::MutexGuard<'_, Option<(Instant, Geometry)>> {
    self.slot.lock().unwrap_or_else(PoisonError::into_inner)
  }
}
