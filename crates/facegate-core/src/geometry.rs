//! Face geometry as produced by the external extractor.
//!
//! The extractor reports a face bounding box and the centres of two eyes in
//! frame pixel coordinates. Nothing here checks the points against a frame
//! size or re-orders them; the capture side emits the left eye first.

use serde::{Deserialize, Serialize};

/// A single eye centre, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Eye {
  pub x: i64,
  pub y: i64,
}

impl Eye {
  pub const fn new(x: i64, y: i64) -> Self { Self { x, y } }
}

/// Index of each eye inside [`Geometry::eyes`].
pub const LEFT_EYE: usize = 0;
pub const RIGHT_EYE: usize = 1;

/// A complete face reading: bounding box size plus both eye centres.
///
/// `eyes` is a fixed pair, so a geometry that made it past validation can
/// never carry a different number of points into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
  pub face_width:  u32,
  pub face_height: u32,
  pub eyes:        [Eye; 2],
}

impl Geometry {
  pub fn left_eye(&self) -> Eye { self.eyes[LEFT_EYE] }

  pub fn right_eye(&self) -> Eye { self.eyes[RIGHT_EYE] }
}

/// The eye-only reading submitted for verification.
///
/// Verification callers may omit the bounding box; when they send it the
/// values are kept so they can be logged next to the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Probe {
  pub eyes:        [Eye; 2],
  pub face_width:  Option<u32>,
  pub face_height: Option<u32>,
}

impl From<Geometry> for Probe {
  fn from(g: Geometry) -> Self {
    Self {
      eyes:        g.eyes,
      face_width:  Some(g.face_width),
      face_height: Some(g.face_height),
    }
  }
}
