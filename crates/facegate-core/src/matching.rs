//! The match engine: decides whether a captured pair of eye centres belongs
//! to a registered identity.
//!
//! The test is a box around each of the four coordinates: every stored
//! coordinate must lie within `tolerance` pixels (inclusive) of the captured
//! one. There is no normalisation for scale, rotation or translation.

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
  geometry::Eye,
  identity::IdentityRecord,
  store::{IdentityStore, RangeQuery},
};

/// Pixel tolerance applied to each coordinate unless configured otherwise.
pub const DEFAULT_TOLERANCE: u32 = 5;

/// Result of a verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
  /// The first record, in store order, inside the tolerance box.
  Access(IdentityRecord),
  Denied,
}

#[derive(Debug, Error)]
pub enum MatchError<E>
where
  E: std::error::Error + 'static,
{
  #[error("geometry must carry exactly 2 eyes, got {0}")]
  InvalidGeometry(usize),

  #[error("store error: {0}")]
  Store(#[source] E),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchEngine {
  tolerance: u32,
}

impl Default for MatchEngine {
  fn default() -> Self { Self::new(DEFAULT_TOLERANCE) }
}

impl MatchEngine {
  pub fn new(tolerance: u32) -> Self {
    Self { tolerance }
  }

  pub fn tolerance(&self) -> u32 { self.tolerance }

  /// The query that [`Self::verify`] sends to the store for `eyes`.
  pub fn query_for(&self, eyes: [Eye; 2]) -> RangeQuery {
    RangeQuery::around(eyes, i64::from(self.tolerance))
  }

  /// Look `eyes` up in `store`.
  ///
  /// Fails with [`MatchError::InvalidGeometry`] without touching the store
  /// unless exactly two eyes are given. When several records fit, the oldest
  /// registration wins and a warning is logged.
  pub async fn verify<S>(
    &self,
    store: &S,
    eyes: &[Eye],
  ) -> Result<MatchOutcome, MatchError<S::Error>>
  where
    S: IdentityStore,
  {
    let pair = <[Eye; 2]>::try_from(eyes)
      .map_err(|_| MatchError::InvalidGeometry(eyes.len()))?;

    let query = self.query_for(pair);
    let candidates = store.find_range(&query).await.map_err(MatchError::Store)?;

    if candidates.len() > 1 {
      warn!(
        candidates = candidates.len(),
        chosen = %candidates[0].id,
        tolerance = self.tolerance,
        "ambiguous face match; using the earliest registration"
      );
    }

    match candidates.into_iter().next() {
      Some(record) => {
        debug!(id = %record.id, "face matched");
        Ok(MatchOutcome::Access(record))
      }
      None => {
        debug!(?pair, "no face within tolerance");
        Ok(MatchOutcome::Denied)
      }
    }
  }
}
