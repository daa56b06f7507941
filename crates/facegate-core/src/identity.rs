//! Identity records: a name and department bound to one face geometry.
//!
//! Records are created whole. Afterwards only `name` and `department` can
//! change; the geometry and the store-assigned fields never do.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, geometry::Geometry};

/// A persisted identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
  /// Store-assigned; serialised as hyphenated text.
  pub id:            Uuid,
  pub name:          String,
  pub department:    String,
  pub face:          Geometry,
  /// Server-assigned timestamp; never changes after creation.
  pub registered_at: DateTime<Utc>,
}

/// Input to [`crate::store::IdentityStore::insert`].
/// `id` and `registered_at` are always set by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentity {
  pub name:       String,
  pub department: String,
  pub face:       Geometry,
}

/// The fields an update may touch. At least one is `Some` when produced by
/// [`crate::validate::validate_update`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityPatch {
  pub name:       Option<String>,
  pub department: Option<String>,
}

impl IdentityPatch {
  pub fn is_empty(&self) -> bool {
    self.name.is_none() && self.department.is_none()
  }
}

/// Parse the textual form of an identity id, as found in request paths.
pub fn parse_identity_id(raw: &str) -> Result<Uuid> {
  Uuid::parse_str(raw.trim()).map_err(|_| Error::InvalidId(raw.to_owned()))
}
