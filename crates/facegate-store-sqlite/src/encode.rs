//! Encoding and decoding helpers between Rust domain types and the plain
//! values stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and UUIDs as hyphenated
//! lowercase strings. Geometry is flattened into one integer column per
//! value.

use chrono::{DateTime, Utc};
use facegate_core::{
  geometry::{Eye, Geometry},
  identity::IdentityRecord,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Dimensions ──────────────────────────────────────────────────────────────

fn decode_dimension(value: i64, column: &str) -> Result<u32> {
  u32::try_from(value)
    .ok()
    .filter(|v| *v > 0)
    .ok_or_else(|| Error::Corrupt(format!("{column} = {value}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching the field order of [`RawIdentity::from_row`].
pub const IDENTITY_COLUMNS: &str = "identity_id, name, department, face_width, \
   face_height, left_eye_x, left_eye_y, right_eye_x, right_eye_y, registered_at";

/// Raw values read directly from an `identities` row.
pub struct RawIdentity {
  pub identity_id:   String,
  pub name:          String,
  pub department:    String,
  pub face_width:    i64,
  pub face_height:   i64,
  pub left_eye_x:    i64,
  pub left_eye_y:    i64,
  pub right_eye_x:   i64,
  pub right_eye_y:   i64,
  pub registered_at: String,
}

impl RawIdentity {
  /// Read a row selected with [`IDENTITY_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      identity_id:   row.get(0)?,
      name:          row.get(1)?,
      department:    row.get(2)?,
      face_width:    row.get(3)?,
      face_height:   row.get(4)?,
      left_eye_x:    row.get(5)?,
      left_eye_y:    row.get(6)?,
      right_eye_x:   row.get(7)?,
      right_eye_y:   row.get(8)?,
      registered_at: row.get(9)?,
    })
  }

  pub fn into_record(self) -> Result<IdentityRecord> {
    Ok(IdentityRecord {
      id:            decode_uuid(&self.identity_id)?,
      name:          self.name,
      department:    self.department,
      face:          Geometry {
        face_width:  decode_dimension(self.face_width, "face_width")?,
        face_height: decode_dimension(self.face_height, "face_height")?,
        eyes:        [
          Eye::new(self.left_eye_x, self.left_eye_y),
          Eye::new(self.right_eye_x, self.right_eye_y),
        ],
      },
      registered_at: decode_dt(&self.registered_at)?,
    })
  }
}
