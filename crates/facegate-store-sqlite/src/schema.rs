//! SQL schema for the facegate SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Each eye coordinate has its own column so range matching is plain SQL and
/// a row can never hold a partial face.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS identities (
    seq           INTEGER PRIMARY KEY AUTOINCREMENT,  -- insertion order
    identity_id   TEXT NOT NULL UNIQUE,
    name          TEXT NOT NULL CHECK (name <> ''),
    department    TEXT NOT NULL CHECK (department <> ''),
    face_width    INTEGER NOT NULL CHECK (face_width > 0),
    face_height   INTEGER NOT NULL CHECK (face_height > 0),
    left_eye_x    INTEGER NOT NULL,
    left_eye_y    INTEGER NOT NULL,
    right_eye_x   INTEGER NOT NULL,
    right_eye_y   INTEGER NOT NULL,
    registered_at TEXT NOT NULL    -- ISO 8601 UTC; server-assigned
);

CREATE INDEX IF NOT EXISTS identities_left_eye_idx  ON identities(left_eye_x, left_eye_y);
CREATE INDEX IF NOT EXISTS identities_right_eye_idx ON identities(right_eye_x, right_eye_y);

PRAGMA user_version = 1;
";
