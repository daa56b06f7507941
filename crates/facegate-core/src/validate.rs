//! Request validation for the record lifecycle.
//!
//! Every write and every verification goes through one of these functions
//! before the store is touched. They take the untyped JSON body and either
//! produce a typed value or the first problem found, checked in a fixed
//! order: top-level fields, then the `face` object, then its fields, then the
//! shape of `eyes`, then individual values.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
  geometry::{Eye, Geometry, Probe},
  identity::{IdentityPatch, NewIdentity},
};

const CREATE_FIELDS: [&str; 3] = ["name", "department", "face"];
const FACE_FIELDS: [&str; 3] = ["face_width", "face_height", "eyes"];

/// Why a payload was rejected. Always the caller's fault; maps to HTTP 400.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("request body must be a JSON object")]
  NotAnObject,

  #[error("missing required fields: {}", .0.join(", "))]
  MissingFields(Vec<&'static str>),

  #[error("`face` must be an object")]
  FaceNotObject,

  #[error("missing face fields: {}", .0.join(", "))]
  MissingFaceFields(Vec<&'static str>),

  #[error("`face.eyes` must be an array")]
  EyesNotSequence,

  #[error("`face.eyes` must contain exactly 2 points, got {0}")]
  EyeCount(usize),

  #[error("`{field}` {reason}")]
  InvalidField { field: String, reason: &'static str },

  #[error("no updatable fields; expected `name` and/or `department`")]
  NoUpdatableFields,
}

type Result<T> = std::result::Result<T, ValidationError>;

// ─── Entry points ────────────────────────────────────────────────────────────

/// Validate a registration body:
/// `{name, department, face: {face_width, face_height, eyes: [{x,y},{x,y}]}}`.
pub fn validate_create(payload: &Value) -> Result<NewIdentity> {
  let obj = payload.as_object().ok_or(ValidationError::NotAnObject)?;

  let missing = missing_keys(obj, &CREATE_FIELDS);
  if !missing.is_empty() {
    return Err(ValidationError::MissingFields(missing));
  }

  let face = validate_geometry(&obj["face"])?;
  let name = non_empty_text(&obj["name"], "name")?;
  let department = non_empty_text(&obj["department"], "department")?;

  Ok(NewIdentity { name, department, face })
}

/// Validate an update body, keeping only `name` and `department`.
///
/// Any other key (including `face`) is dropped; the geometry of a stored
/// record cannot be changed.
pub fn validate_update(payload: &Value) -> Result<IdentityPatch> {
  let obj = payload.as_object().ok_or(ValidationError::NotAnObject)?;

  let patch = IdentityPatch {
    name:       obj
      .get("name")
      .map(|v| non_empty_text(v, "name"))
      .transpose()?,
    department: obj
      .get("department")
      .map(|v| non_empty_text(v, "department"))
      .transpose()?,
  };

  if patch.is_empty() {
    return Err(ValidationError::NoUpdatableFields);
  }
  Ok(patch)
}

/// Validate a verification body: `{face: {eyes: [{x,y},{x,y}]}}`.
///
/// `face_width` and `face_height` may be omitted; if they are present but
/// malformed they are ignored rather than rejected.
pub fn validate_verify(payload: &Value) -> Result<Probe> {
  let obj = payload.as_object().ok_or(ValidationError::NotAnObject)?;
  let face = obj
    .get("face")
    .ok_or_else(|| ValidationError::MissingFields(vec!["face"]))?
    .as_object()
    .ok_or(ValidationError::FaceNotObject)?;

  let eyes = face
    .get("eyes")
    .ok_or_else(|| ValidationError::MissingFaceFields(vec!["eyes"]))?;

  Ok(Probe {
    eyes:        eye_pair(eyes)?,
    face_width:  face
      .get("face_width")
      .and_then(|v| dimension(v, "face.face_width").ok()),
    face_height: face
      .get("face_height")
      .and_then(|v| dimension(v, "face.face_height").ok()),
  })
}

/// Validate a complete geometry object, as produced by the extractor.
pub fn validate_geometry(face: &Value) -> Result<Geometry> {
  let face = face.as_object().ok_or(ValidationError::FaceNotObject)?;

  let missing = missing_keys(face, &FACE_FIELDS);
  if !missing.is_empty() {
    return Err(ValidationError::MissingFaceFields(missing));
  }

  let eyes = eye_pair(&face["eyes"])?;
  let face_width = dimension(&face["face_width"], "face.face_width")?;
  let face_height = dimension(&face["face_height"], "face.face_height")?;

  Ok(Geometry { face_width, face_height, eyes })
}

// ─── Field helpers ───────────────────────────────────────────────────────────

fn missing_keys(
  obj: &Map<String, Value>,
  keys: &[&'static str],
) -> Vec<&'static str> {
  keys.iter().copied().filter(|k| !obj.contains_key(*k)).collect()
}

fn invalid(field: impl Into<String>, reason: &'static str) -> ValidationError {
  ValidationError::InvalidField { field: field.into(), reason }
}

/// A string with at least one non-whitespace character, kept verbatim.
fn non_empty_text(value: &Value, field: &str) -> Result<String> {
  let text = value
    .as_str()
    .ok_or_else(|| invalid(field, "must be a string"))?;
  if text.trim().is_empty() {
    return Err(invalid(field, "must not be empty"));
  }
  Ok(text.to_owned())
}

fn dimension(value: &Value, field: &str) -> Result<u32> {
  value
    .as_u64()
    .and_then(|n| u32::try_from(n).ok())
    .filter(|n| *n > 0)
    .ok_or_else(|| invalid(field, "must be a positive integer"))
}

fn eye_pair(value: &Value) -> Result<[Eye; 2]> {
  let eyes = value.as_array().ok_or(ValidationError::EyesNotSequence)?;
  match eyes.as_slice() {
    [left, right] => Ok([eye(left, 0)?, eye(right, 1)?]),
    other => Err(ValidationError::EyeCount(other.len())),
  }
}

fn eye(value: &Value, index: usize) -> Result<Eye> {
  let obj = value
    .as_object()
    .ok_or_else(|| invalid(format!("face.eyes[{index}]"), "must be an object"))?;
  let coord = |key: &str| {
    obj
      .get(key)
      .and_then(Value::as_i64)
      .ok_or_else(|| invalid(format!("face.eyes[{index}].{key}"), "must be an integer"))
  };
  Ok(Eye { x: coord("x")?, y: coord("y")? })
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn ann() -> Value {
    json!({
      "name": "Ann",
      "department": "Eng",
      "face": {
        "face_width": 80,
        "face_height": 90,
        "eyes": [{"x": 10, "y": 10}, {"x": 40, "y": 10}],
      },
    })
  }

  // ── create ──────────────────────────────────────────────────────────────

  #[test]
  fn create_accepts_complete_payload() {
    let new = validate_create(&ann()).unwrap();
    assert_eq!(new.name, "Ann");
    assert_eq!(new.department, "Eng");
    assert_eq!(new.face.face_width, 80);
    assert_eq!(new.face.face_height, 90);
    assert_eq!(new.face.eyes, [Eye::new(10, 10), Eye::new(40, 10)]);
  }

  #[test]
  fn create_rejects_non_object_body() {
    assert_eq!(
      validate_create(&json!([1, 2])).unwrap_err(),
      ValidationError::NotAnObject
    );
  }

  #[test]
  fn create_reports_all_missing_top_level_fields() {
    let err = validate_create(&json!({"name": "Ann"})).unwrap_err();
    assert_eq!(err, ValidationError::MissingFields(vec!["department", "face"]));
    assert_eq!(err.to_string(), "missing required fields: department, face");
  }

  #[test]
  fn missing_top_level_fields_win_over_bad_face() {
    let err = validate_create(&json!({"name": "Ann", "face": 3})).unwrap_err();
    assert_eq!(err, ValidationError::MissingFields(vec!["department"]));
  }

  #[test]
  fn create_rejects_face_that_is_not_an_object() {
    let mut body = ann();
    body["face"] = json!("a face");
    assert_eq!(validate_create(&body).unwrap_err(), ValidationError::FaceNotObject);
  }

  #[test]
  fn create_reports_missing_face_fields_before_eye_shape() {
    let mut body = ann();
    body["face"] = json!({"eyes": "nope"});
    assert_eq!(
      validate_create(&body).unwrap_err(),
      ValidationError::MissingFaceFields(vec!["face_width", "face_height"])
    );
  }

  #[test]
  fn create_rejects_eyes_that_are_not_a_sequence() {
    let mut body = ann();
    body["face"]["eyes"] = json!({"x": 1, "y": 2});
    assert_eq!(validate_create(&body).unwrap_err(), ValidationError::EyesNotSequence);
  }

  #[test]
  fn create_enforces_two_eyes() {
    let mut body = ann();
    body["face"]["eyes"] = json!([{"x": 1, "y": 2}]);
    assert_eq!(validate_create(&body).unwrap_err(), ValidationError::EyeCount(1));

    body["face"]["eyes"] = json!([{"x": 1, "y": 2}, {"x": 3, "y": 4}, {"x": 5, "y": 6}]);
    assert_eq!(validate_create(&body).unwrap_err(), ValidationError::EyeCount(3));
  }

  #[test]
  fn create_rejects_blank_name() {
    let mut body = ann();
    body["name"] = json!("   ");
    assert_eq!(
      validate_create(&body).unwrap_err(),
      ValidationError::InvalidField { field: "name".into(), reason: "must not be empty" }
    );
  }

  #[test]
  fn text_fields_are_kept_verbatim() {
    let mut body = ann();
    body["name"] = json!(" Ann ");
    body["department"] = json!("R&D\t");
    let input = validate_create(&body).unwrap();
    assert_eq!(input.name, " Ann ");
    assert_eq!(input.department, "R&D\t");

    let patch = validate_update(&json!({"name": "  X"})).unwrap();
    assert_eq!(patch.name.as_deref(), Some("  X"));
  }

  #[test]
  fn create_rejects_non_positive_dimensions() {
    let mut body = ann();
    body["face"]["face_width"] = json!(0);
    let err = validate_create(&body).unwrap_err();
    assert!(
      matches!(err, ValidationError::InvalidField { ref field, .. } if field == "face.face_width")
    );

    body["face"]["face_width"] = json!(-4);
    assert!(validate_create(&body).is_err());
  }

  #[test]
  fn create_rejects_fractional_coordinates() {
    let mut body = ann();
    body["face"]["eyes"][1]["y"] = json!(10.5);
    assert_eq!(
      validate_create(&body).unwrap_err().to_string(),
      "`face.eyes[1].y` must be an integer"
    );
  }

  #[test]
  fn negative_coordinates_are_allowed() {
    let mut body = ann();
    body["face"]["eyes"][0] = json!({"x": -3, "y": -7});
    let new = validate_create(&body).unwrap();
    assert_eq!(new.face.left_eye(), Eye::new(-3, -7));
  }

  // ── update ──────────────────────────────────────────────────────────────

  #[test]
  fn update_keeps_only_allowed_fields() {
    let patch = validate_update(&json!({
      "name": "X",
      "face": {"face_width": 1},
      "id": "whatever",
    }))
    .unwrap();
    assert_eq!(patch, IdentityPatch { name: Some("X".into()), department: None });
  }

  #[test]
  fn update_without_allowed_fields_fails() {
    assert_eq!(
      validate_update(&json!({"face": {}})).unwrap_err(),
      ValidationError::NoUpdatableFields
    );
    assert_eq!(validate_update(&json!({})).unwrap_err(), ValidationError::NoUpdatableFields);
  }

  #[test]
  fn update_rejects_empty_department() {
    assert!(validate_update(&json!({"department": ""})).is_err());
  }

  // ── verify ──────────────────────────────────────────────────────────────

  #[test]
  fn verify_accepts_eyes_only() {
    let probe = validate_verify(&json!({
      "face": {"eyes": [{"x": 12, "y": 9}, {"x": 42, "y": 11}]}
    }))
    .unwrap();
    assert_eq!(probe.eyes, [Eye::new(12, 9), Eye::new(42, 11)]);
    assert_eq!(probe.face_width, None);
  }

  #[test]
  fn verify_keeps_valid_dimensions_and_drops_bad_ones() {
    let probe = validate_verify(&json!({
      "face": {
        "face_width": 80,
        "face_height": "tall",
        "eyes": [{"x": 1, "y": 1}, {"x": 2, "y": 2}],
      }
    }))
    .unwrap();
    assert_eq!(probe.face_width, Some(80));
    assert_eq!(probe.face_height, None);
  }

  #[test]
  fn verify_requires_exactly_two_eyes() {
    let three = json!([{"x": 1, "y": 1}, {"x": 2, "y": 2}, {"x": 3, "y": 3}]);
    for eyes in [json!([]), json!([{"x": 1, "y": 1}]), three] {
      let err = validate_verify(&json!({"face": {"eyes": eyes}})).unwrap_err();
      assert!(matches!(err, ValidationError::EyeCount(n) if n != 2));
    }
  }

  #[test]
  fn verify_requires_face_object() {
    assert_eq!(
      validate_verify(&json!({})).unwrap_err(),
      ValidationError::MissingFields(vec!["face"])
    );
    assert_eq!(
      validate_verify(&json!({"face": []})).unwrap_err(),
      ValidationError::FaceNotObject
    );
    assert_eq!(
      validate_verify(&json!({"face": {}})).unwrap_err(),
      ValidationError::MissingFaceFields(vec!["eyes"])
    );
  }
}
