//! Canonical JSON for request signing.
//!
//! The server recomputes the HMAC over the body with every `null` entry
//! removed and object keys in sorted order. Both rules are applied here so
//! the same logical payload always produces the same bytes, whatever key
//! order the caller serialized with.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;

use crate::{AuthError, Result};

/// Parse `body` as a JSON object and re-serialize it in canonical form.
pub fn canonicalize_body(body: &[u8]) -> Result<String> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        AuthError::UnserializablePayload(format!("body is not valid JSON: {}", e))
    })?;

    if !value.is_object() {
        return Err(AuthError::UnserializablePayload(
            "body must be a JSON object".to_string(),
        ));
    }

    serde_json::to_string(&Canonical(&strip_nulls(value)))
        .map_err(|e| AuthError::UnserializablePayload(format!("cannot serialize body: {}", e)))
}

/// Remove `null` object entries at every depth.
///
/// Array elements are kept in place, including `null` ones, so positions do
/// not shift; objects nested inside arrays are still stripped.
pub fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

/// Serializes a JSON value with object keys sorted at every depth.
///
/// `serde_json::Map` only sorts when the `preserve_order` feature is off,
/// and that feature can be switched on by any crate in the build.
struct Canonical<'a>(&'a Value);

impl Serialize for Canonical<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0 {
            Value::Object(map) => {
                let mut entries: Vec<(&String, &Value)> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));

                let mut out = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    out.serialize_entry(key, &Canonical(value))?;
                }
                out.end()
            }
            Value::Array(items) => {
                let mut out = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    out.serialize_element(&Canonical(item))?;
                }
                out.end()
            }
            other => other.serialize(serializer),
        }
    }
}
