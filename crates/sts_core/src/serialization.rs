//! Canonical JSON serialization helpers.
//!
//! Model artifacts are written with recursively sorted object keys and no
//! whitespace so the same model always produces the same bytes, and therefore
//! the same BLAKE3 hash.

use serde::Serialize;
use serde_json::{map::Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CanonicalError {
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Recursively sort JSON object keys to obtain a canonical representation.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));

            let mut sorted = Map::with_capacity(entries.len());
            for (key, val) in entries {
                sorted.insert(key, canonicalize(val));
            }

            Value::Object(sorted)
        }
        Value::Array(elements) => Value::Array(elements.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Serialize a value to canonical JSON (sorted keys, no whitespace)
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    let json_value =
        serde_json::to_value(value).map_err(|e| CanonicalError::Serialization(e.to_string()))?;

    serde_json::to_string(&canonicalize(json_value))
        .map_err(|e| CanonicalError::Serialization(e.to_string()))
}

/// Hex-encoded BLAKE3 digest of arbitrary bytes
pub fn blake3_hex(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}

/// Compute the BLAKE3 hash of a value's canonical JSON, hex encoded
pub fn hash_canonical_hex<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    let json = to_canonical_json(value)?;
    Ok(blake3_hex(json.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Unordered {
        b_field: i64,
        a_field: f64,
        z_field: Vec<String>,
    }

    #[test]
    fn test_canonical_json_sorts_keys() {
        let data = Unordered {
            b_field: 2,
            a_field: 0.5,
            z_field: vec!["x".to_string()],
        };

        let json = to_canonical_json(&data).unwrap();
        assert_eq!(json, r#"{"a_field":0.5,"b_field":2,"z_field":["x"]}"#);
    }

    #[test]
    fn test_hash_is_stable() {
        let data = Unordered {
            b_field: 7,
            a_field: 1.25,
            z_field: vec![],
        };

        let h1 = hash_canonical_hex(&data).unwrap();
        let h2 = hash_canonical_hex(&data).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }
}
