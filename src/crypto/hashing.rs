// Canonical JSON serialization and the SHA-256 digest built on it.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// A helper function to sort a JSON object's keys recursively.
/// This is essential for canonical serialization.
fn sort_json_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted_map: BTreeMap<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), sort_json_value(v)))
                .collect();
            Value::Object(sorted_map.into_iter().collect())
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_json_value).collect()),
        _ => value.clone(),
    }
}

/// Serializes a JSON value with object keys sorted at every level.
pub fn canonical_string(value: &Value) -> String {
    sort_json_value(value).to_string()
}

/// Hex SHA-256 of the canonical serialization; lets logs identify payloads without printing them.
pub fn payload_digest(value: &Value) -> String {
    sha256_hex(canonical_string(value).as_bytes())
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
