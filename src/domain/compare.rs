//! Payload comparison between the primary and fallback stores.

use crate::crypto::hashing::canonical_string;
use crate::domain::result::Comparison;
use crate::infra::config::ComparisonStrategy;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

pub const ONE_SIDE_NULL: &str = "one source returned null while the other returned data";
pub const STRUCTURES_DIFFER: &str = "data structures differ between sources";

/// Absolute tolerance when comparing numeric values in structural mode.
const NUMERIC_TOLERANCE: f64 = 1e-9;

/// Single-table bookkeeping attributes that never exist on the relational side.
const KEY_LAYOUT_ATTRIBUTES: &[&str] = &["PK", "SK", "GSI1PK", "GSI1SK", "entityType"];

/// Compares two payloads with the literal strategy. JSON `null` counts as absent.
pub fn compare_data(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Comparison {
    compare_with(ComparisonStrategy::Literal, a, b)
}

pub fn compare_with(
    strategy: ComparisonStrategy,
    a: Option<&JsonValue>,
    b: Option<&JsonValue>,
) -> Comparison {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());

    match (a, b) {
        (None, None) => Comparison::matched(),
        (Some(_), None) | (None, Some(_)) => {
            Comparison::from_differences(vec![ONE_SIDE_NULL.to_string()])
        }
        (Some(a), Some(b)) => match strategy {
            ComparisonStrategy::Literal => {
                if canonical_string(a) == canonical_string(b) {
                    Comparison::matched()
                } else {
                    Comparison::from_differences(vec![STRUCTURES_DIFFER.to_string()])
                }
            }
            ComparisonStrategy::Structural => {
                let mut differences = Vec::new();
                diff_values("$", a, b, &mut differences);
                Comparison::from_differences(differences)
            }
        },
    }
}

/// Field names compared case- and separator-insensitively: `first_name` matches `firstName`.
fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn normalized_fields(map: &serde_json::Map<String, JsonValue>) -> BTreeMap<String, (&str, &JsonValue)> {
    map.iter()
        .filter(|(k, _)| !KEY_LAYOUT_ATTRIBUTES.contains(&k.as_str()))
        .map(|(k, v)| (normalize_key(k), (k.as_str(), v)))
        .collect()
}

fn numeric(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn diff_values(path: &str, a: &JsonValue, b: &JsonValue, out: &mut Vec<String>) {
    match (a, b) {
        (JsonValue::Object(left), JsonValue::Object(right)) => {
            let left = normalized_fields(left);
            let right = normalized_fields(right);
            for (key, (name, lv)) in &left {
                match right.get(key) {
                    Some((_, rv)) => diff_values(&format!("{}.{}", path, name), lv, rv, out),
                    // A null column and an omitted attribute carry the same information.
                    None if lv.is_null() => {}
                    None => out.push(format!("{}.{}: present in primary only", path, name)),
                }
            }
            for (key, (name, rv)) in &right {
                if !left.contains_key(key) && !rv.is_null() {
                    out.push(format!("{}.{}: present in fallback only", path, name));
                }
            }
        }
        (JsonValue::Array(left), JsonValue::Array(right)) => {
            if left.len() != right.len() {
                out.push(format!(
                    "{}: length differs (primary={} fallback={})",
                    path,
                    left.len(),
                    right.len()
                ));
            }
            for (i, (lv, rv)) in left.iter().zip(right.iter()).enumerate() {
                diff_values(&format!("{}[{}]", path, i), lv, rv, out);
            }
        }
        _ if a.is_number() || b.is_number() => match (numeric(a), numeric(b)) {
            (Some(x), Some(y)) if (x - y).abs() <= NUMERIC_TOLERANCE => {}
            _ => out.push(format!("{}: primary={} fallback={}", path, a, b)),
        },
        _ => {
            if a != b {
                out.push(format!("{}: primary={} fallback={}", path, a, b));
            }
        }
    }
}
