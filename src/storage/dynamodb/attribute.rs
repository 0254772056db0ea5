//! Conversion from DynamoDB attribute values to plain JSON.

use anyhow::{anyhow, bail};
use aws_sdk_dynamodb::types::AttributeValue;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Number, Value as JsonValue};
use std::collections::HashMap;

fn parse_number(raw: &str) -> anyhow::Result<JsonValue> {
    if let Ok(i) = raw.parse::<i64>() {
        return Ok(JsonValue::from(i));
    }
    if let Ok(u) = raw.parse::<u64>() {
        return Ok(JsonValue::from(u));
    }
    let f = raw
        .parse::<f64>()
        .map_err(|_| anyhow!("invalid number attribute: {}", raw))?;
    Number::from_f64(f)
        .map(JsonValue::Number)
        .ok_or_else(|| anyhow!("non-finite number attribute: {}", raw))
}

/// Unwraps an attribute value into plain JSON. Binary values become base64 strings.
pub fn from_attribute(attr: &AttributeValue) -> anyhow::Result<JsonValue> {
    let value = match attr {
        AttributeValue::S(s) => JsonValue::String(s.clone()),
        AttributeValue::N(n) => parse_number(n)?,
        AttributeValue::Bool(b) => JsonValue::Bool(*b),
        AttributeValue::Null(_) => JsonValue::Null,
        AttributeValue::B(blob) => JsonValue::String(STANDARD.encode(blob.as_ref())),
        AttributeValue::M(fields) => item_to_json(fields)?,
        AttributeValue::L(items) => JsonValue::Array(
            items
                .iter()
                .map(from_attribute)
                .collect::<anyhow::Result<Vec<_>>>()?,
        ),
        AttributeValue::Ss(items) => JsonValue::Array(items.iter().cloned().map(JsonValue::String).collect()),
        AttributeValue::Ns(items) => JsonValue::Array(
            items
                .iter()
                .map(|raw| parse_number(raw))
                .collect::<anyhow::Result<Vec<_>>>()?,
        ),
        AttributeValue::Bs(items) => JsonValue::Array(
            items
                .iter()
                .map(|blob| JsonValue::String(STANDARD.encode(blob.as_ref())))
                .collect(),
        ),
        other => bail!("unsupported attribute value: {:?}", other),
    };
    Ok(value)
}

/// Unwraps a whole item (attribute name → attribute value) into a JSON object.
pub fn item_to_json(item: &HashMap<String, AttributeValue>) -> anyhow::Result<JsonValue> {
    let mut out = Map::with_capacity(item.len());
    for (name, attr) in item {
        out.insert(name.clone(), from_attribute(attr)?);
    }
    Ok(JsonValue::Object(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::primitives::Blob;
    use serde_json::json;

    fn s(v: &str) -> AttributeValue {
        AttributeValue::S(v.to_string())
    }

    fn n(v: &str) -> AttributeValue {
        AttributeValue::N(v.to_string())
    }

    #[test]
    fn unwraps_typed_item() {
        let item: HashMap<String, AttributeValue> = [
            ("PK", s("USER#u1")),
            ("balance", n("1520.5")),
            ("count", n("3")),
            ("isActive", AttributeValue::Bool(true)),
            ("phone", AttributeValue::Null(true)),
            ("address", AttributeValue::M(HashMap::from([("postcode".to_string(), s("2000"))]))),
            ("features", AttributeValue::L(vec![s("offset"), n("1")])),
            ("tags", AttributeValue::Ss(vec!["a".into(), "b".into()])),
            ("rates", AttributeValue::Ns(vec!["1".into(), "2.5".into()])),
            ("avatar", AttributeValue::B(Blob::new(b"hi".to_vec()))),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let plain = item_to_json(&item).unwrap();
        assert_eq!(
            plain,
            json!({
                "PK": "USER#u1",
                "balance": 1520.5,
                "count": 3,
                "isActive": true,
                "phone": null,
                "address": {"postcode": "2000"},
                "features": ["offset", 1],
                "tags": ["a", "b"],
                "rates": [1, 2.5],
                "avatar": "aGk="
            })
        );
    }

    #[test]
    fn rejects_malformed_numbers() {
        assert!(from_attribute(&n("abc")).is_err());
        assert!(from_attribute(&AttributeValue::Ns(vec!["1".into(), "x".into()])).is_err());
    }
}
