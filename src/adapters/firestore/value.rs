//! Conversion between [`FieldValue`] and the typed JSON values of the
//! Firestore REST API (`{"stringValue": "..."}`, `{"integerValue": "42"}`, ...).

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};

use crate::domain::model::{FieldValue, Fields};
use crate::utils::error::{KyoError, Result};

const SERVICE: &str = "Firestore";

pub fn encode(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => json!({ "nullValue": null }),
        FieldValue::Bool(b) => json!({ "booleanValue": b }),
        // int64 travels as a decimal string
        FieldValue::Integer(n) => json!({ "integerValue": n.to_string() }),
        FieldValue::Double(n) => json!({ "doubleValue": n }),
        FieldValue::String(s) => json!({ "stringValue": s }),
        FieldValue::Timestamp(ts) => {
            json!({ "timestampValue": ts.to_rfc3339_opts(SecondsFormat::Micros, true) })
        }
        FieldValue::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode).collect();
            json!({ "arrayValue": { "values": values } })
        }
        FieldValue::Map(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

pub fn encode_fields(fields: &Fields) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), encode(value)))
        .collect()
}

pub fn decode(value: &Value) -> Result<FieldValue> {
    let object = value
        .as_object()
        .ok_or_else(|| malformed(format!("expected a typed value object, got {value}")))?;
    let (kind, inner) = object
        .iter()
        .next()
        .ok_or_else(|| malformed("empty value object".to_string()))?;

    match kind.as_str() {
        "nullValue" => Ok(FieldValue::Null),
        "booleanValue" => inner
            .as_bool()
            .map(FieldValue::Bool)
            .ok_or_else(|| malformed(format!("booleanValue {inner}"))),
        "integerValue" => decode_integer(inner).map(FieldValue::Integer),
        "doubleValue" => decode_double(inner).map(FieldValue::Double),
        "stringValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|s| FieldValue::String(s.to_string()))
            .ok_or_else(|| malformed(format!("{kind} {inner}"))),
        "timestampValue" => inner
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|ts| FieldValue::Timestamp(ts.with_timezone(&Utc)))
            .ok_or_else(|| malformed(format!("timestampValue {inner}"))),
        "arrayValue" => {
            let values = match inner.get("values") {
                Some(Value::Array(values)) => values.iter().map(decode).collect::<Result<Vec<_>>>()?,
                Some(other) => return Err(malformed(format!("arrayValue.values {other}"))),
                None => Vec::new(),
            };
            Ok(FieldValue::Array(values))
        }
        "mapValue" => {
            let fields = match inner.get("fields") {
                Some(Value::Object(fields)) => decode_fields(fields)?,
                Some(other) => return Err(malformed(format!("mapValue.fields {other}"))),
                None => Fields::new(),
            };
            Ok(FieldValue::Map(fields))
        }
        "geoPointValue" => {
            let mut point = Fields::new();
            for axis in ["latitude", "longitude"] {
                let coordinate = inner.get(axis).and_then(Value::as_f64).unwrap_or(0.0);
                point.insert(axis.to_string(), FieldValue::Double(coordinate));
            }
            Ok(FieldValue::Map(point))
        }
        other => Err(malformed(format!("unsupported value kind '{other}'"))),
    }
}

pub fn decode_fields(fields: &Map<String, Value>) -> Result<Fields> {
    fields
        .iter()
        .map(|(key, value)| Ok::<_, KyoError>((key.clone(), decode(value)?)))
        .collect()
}

fn decode_integer(inner: &Value) -> Result<i64> {
    match inner {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
    .ok_or_else(|| malformed(format!("integerValue {inner}")))
}

fn decode_double(inner: &Value) -> Result<f64> {
    match inner {
        Value::Number(n) => n.as_f64(),
        // NaN and the infinities arrive as strings
        Value::String(s) => match s.as_str() {
            "NaN" => Some(f64::NAN),
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            other => other.parse().ok(),
        },
        _ => None,
    }
    .ok_or_else(|| malformed(format!("doubleValue {inner}")))
}

fn malformed(message: String) -> KyoError {
    KyoError::DecodeError {
        service: SERVICE,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_decode_stored_banner() {
        let raw = json!({
            "title": { "stringValue": "Kaos Polos" },
            "price": { "integerValue": "89000" },
            "rating": { "doubleValue": 4.5 },
            "isBestSeller": { "booleanValue": true },
            "imageUrls": { "arrayValue": { "values": [
                { "stringValue": "https://img/a.jpg" },
                { "stringValue": "https://img/b.jpg" }
            ] } },
            "sizes": { "arrayValue": {} },
            "createdAt": { "timestampValue": "2025-03-01T10:00:00.123456Z" },
            "meta": { "mapValue": { "fields": { "sku": { "stringValue": "KW-1" } } } },
            "deleted": { "nullValue": null }
        });

        let fields = decode_fields(raw.as_object().unwrap()).unwrap();
        assert_eq!(fields["title"], FieldValue::String("Kaos Polos".into()));
        assert_eq!(fields["price"], FieldValue::Integer(89000));
        assert_eq!(fields["rating"], FieldValue::Double(4.5));
        assert_eq!(fields["isBestSeller"], FieldValue::Bool(true));
        assert_eq!(
            fields["imageUrls"],
            FieldValue::string_array(["https://img/a.jpg", "https://img/b.jpg"])
        );
        assert_eq!(fields["sizes"], FieldValue::Array(Vec::new()));
        assert!(matches!(fields["createdAt"], FieldValue::Timestamp(_)));
        assert!(matches!(&fields["meta"], FieldValue::Map(m) if m["sku"] == FieldValue::String("KW-1".into())));
        assert_eq!(fields["deleted"], FieldValue::Null);
    }

    #[test]
    fn test_encode_uses_firestore_shapes() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        assert_eq!(encode(&FieldValue::Integer(12)), json!({ "integerValue": "12" }));
        assert_eq!(
            encode(&FieldValue::Timestamp(ts)),
            json!({ "timestampValue": "2025-03-01T10:00:00.000000Z" })
        );
        assert_eq!(
            encode(&FieldValue::string_array(["S"])),
            json!({ "arrayValue": { "values": [ { "stringValue": "S" } ] } })
        );
    }

    #[test]
    fn test_decode_special_doubles_and_geo_points() {
        assert!(matches!(decode(&json!({ "doubleValue": "NaN" })).unwrap(), FieldValue::Double(n) if n.is_nan()));
        let point = decode(&json!({ "geoPointValue": { "latitude": -6.2, "longitude": 106.8 } })).unwrap();
        assert!(matches!(point, FieldValue::Map(m) if m["latitude"] == FieldValue::Double(-6.2)));
    }

    #[test]
    fn test_decode_rejects_unknown_kinds() {
        assert!(decode(&json!({ "vectorValue": {} })).is_err());
        assert!(decode(&json!("plain")).is_err());
        assert!(decode(&json!({ "integerValue": "twelve" })).is_err());
    }
}
