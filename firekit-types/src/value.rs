//! The document store's value model.

use std::collections::BTreeMap;

/// Top-level fields of a document, keyed by field name.
pub type Fields = BTreeMap<String, Value>;

/// A single value stored in a document field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicit null
    Null,
    /// Boolean
    Boolean(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit float
    Double(f64),
    /// RFC 3339 timestamp, kept as the store formats it
    Timestamp(String),
    /// UTF-8 string
    String(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Full resource name of another document
    Reference(String),
    /// Latitude/longitude pair
    GeoPoint {
        /// Latitude in degrees
        latitude: f64,
        /// Longitude in degrees
        longitude: f64,
    },
    /// Ordered list of values
    Array(Vec<Value>),
    /// Nested fields
    Map(Fields),
}

impl Value {
    /// Short name of the value's type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Double(_) => "double",
            Value::Timestamp(_) => "timestamp",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Reference(_) => "reference",
            Value::GeoPoint { .. } => "geopoint",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }

    /// Returns the string slice if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is an integer value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the boolean if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the elements if this is an array value.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    /// Build a value from plain JSON.
    ///
    /// Integral numbers that fit in an `i64` become [`Value::Integer`], all
    /// other numbers become [`Value::Double`]. Objects become maps.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(values) => {
                Value::Array(values.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Render the value as plain JSON.
    ///
    /// Lossy for store-specific types: timestamps and references become
    /// strings, bytes become an array of numbers, non-finite doubles become null.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Double(d) => serde_json::Number::from_f64(*d)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Timestamp(s) | Value::String(s) | Value::Reference(s) => {
                serde_json::Value::String(s.clone())
            }
            Value::Bytes(bytes) => serde_json::Value::from(bytes.clone()),
            Value::GeoPoint {
                latitude,
                longitude,
            } => serde_json::json!({ "latitude": latitude, "longitude": longitude }),
            Value::Array(values) => {
                serde_json::Value::Array(values.iter().map(Value::to_json).collect())
            }
            Value::Map(fields) => fields_to_json(fields),
        }
    }
}

/// Render document fields as a JSON object.
pub(crate) fn fields_to_json(fields: &Fields) -> serde_json::Value {
    serde_json::Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect(),
    )
}

/// Convert a JSON object into document fields.
///
/// Returns `None` when `json` is not an object.
pub fn fields_from_json(json: serde_json::Value) -> Option<Fields> {
    match Value::from_json(json) {
        Value::Map(fields) => Some(fields),
        _ => None,
    }
}

/// Look up a dotted field path (`"address.city"`) inside document fields.
///
/// Each segment but the last must resolve to a map.
pub fn get_field<'a>(fields: &'a Fields, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = fields.get(segments.next()?)?;
    for segment in segments {
        match current {
            Value::Map(inner) => current = inner.get(segment)?,
            _ => return None,
        }
    }
    Some(current)
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::Array(values.into_iter().map(Into::into).collect())
    }
}

impl From<Fields> for Value {
    fn from(fields: Fields) -> Self {
        Value::Map(fields)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_numbers_split_into_integer_and_double() {
        assert_eq!(Value::from_json(json!(42)), Value::Integer(42));
        assert_eq!(Value::from_json(json!(1.5)), Value::Double(1.5));
        // u64 beyond i64::MAX cannot be an integer value
        assert!(matches!(
            Value::from_json(json!(u64::MAX)),
            Value::Double(_)
        ));
    }

    #[test]
    fn json_object_becomes_nested_map() {
        let value = Value::from_json(json!({"address": {"city": "Oslo"}, "tags": ["a", "b"]}));
        let Value::Map(fields) = value else {
            panic!("expected map");
        };
        assert_eq!(
            get_field(&fields, "address.city"),
            Some(&Value::String("Oslo".into()))
        );
        assert_eq!(
            get_field(&fields, "tags").and_then(Value::as_array).map(<[Value]>::len),
            Some(2)
        );
    }

    #[test]
    fn get_field_stops_at_non_map() {
        let mut fields = Fields::new();
        fields.insert("name".into(), "alice".into());
        assert!(get_field(&fields, "name.first").is_none());
        assert!(get_field(&fields, "missing").is_none());
    }

    #[test]
    fn to_json_renders_store_types() {
        let geo = Value::GeoPoint {
            latitude: 59.9,
            longitude: 10.7,
        };
        assert_eq!(geo.to_json(), json!({"latitude": 59.9, "longitude": 10.7}));
        assert_eq!(Value::Bytes(vec![1, 2]).to_json(), json!([1, 2]));
        assert_eq!(Value::Double(f64::NAN).to_json(), json!(null));
    }

    #[test]
    fn only_objects_become_fields() {
        let fields = fields_from_json(json!({"name": "alice"})).unwrap();
        assert_eq!(fields.get("name"), Some(&Value::String("alice".into())));
        assert!(fields_from_json(json!([1, 2])).is_none());
    }

    #[test]
    fn option_none_is_null() {
        let v: Value = Option::<i64>::None.into();
        assert_eq!(v, Value::Null);
        let v: Value = Some("x").into();
        assert_eq!(v, Value::String("x".into()));
    }
}
