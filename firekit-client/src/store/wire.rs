//! Typed-JSON encoding used by the document store's REST API.
//!
//! Values are objects with exactly one key naming the type:
//! `{"stringValue": "x"}`, `{"integerValue": "42"}`, `{"mapValue": {"fields": {...}}}`.

use super::BackendError;
use firekit_core::{Direction, Filter, Operator, Query};
use firekit_types::{DocumentRef, DocumentSnapshot, Fields, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum WireValue {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(#[serde(with = "int64")] i64),
    DoubleValue(#[serde(with = "double")] f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(#[serde(with = "bytes")] Vec<u8>),
    ReferenceValue(String),
    GeoPointValue(LatLng),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub(crate) struct LatLng {
    #[serde(default)]
    latitude: f64,
    #[serde(default)]
    longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub(crate) struct ArrayValue {
    #[serde(default)]
    values: Vec<WireValue>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub(crate) struct MapValue {
    #[serde(default)]
    fields: BTreeMap<String, WireValue>,
}

impl From<&Value> for WireValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => WireValue::NullValue(()),
            Value::Boolean(b) => WireValue::BooleanValue(*b),
            Value::Integer(i) => WireValue::IntegerValue(*i),
            Value::Double(d) => WireValue::DoubleValue(*d),
            Value::Timestamp(t) => WireValue::TimestampValue(t.clone()),
            Value::String(s) => WireValue::StringValue(s.clone()),
            Value::Bytes(b) => WireValue::BytesValue(b.clone()),
            Value::Reference(r) => WireValue::ReferenceValue(r.clone()),
            Value::GeoPoint {
                latitude,
                longitude,
            } => WireValue::GeoPointValue(LatLng {
                latitude: *latitude,
                longitude: *longitude,
            }),
            Value::Array(values) => WireValue::ArrayValue(ArrayValue {
                values: values.iter().map(WireValue::from).collect(),
            }),
            Value::Map(fields) => WireValue::MapValue(MapValue {
                fields: encode_fields(fields),
            }),
        }
    }
}

impl From<WireValue> for Value {
    fn from(value: WireValue) -> Self {
        match value {
            WireValue::NullValue(()) => Value::Null,
            WireValue::BooleanValue(b) => Value::Boolean(b),
            WireValue::IntegerValue(i) => Value::Integer(i),
            WireValue::DoubleValue(d) => Value::Double(d),
            WireValue::TimestampValue(t) => Value::Timestamp(t),
            WireValue::StringValue(s) => Value::String(s),
            WireValue::BytesValue(b) => Value::Bytes(b),
            WireValue::ReferenceValue(r) => Value::Reference(r),
            WireValue::GeoPointValue(LatLng {
                latitude,
                longitude,
            }) => Value::GeoPoint {
                latitude,
                longitude,
            },
            WireValue::ArrayValue(array) => {
                Value::Array(array.values.into_iter().map(Value::from).collect())
            }
            WireValue::MapValue(map) => Value::Map(decode_fields(map.fields)),
        }
    }
}

pub(crate) fn encode_fields(fields: &Fields) -> BTreeMap<String, WireValue> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), WireValue::from(v)))
        .collect()
}

pub(crate) fn decode_fields(fields: BTreeMap<String, WireValue>) -> Fields {
    fields.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
}

/// Body of create and patch requests.
#[derive(Debug, Serialize)]
pub(crate) struct WriteBody {
    pub(crate) fields: BTreeMap<String, WireValue>,
}

/// A document as returned by get, create and runQuery.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireDocument {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) fields: BTreeMap<String, WireValue>,
    #[serde(default)]
    pub(crate) create_time: Option<String>,
    #[serde(default)]
    pub(crate) update_time: Option<String>,
}

impl WireDocument {
    /// Convert to a snapshot. `documents_root` is the
    /// `projects/{p}/databases/{d}/documents` prefix of `name`.
    pub(crate) fn into_snapshot(self, documents_root: &str) -> Result<DocumentSnapshot, BackendError> {
        let path = self
            .name
            .strip_prefix(documents_root)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| {
                BackendError::Decode(format!("document name outside database: {}", self.name))
            })?;
        let reference = DocumentRef::parse(path)?;
        let mut snapshot = DocumentSnapshot::new(reference, decode_fields(self.fields));
        snapshot.create_time = self.create_time;
        snapshot.update_time = self.update_time;
        Ok(snapshot)
    }
}

/// One element of the runQuery response stream. Rows carrying only
/// progress information have no document.
#[derive(Debug, Deserialize)]
pub(crate) struct RunQueryRow {
    #[serde(default)]
    pub(crate) document: Option<WireDocument>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RunQueryRequest {
    structured_query: StructuredQuery,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StructuredQuery {
    from: Vec<CollectionSelector>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    filter: Option<WireFilter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    order_by: Vec<WireOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionSelector {
    collection_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum WireFilter {
    FieldFilter(FieldFilter),
    UnaryFilter(UnaryFilter),
    CompositeFilter(CompositeFilter),
}

#[derive(Debug, Serialize)]
struct FieldFilter {
    field: FieldReference,
    op: &'static str,
    value: WireValue,
}

#[derive(Debug, Serialize)]
struct UnaryFilter {
    op: &'static str,
    field: FieldReference,
}

#[derive(Debug, Serialize)]
struct CompositeFilter {
    op: &'static str,
    filters: Vec<WireFilter>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldReference {
    field_path: String,
}

#[derive(Debug, Serialize)]
struct WireOrder {
    field: FieldReference,
    direction: &'static str,
}

impl RunQueryRequest {
    /// Encode `query` against its last collection id. The parent document,
    /// if any, goes in the URL.
    pub(crate) fn new(query: &Query, collection_id: &str) -> Self {
        let mut filters: Vec<WireFilter> = query.filters.iter().map(encode_filter).collect();
        let filter = match filters.len() {
            0 => None,
            1 => filters.pop(),
            _ => Some(WireFilter::CompositeFilter(CompositeFilter {
                op: "AND",
                filters,
            })),
        };
        Self {
            structured_query: StructuredQuery {
                from: vec![CollectionSelector {
                    collection_id: collection_id.to_string(),
                }],
                filter,
                order_by: query
                    .orders
                    .iter()
                    .map(|o| WireOrder {
                        field: field_ref(&o.field),
                        direction: match o.direction {
                            Direction::Ascending => "ASCENDING",
                            Direction::Descending => "DESCENDING",
                        },
                    })
                    .collect(),
                limit: query.limit,
            },
        }
    }
}

fn encode_filter(filter: &Filter) -> WireFilter {
    // null and NaN equality must be sent as unary filters
    let unary = match (&filter.op, &filter.value) {
        (Operator::Equal, Value::Null) => Some("IS_NULL"),
        (Operator::NotEqual, Value::Null) => Some("IS_NOT_NULL"),
        (Operator::Equal, Value::Double(d)) if d.is_nan() => Some("IS_NAN"),
        (Operator::NotEqual, Value::Double(d)) if d.is_nan() => Some("IS_NOT_NAN"),
        _ => None,
    };
    if let Some(op) = unary {
        return WireFilter::UnaryFilter(UnaryFilter {
            op,
            field: field_ref(&filter.field),
        });
    }
    WireFilter::FieldFilter(FieldFilter {
        field: field_ref(&filter.field),
        op: operator_name(filter.op),
        value: WireValue::from(&filter.value),
    })
}

fn operator_name(op: Operator) -> &'static str {
    match op {
        Operator::Equal => "EQUAL",
        Operator::NotEqual => "NOT_EQUAL",
        Operator::LessThan => "LESS_THAN",
        Operator::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
        Operator::GreaterThan => "GREATER_THAN",
        Operator::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
        Operator::ArrayContains => "ARRAY_CONTAINS",
        Operator::ArrayContainsAny => "ARRAY_CONTAINS_ANY",
        Operator::In => "IN",
        Operator::NotIn => "NOT_IN",
    }
}

fn field_ref(path: &str) -> FieldReference {
    FieldReference {
        field_path: quote_field_path(path),
    }
}

/// Backtick-quote dotted path segments that are not plain identifiers.
pub(crate) fn quote_field_path(path: &str) -> String {
    path.split('.')
        .map(|segment| {
            let simple = segment
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if simple {
                segment.to_string()
            } else {
                let escaped = segment.replace('\\', "\\\\").replace('`', "\\`");
                format!("`{escaped}`")
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// int64 values travel as decimal strings.
mod int64 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &i64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_string())
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        match Raw::deserialize(d)? {
            Raw::Number(n) => Ok(n),
            Raw::Text(text) => text
                .parse()
                .map_err(|_| serde::de::Error::custom(format!("invalid integerValue: {text}"))),
        }
    }
}

/// Doubles are JSON numbers, except the non-finite ones which are strings.
mod double {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            s.serialize_str("NaN")
        } else if value.is_infinite() {
            s.serialize_str(if *value > 0.0 { "Infinity" } else { "-Infinity" })
        } else {
            s.serialize_f64(*value)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        match Raw::deserialize(d)? {
            Raw::Number(n) => Ok(n),
            Raw::Text(text) => match text.as_str() {
                "NaN" => Ok(f64::NAN),
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                other => other
                    .parse()
                    .map_err(|_| serde::de::Error::custom(format!("invalid doubleValue: {other}"))),
            },
        }
    }
}

/// Bytes travel as standard base64.
mod bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(d)?;
        STANDARD
            .decode(text.as_bytes())
            .map_err(|e| serde::de::Error::custom(format!("invalid bytesValue: {e}")))
    }
}
