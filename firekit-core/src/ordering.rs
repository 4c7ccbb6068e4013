//! Total ordering of document store values.
//!
//! Values of different types order by type class:
//!
//! ```text
//! null < boolean < number < timestamp < string < bytes < reference
//!      < geopoint < array < map
//! ```
//!
//! Integers and doubles share the number class and compare numerically.
//! NaN sorts before every other number and equals itself. Timestamps compare
//! as instants, so offsets and fractional seconds are honored.

use std::cmp::Ordering;

use chrono::DateTime;
use firekit_types::Value;

/// Rank of a value's type class.
pub fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Boolean(_) => 1,
        Value::Integer(_) | Value::Double(_) => 2,
        Value::Timestamp(_) => 3,
        Value::String(_) => 4,
        Value::Bytes(_) => 5,
        Value::Reference(_) => 6,
        Value::GeoPoint { .. } => 7,
        Value::Array(_) => 8,
        Value::Map(_) => 9,
    }
}

fn compare_f64(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

fn compare_numbers(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => x.cmp(y),
        (Value::Integer(x), Value::Double(y)) => compare_f64(*x as f64, *y),
        (Value::Double(x), Value::Integer(y)) => compare_f64(*x, *y as f64),
        (Value::Double(x), Value::Double(y)) => compare_f64(*x, *y),
        _ => Ordering::Equal,
    }
}

// Unparseable timestamps sort after valid ones, bytewise among themselves.
fn compare_timestamps(a: &str, b: &str) -> Ordering {
    match (DateTime::parse_from_rfc3339(a), DateTime::parse_from_rfc3339(b)) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.as_bytes().cmp(b.as_bytes()),
    }
}

/// Compare two values under the store's ordering.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    let by_rank = type_rank(a).cmp(&type_rank(b));
    if by_rank != Ordering::Equal {
        return by_rank;
    }

    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
        (Value::Timestamp(x), Value::Timestamp(y)) => compare_timestamps(x, y),
        (Value::String(x), Value::String(y)) => x.as_bytes().cmp(y.as_bytes()),
        (Value::Bytes(x), Value::Bytes(y)) => x.cmp(y),
        (Value::Reference(x), Value::Reference(y)) => x.split('/').cmp(y.split('/')),
        (
            Value::GeoPoint {
                latitude: lat_a,
                longitude: lng_a,
            },
            Value::GeoPoint {
                latitude: lat_b,
                longitude: lng_b,
            },
        ) => compare_f64(*lat_a, *lat_b).then_with(|| compare_f64(*lng_a, *lng_b)),
        (Value::Array(x), Value::Array(y)) => {
            for (left, right) in x.iter().zip(y.iter()) {
                let ord = compare_values(left, right);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Map(x), Value::Map(y)) => {
            for ((key_a, val_a), (key_b, val_b)) in x.iter().zip(y.iter()) {
                let ord = key_a
                    .as_bytes()
                    .cmp(key_b.as_bytes())
                    .then_with(|| compare_values(val_a, val_b));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => compare_numbers(a, b),
    }
}

/// Whether two values are equal under the store's ordering.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    compare_values(a, b) == Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use firekit_types::Fields;

    #[test]
    fn type_classes_order_before_values() {
        let ordered = [
            Value::Null,
            Value::Boolean(true),
            Value::Integer(-5),
            Value::Timestamp("2024-01-01T00:00:00Z".into()),
            Value::String("a".into()),
            Value::Bytes(vec![0]),
            Value::Reference("projects/p/databases/d/documents/a/b".into()),
            Value::GeoPoint {
                latitude: 0.0,
                longitude: 0.0,
            },
            Value::Array(vec![]),
            Value::Map(Fields::new()),
        ];
        for pair in ordered.windows(2) {
            assert_eq!(
                compare_values(&pair[0], &pair[1]),
                Ordering::Less,
                "{:?} should sort before {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn integers_and_doubles_compare_numerically() {
        assert!(values_equal(&Value::Integer(1), &Value::Double(1.0)));
        assert_eq!(
            compare_values(&Value::Integer(2), &Value::Double(1.5)),
            Ordering::Greater
        );
    }

    #[test]
    fn nan_sorts_first_and_equals_itself() {
        let nan = Value::Double(f64::NAN);
        assert_eq!(
            compare_values(&nan, &Value::Integer(i64::MIN)),
            Ordering::Less
        );
        assert!(values_equal(&nan, &Value::Double(f64::NAN)));
    }

    #[test]
    fn timestamps_compare_as_instants() {
        let ts = |s: &str| Value::Timestamp(s.into());
        assert_eq!(
            compare_values(&ts("2024-01-01T00:00:00Z"), &ts("2024-01-01T00:00:00.500Z")),
            Ordering::Less
        );
        assert_eq!(
            compare_values(&ts("2024-01-01T00:30:00Z"), &ts("2024-01-01T01:00:00+01:00")),
            Ordering::Greater
        );
        assert!(values_equal(
            &ts("2024-01-01T00:00:00Z"),
            &ts("2024-01-01T02:00:00+02:00")
        ));
        assert_eq!(
            compare_values(&ts("not a time"), &ts("2024-01-01T00:00:00Z")),
            Ordering::Greater
        );
    }

    #[test]
    fn arrays_compare_elementwise_then_by_length() {
        let short = Value::from(vec![1i64, 2]);
        let long = Value::from(vec![1i64, 2, 0]);
        let bigger = Value::from(vec![1i64, 3]);
        assert_eq!(compare_values(&short, &long), Ordering::Less);
        assert_eq!(compare_values(&long, &bigger), Ordering::Less);
    }

    #[test]
    fn maps_compare_by_key_then_value() {
        let mut a = Fields::new();
        a.insert("a".into(), Value::Integer(9));
        let mut b = Fields::new();
        b.insert("b".into(), Value::Integer(0));
        assert_eq!(
            compare_values(&Value::Map(a), &Value::Map(b)),
            Ordering::Less
        );
    }
}
