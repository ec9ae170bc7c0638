//! Instance value semantics
//!
//! Instances and schema payloads are `serde_json::Value`. This module
//! supplies the semantics the engine needs on top of that: kind names,
//! deep equality that treats numerically equal numbers as equal
//! (1 == 1.0), and a fingerprint hash consistent with that equality.
//! The fingerprint keys the visited-reference set during validation.

use serde_json::{Number, Value};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Human-readable kind name for an instance value
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) => {
            if is_integer_number(n) {
                "integer"
            } else {
                "number"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Whether a number is mathematically an integer (1.0 counts)
pub fn is_integer_number(n: &Number) -> bool {
    if n.is_i64() || n.is_u64() {
        return true;
    }
    match n.as_f64() {
        Some(f) => f.fract() == 0.0 && f.is_finite(),
        None => false,
    }
}

/// Numeric equality across representations: 1, 1.0 and 1u64 are equal
pub fn number_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Numeric ordering across representations
///
/// `None` only when a value has no f64 view and no shared integer view.
pub fn number_cmp(a: &Number, b: &Number) -> Option<std::cmp::Ordering> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return Some(x.cmp(&y));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

/// Deep equality with numeric number comparison and order-insensitive objects
pub fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => number_equal(x, y),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| json_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(key, value)| y.get(key).is_some_and(|other| json_equal(value, other)))
        }
        _ => false,
    }
}

/// Stable fingerprint consistent with `json_equal`
///
/// `DefaultHasher::new()` uses fixed keys, so fingerprints are
/// reproducible across runs for the same value.
pub fn fingerprint(value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    hash_value(value, &mut hasher);
    hasher.finish()
}

fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    match value {
        Value::Null => 0u8.hash(state),
        Value::Bool(b) => {
            1u8.hash(state);
            b.hash(state);
        }
        Value::Number(n) => {
            2u8.hash(state);
            hash_number(n, state);
        }
        Value::String(s) => {
            3u8.hash(state);
            s.hash(state);
        }
        Value::Array(items) => {
            4u8.hash(state);
            items.len().hash(state);
            for item in items {
                hash_value(item, state);
            }
        }
        Value::Object(entries) => {
            5u8.hash(state);
            entries.len().hash(state);
            // Key order must not influence the hash
            let mut keys: Vec<&String> = entries.keys().collect();
            keys.sort();
            for key in keys {
                key.hash(state);
                hash_value(&entries[key.as_str()], state);
            }
        }
    }
}

// Numbers hash through a canonical integer form when exact, so that
// 1, 1u64 and 1.0 collapse to the same fingerprint.
fn hash_number<H: Hasher>(n: &Number, state: &mut H) {
    if let Some(i) = n.as_i64() {
        0u8.hash(state);
        (i as i128).hash(state);
    } else if let Some(u) = n.as_u64() {
        0u8.hash(state);
        (u as i128).hash(state);
    } else if let Some(f) = n.as_f64() {
        if f.fract() == 0.0 && f.is_finite() && f >= i128::MIN as f64 && f <= i128::MAX as f64 {
            0u8.hash(state);
            (f as i128).hash(state);
        } else {
            1u8.hash(state);
            f.to_bits().hash(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_names() {
        assert_eq!(kind_name(&json!(null)), "null");
        assert_eq!(kind_name(&json!(true)), "boolean");
        assert_eq!(kind_name(&json!(3)), "integer");
        assert_eq!(kind_name(&json!(3.0)), "integer");
        assert_eq!(kind_name(&json!(3.5)), "number");
        assert_eq!(kind_name(&json!("x")), "string");
        assert_eq!(kind_name(&json!([])), "array");
        assert_eq!(kind_name(&json!({})), "object");
    }

    #[test]
    fn test_numeric_equality_across_representations() {
        assert!(json_equal(&json!(1), &json!(1.0)));
        assert!(json_equal(&json!(0), &json!(-0.0)));
        assert!(!json_equal(&json!(1), &json!(2)));
        assert!(!json_equal(&json!(1), &json!("1")));
    }

    #[test]
    fn test_object_equality_ignores_order() {
        let a = json!({"x": 1, "y": [1, 2]});
        let b = json!({"y": [1, 2.0], "x": 1.0});
        assert!(json_equal(&a, &b));
    }

    #[test]
    fn test_fingerprint_consistent_with_equality() {
        assert_eq!(fingerprint(&json!(1)), fingerprint(&json!(1.0)));
        assert_eq!(
            fingerprint(&json!({"a": 1, "b": 2})),
            fingerprint(&json!({"b": 2, "a": 1}))
        );
        assert_ne!(fingerprint(&json!([1, 2])), fingerprint(&json!([2, 1])));
    }

    #[test]
    fn test_fingerprint_distinguishes_kinds() {
        assert_ne!(fingerprint(&json!(null)), fingerprint(&json!(false)));
        assert_ne!(fingerprint(&json!("1")), fingerprint(&json!(1)));
        assert_ne!(fingerprint(&json!([])), fingerprint(&json!({})));
    }
}
