//! Value equality and fingerprinting.
//!
//! JSON Schema compares values by mathematical value: `1`, `1.0` and a
//! `u64`/`i64`/`f64` mix of the same quantity are all equal. The fingerprint
//! produced here must agree with that equality, since it keys the
//! visited-reference set during evaluation.
use std::hash::{Hash, Hasher};

use ahash::AHasher;
use num_cmp::NumCmp;
use serde_json::{Map, Number, Value};

/// Deep equality with numeric-value comparison of numbers.
pub(crate) fn equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => numbers_equal(left, right),
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len()
                && left.iter().zip(right.iter()).all(|(l, r)| equal(l, r))
        }
        (Value::Object(left), Value::Object(right)) => objects_equal(left, right),
        (left, right) => left == right,
    }
}

fn objects_equal(left: &Map<String, Value>, right: &Map<String, Value>) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .all(|(key, value)| right.get(key).is_some_and(|other| equal(value, other)))
}

pub(crate) fn numbers_equal(left: &Number, right: &Number) -> bool {
    if let (Some(left), Some(right)) = (left.as_u64(), right.as_u64()) {
        left == right
    } else if let (Some(left), Some(right)) = (left.as_i64(), right.as_i64()) {
        left == right
    } else if let (Some(left), Some(right)) = (left.as_u64(), right.as_f64()) {
        NumCmp::num_eq(left, right)
    } else if let (Some(left), Some(right)) = (left.as_f64(), right.as_u64()) {
        NumCmp::num_eq(left, right)
    } else if let (Some(left), Some(right)) = (left.as_i64(), right.as_f64()) {
        NumCmp::num_eq(left, right)
    } else if let (Some(left), Some(right)) = (left.as_f64(), right.as_i64()) {
        NumCmp::num_eq(left, right)
    } else if let (Some(left), Some(right)) = (left.as_f64(), right.as_f64()) {
        left == right
    } else {
        false
    }
}

/// A 64-bit digest of a value, consistent with [`equal`].
pub(crate) fn fingerprint(value: &Value) -> u64 {
    let mut hasher = AHasher::default();
    hash_value(value, &mut hasher);
    hasher.finish()
}

fn hash_value<H: Hasher>(value: &Value, hasher: &mut H) {
    match value {
        Value::Null => hasher.write_u8(0),
        Value::Bool(boolean) => {
            hasher.write_u8(1);
            boolean.hash(hasher);
        }
        Value::Number(number) => {
            hasher.write_u8(2);
            hash_number(number, hasher);
        }
        Value::String(string) => {
            hasher.write_u8(3);
            string.hash(hasher);
        }
        Value::Array(items) => {
            hasher.write_u8(4);
            hasher.write_usize(items.len());
            for item in items {
                hash_value(item, hasher);
            }
        }
        Value::Object(object) => {
            hasher.write_u8(5);
            hasher.write_usize(object.len());
            // Entry order is irrelevant for equality, so the per-entry
            // digests are combined with a commutative operation.
            let mut combined: u64 = 0;
            for (key, value) in object {
                let mut entry = AHasher::default();
                key.hash(&mut entry);
                hash_value(value, &mut entry);
                combined = combined.wrapping_add(entry.finish());
            }
            hasher.write_u64(combined);
        }
    }
}

fn hash_number<H: Hasher>(number: &Number, hasher: &mut H) {
    // Numbers hash through a canonical form: any fractionless value hashes
    // as an integer so that 1 and 1.0 collide, matching `numbers_equal`.
    if let Some(unsigned) = number.as_u64() {
        hasher.write_i128(i128::from(unsigned));
    } else if let Some(signed) = number.as_i64() {
        hasher.write_i128(i128::from(signed));
    } else if let Some(float) = number.as_f64() {
        if float.fract() == 0.0 && (i64::MIN as f64..=u64::MAX as f64).contains(&float) {
            hasher.write_i128(float as i128);
        } else {
            hasher.write_u64(float.to_bits());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{equal, fingerprint};
    use serde_json::json;
    use test_case::test_case;

    #[test_case(&json!(1), &json!(1.0), true)]
    #[test_case(&json!(-2), &json!(-2.0), true)]
    #[test_case(&json!(1), &json!(1.5), false)]
    #[test_case(&json!([1, 2]), &json!([1.0, 2.0]), true)]
    #[test_case(&json!({"a": 1}), &json!({"a": 1.0}), true)]
    #[test_case(&json!({"a": 1}), &json!({"b": 1}), false)]
    #[test_case(&json!({"a": 1, "b": 2}), &json!({"b": 2, "a": 1}), true; "object order irrelevant")]
    #[test_case(&json!("1"), &json!(1), false)]
    #[test_case(&json!(null), &json!(null), true)]
    fn equality(left: &serde_json::Value, right: &serde_json::Value, expected: bool) {
        assert_eq!(equal(left, right), expected);
        assert_eq!(equal(right, left), expected);
    }

    #[test_case(&json!(1), &json!(1.0))]
    #[test_case(&json!([1, {"a": 2}]), &json!([1.0, {"a": 2.0}]))]
    #[test_case(&json!({"x": 1, "y": [true]}), &json!({"y": [true], "x": 1}))]
    fn fingerprints_agree_with_equality(left: &serde_json::Value, right: &serde_json::Value) {
        assert!(equal(left, right));
        assert_eq!(fingerprint(left), fingerprint(right));
    }

    #[test]
    fn distinct_values_rarely_collide() {
        assert_ne!(fingerprint(&json!(1)), fingerprint(&json!(2)));
        assert_ne!(fingerprint(&json!("1")), fingerprint(&json!(1)));
        assert_ne!(fingerprint(&json!([])), fingerprint(&json!({})));
    }
}
