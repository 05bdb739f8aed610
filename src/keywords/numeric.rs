//! Numeric bounds and `multipleOf`.
use fraction::{BigFraction, BigUint};
use num_cmp::NumCmp;
use serde_json::{Number, Value};

use crate::{
    engine::KeywordEvaluation,
    error::ValidationErrorKind,
    output::OutputNode,
    paths::{LazyLocation, SchemaLocation},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ordering {
    Less,
    Equal,
    Greater,
}

/// Compare two JSON numbers across their u64/i64/f64 representations.
fn compare(left: &Number, right: &Number) -> Ordering {
    fn from_partial<L, R>(left: L, right: R) -> Ordering
    where
        L: NumCmp<R> + Copy,
        R: Copy,
    {
        if left.num_lt(right) {
            Ordering::Less
        } else if left.num_eq(right) {
            Ordering::Equal
        } else {
            Ordering::Greater
        }
    }
    if let (Some(left), Some(right)) = (left.as_u64(), right.as_u64()) {
        from_partial(left, right)
    } else if let (Some(left), Some(right)) = (left.as_i64(), right.as_i64()) {
        from_partial(left, right)
    } else if let (Some(left), Some(right)) = (left.as_u64(), right.as_f64()) {
        from_partial(left, right)
    } else if let (Some(left), Some(right)) = (left.as_i64(), right.as_f64()) {
        from_partial(left, right)
    } else if let (Some(left), Some(right)) = (left.as_f64(), right.as_u64()) {
        from_partial(left, right)
    } else if let (Some(left), Some(right)) = (left.as_f64(), right.as_i64()) {
        from_partial(left, right)
    } else {
        let left = left.as_f64().unwrap_or(f64::NAN);
        let right = right.as_f64().unwrap_or(f64::NAN);
        from_partial(left, right)
    }
}

fn bound(
    limit: &Number,
    instance: &Value,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
    accepts: impl Fn(Ordering) -> bool,
    kind: impl FnOnce() -> ValidationErrorKind,
) -> KeywordEvaluation {
    let Value::Number(number) = instance else {
        return OutputNode::ignored(location, instance_path);
    };
    if accepts(compare(number, limit)) {
        OutputNode::success(location, instance_path, None)
    } else {
        OutputNode::failure(location, instance_path, instance, kind())
    }
}

pub(crate) fn minimum(
    limit: &Number,
    instance: &Value,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
) -> KeywordEvaluation {
    bound(
        limit,
        instance,
        location,
        instance_path,
        |ordering| ordering != Ordering::Less,
        || ValidationErrorKind::Minimum {
            limit: Value::Number(limit.clone()),
        },
    )
}

pub(crate) fn maximum(
    limit: &Number,
    instance: &Value,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
) -> KeywordEvaluation {
    bound(
        limit,
        instance,
        location,
        instance_path,
        |ordering| ordering != Ordering::Greater,
        || ValidationErrorKind::Maximum {
            limit: Value::Number(limit.clone()),
        },
    )
}

pub(crate) fn exclusive_minimum(
    limit: &Number,
    instance: &Value,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
) -> KeywordEvaluation {
    bound(
        limit,
        instance,
        location,
        instance_path,
        |ordering| ordering == Ordering::Greater,
        || ValidationErrorKind::ExclusiveMinimum {
            limit: Value::Number(limit.clone()),
        },
    )
}

pub(crate) fn exclusive_maximum(
    limit: &Number,
    instance: &Value,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
) -> KeywordEvaluation {
    bound(
        limit,
        instance,
        location,
        instance_path,
        |ordering| ordering == Ordering::Less,
        || ValidationErrorKind::ExclusiveMaximum {
            limit: Value::Number(limit.clone()),
        },
    )
}

pub(crate) fn multiple_of(
    divisor: &Number,
    instance: &Value,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
) -> KeywordEvaluation {
    let Value::Number(number) = instance else {
        return OutputNode::ignored(location, instance_path);
    };
    if is_multiple_of(number, divisor) {
        OutputNode::success(location, instance_path, None)
    } else {
        OutputNode::failure(
            location,
            instance_path,
            instance,
            ValidationErrorKind::MultipleOf {
                multiple_of: Value::Number(divisor.clone()),
            },
        )
    }
}

fn is_multiple_of(number: &Number, divisor: &Number) -> bool {
    if let (Some(number), Some(divisor)) = (number.as_i64(), divisor.as_i64()) {
        return divisor != 0 && number % divisor == 0;
    }
    if let (Some(number), Some(divisor)) = (number.as_u64(), divisor.as_u64()) {
        return divisor != 0 && number % divisor == 0;
    }
    let (Some(number), Some(divisor)) = (number.as_f64(), divisor.as_f64()) else {
        return false;
    };
    // Exact arithmetic sidesteps float artifacts like 0.0075 / 0.0001.
    // Involves heap allocations via the underlying `BigUint` type.
    let fraction = BigFraction::from(number) / BigFraction::from(divisor);
    if let Some(denom) = fraction.denom() {
        denom == &BigUint::from(1_u8)
    } else {
        true
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"minimum": 0}), &json!(3), true)]
    #[test_case(&json!({"minimum": 0}), &json!(0), true; "minimum is inclusive")]
    #[test_case(&json!({"minimum": 0}), &json!(-1), false)]
    #[test_case(&json!({"minimum": 1.1}), &json!(0.6), false)]
    #[test_case(&json!({"maximum": 3}), &json!(3.0), true; "maximum is inclusive across representations")]
    #[test_case(&json!({"maximum": 3}), &json!(3.5), false)]
    #[test_case(&json!({"exclusiveMinimum": 1}), &json!(1.0), false)]
    #[test_case(&json!({"exclusiveMinimum": 1}), &json!(1.5), true)]
    #[test_case(&json!({"exclusiveMaximum": 3.0}), &json!(3), false)]
    #[test_case(&json!({"minimum": 0}), &json!("x"), true; "non-numbers are ignored")]
    fn bounds(schema: &Value, instance: &Value, expected: bool) {
        assert_eq!(crate::is_valid(schema, instance), expected);
    }

    #[test_case(&json!(2), &json!(8), true)]
    #[test_case(&json!(2), &json!(7), false)]
    #[test_case(&json!(2.5), &json!(7.5), true)]
    #[test_case(&json!(0.0001), &json!(0.0075), true; "float remainder is computed exactly")]
    #[test_case(&json!(0.5), &json!(1.25), false)]
    fn multiples(divisor: &Value, instance: &Value, expected: bool) {
        let schema = json!({"multipleOf": divisor});
        assert_eq!(crate::is_valid(&schema, instance), expected);
    }
}
