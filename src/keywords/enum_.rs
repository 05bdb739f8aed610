//! `enum` and `const`, compared with numeric-aware equality.
use serde_json::Value;

use crate::{
    engine::KeywordEvaluation,
    equality,
    error::ValidationErrorKind,
    output::OutputNode,
    paths::{LazyLocation, SchemaLocation},
};

pub(crate) fn enum_(
    options: &[Value],
    instance: &Value,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
) -> KeywordEvaluation {
    if options
        .iter()
        .any(|option| equality::equal(option, instance))
    {
        OutputNode::success(location, instance_path, None)
    } else {
        OutputNode::failure(
            location,
            instance_path,
            instance,
            ValidationErrorKind::Enum {
                options: Value::Array(options.to_vec()),
            },
        )
    }
}

pub(crate) fn const_(
    expected: &Value,
    instance: &Value,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
) -> KeywordEvaluation {
    if equality::equal(expected, instance) {
        OutputNode::success(location, instance_path, None)
    } else {
        OutputNode::failure(
            location,
            instance_path,
            instance,
            ValidationErrorKind::Constant {
                expected_value: expected.clone(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"enum": [1, 2, 3]}), &json!(2), true)]
    #[test_case(&json!({"enum": [1, 2, 3]}), &json!(4), false)]
    #[test_case(&json!({"enum": [1.0]}), &json!(1), true; "numeric equivalence")]
    #[test_case(&json!({"enum": [[1.0]]}), &json!([1]), true; "nested numeric equivalence")]
    #[test_case(&json!({"enum": [{"a": 1.0}]}), &json!({"a": 1}), true)]
    #[test_case(&json!({"const": 0.0}), &json!(0), true)]
    #[test_case(&json!({"const": {"c": [1.0]}}), &json!({"c": [1]}), true)]
    #[test_case(&json!({"const": "x"}), &json!("y"), false)]
    fn equality_semantics(schema: &Value, instance: &Value, expected: bool) {
        assert_eq!(crate::is_valid(schema, instance), expected);
    }
}
