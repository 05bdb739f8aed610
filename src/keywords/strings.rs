//! `minLength`, `maxLength` and `pattern`.
use serde_json::Value;

use crate::{
    engine::KeywordEvaluation,
    error::ValidationErrorKind,
    output::OutputNode,
    paths::{LazyLocation, SchemaLocation},
};

pub(crate) fn min_length(
    limit: u64,
    instance: &Value,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
) -> KeywordEvaluation {
    let Value::String(string) = instance else {
        return OutputNode::ignored(location, instance_path);
    };
    if (string.chars().count() as u64) < limit {
        OutputNode::failure(
            location,
            instance_path,
            instance,
            ValidationErrorKind::MinLength { limit },
        )
    } else {
        OutputNode::success(location, instance_path, None)
    }
}

pub(crate) fn max_length(
    limit: u64,
    instance: &Value,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
) -> KeywordEvaluation {
    let Value::String(string) = instance else {
        return OutputNode::ignored(location, instance_path);
    };
    if (string.chars().count() as u64) > limit {
        OutputNode::failure(
            location,
            instance_path,
            instance,
            ValidationErrorKind::MaxLength { limit },
        )
    } else {
        OutputNode::success(location, instance_path, None)
    }
}

pub(crate) fn pattern(
    pattern: &fancy_regex::Regex,
    source: &str,
    instance: &Value,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
) -> KeywordEvaluation {
    let Value::String(string) = instance else {
        return OutputNode::ignored(location, instance_path);
    };
    match pattern.is_match(string) {
        Ok(true) => OutputNode::success(location, instance_path, None),
        Ok(false) => OutputNode::failure(
            location,
            instance_path,
            instance,
            ValidationErrorKind::Pattern {
                pattern: source.to_string(),
            },
        ),
        Err(error) => OutputNode::failure(
            location,
            instance_path,
            instance,
            ValidationErrorKind::BacktrackLimitExceeded {
                error: error.to_string(),
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"minLength": 2}), &json!("ab"), true)]
    #[test_case(&json!({"minLength": 2}), &json!("a"), false)]
    #[test_case(&json!({"minLength": 2}), &json!("áé"), true; "characters not bytes")]
    #[test_case(&json!({"maxLength": 2}), &json!("ab"), true)]
    #[test_case(&json!({"maxLength": 2}), &json!("abc"), false)]
    #[test_case(&json!({"maxLength": 2}), &json!(123), true; "non-strings are ignored")]
    fn lengths(schema: &Value, instance: &Value, expected: bool) {
        assert_eq!(crate::is_valid(schema, instance), expected);
    }

    #[test_case(&json!("^a+$"), &json!("aaa"), true)]
    #[test_case(&json!("^a+$"), &json!("ab"), false)]
    #[test_case(&json!("a"), &json!("xax"), true; "unanchored search")]
    #[test_case(&json!("^(?!forbidden)"), &json!("allowed"), true; "lookahead is supported")]
    #[test_case(&json!("^(?!forbidden)"), &json!("forbidden"), false)]
    fn patterns(pattern: &Value, instance: &Value, expected: bool) {
        let schema = json!({"pattern": pattern});
        assert_eq!(crate::is_valid(&schema, instance), expected);
    }
}
