//! `contains` with its `minContains`/`maxContains` companions.
//!
//! `contains` emits the list of matching indices as its annotation;
//! `minContains` and `maxContains` constrain the length of that list. A
//! sibling `minContains: 0` forces `contains` itself to succeed.
use serde_json::{json, Value};

use crate::{
    context::EvalContext,
    engine::{self, KeywordEvaluation, Scope},
    error::ValidationErrorKind,
    keywords::Keyword,
    output::OutputNode,
    paths::{LazyLocation, SchemaLocation},
    schema::{ObjectSchema, Schema},
};

pub(crate) fn contains(
    subschema: &Schema,
    parent: &ObjectSchema,
    instance: &Value,
    scope: &mut Scope,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
    ctx: &mut EvalContext<'_>,
) -> KeywordEvaluation {
    let Value::Array(array) = instance else {
        return OutputNode::ignored(location, instance_path);
    };
    let min_contains = parent.get("minContains").and_then(|node| match node.kind {
        Keyword::MinContains(limit) => Some(limit),
        _ => None,
    });
    let has_count_consumers =
        min_contains.is_some() || parent.get("maxContains").is_some();
    // Without a count consumer one match settles the keyword.
    let exhaustive = ctx.collect_annotations || has_count_consumers;

    let mut children = Vec::new();
    let mut indices = Vec::new();
    for (idx, item) in array.iter().enumerate() {
        let child_path = instance_path.push(idx);
        let result = engine::evaluate(subschema, item, location, &child_path, ctx);
        if result.valid() {
            indices.push(idx);
        }
        children.push(result.node);
        if !indices.is_empty() && !exhaustive {
            break;
        }
    }
    if indices.is_empty() && min_contains != Some(0) {
        let mut node = OutputNode::failure(
            location,
            instance_path,
            instance,
            ValidationErrorKind::Contains,
        );
        node.children = children;
        return node;
    }
    let annotation = json!(indices);
    scope.annotate("contains", annotation.clone());
    OutputNode::success(location, instance_path, Some(annotation)).with_children(children)
}

pub(crate) fn min_contains(
    limit: u64,
    parent: &ObjectSchema,
    instance: &Value,
    scope: &mut Scope,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
) -> KeywordEvaluation {
    if !instance.is_array() || parent.get("contains").is_none() {
        return OutputNode::ignored(location, instance_path);
    }
    let Some(found) = scope.direct_contains() else {
        // `contains` failed; it already reported the shortage.
        return OutputNode::ignored(location, instance_path);
    };
    if (found as u64) < limit {
        OutputNode::failure(
            location,
            instance_path,
            instance,
            ValidationErrorKind::MinContains { limit, found },
        )
    } else {
        OutputNode::success(location, instance_path, None)
    }
}

pub(crate) fn max_contains(
    limit: u64,
    parent: &ObjectSchema,
    instance: &Value,
    scope: &mut Scope,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
) -> KeywordEvaluation {
    if !instance.is_array() || parent.get("contains").is_none() {
        return OutputNode::ignored(location, instance_path);
    }
    let Some(found) = scope.direct_contains() else {
        return OutputNode::ignored(location, instance_path);
    };
    if (found as u64) > limit {
        OutputNode::failure(
            location,
            instance_path,
            instance,
            ValidationErrorKind::MaxContains { limit, found },
        )
    } else {
        OutputNode::success(location, instance_path, None)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!([2, 3, 7]), true)]
    #[test_case(&json!([2, 3, 4]), false)]
    #[test_case(&json!([]), false)]
    #[test_case(&json!("skip"), true; "non-arrays are ignored")]
    fn contains_requires_one_match(instance: &Value, expected: bool) {
        let schema = json!({"contains": {"minimum": 5}});
        assert_eq!(crate::is_valid(&schema, instance), expected);
    }

    #[test_case(&json!([5, 6, 1]), true; "two matches meet the minimum")]
    #[test_case(&json!([5, 1, 1]), false; "one match is short")]
    fn min_contains_counts_matches(instance: &Value, expected: bool) {
        let schema = json!({"contains": {"minimum": 5}, "minContains": 2});
        assert_eq!(crate::is_valid(&schema, instance), expected);
    }

    #[test]
    fn min_contains_zero_forces_contains_success() {
        let schema = json!({"contains": {"minimum": 5}, "minContains": 0});
        assert!(crate::is_valid(&schema, &json!([])));
        assert!(crate::is_valid(&schema, &json!([1, 2])));
    }

    #[test]
    fn max_contains_bounds_matches() {
        let schema = json!({"contains": {"minimum": 5}, "maxContains": 1});
        assert!(crate::is_valid(&schema, &json!([5, 1])));
        assert!(!crate::is_valid(&schema, &json!([5, 6])));
        let validator = crate::validator_for(&schema).expect("Invalid schema");
        let errors = validator.iter_errors(&json!([5, 6])).collect::<Vec<_>>();
        assert_eq!(
            errors[0].to_string(),
            "[5,6] contains 2 matching items, expected at most 1"
        );
    }
}
