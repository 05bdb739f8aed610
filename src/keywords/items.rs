//! `items` (both historical shapes), `prefixItems` and `additionalItems`.
use serde_json::{json, Value};

use crate::{
    context::EvalContext,
    engine::{self, KeywordEvaluation, Scope},
    error::ValidationErrorKind,
    keywords::ItemsKind,
    output::OutputNode,
    paths::{LazyLocation, SchemaLocation},
    schema::Schema,
};

pub(crate) fn items(
    kind: &ItemsKind,
    instance: &Value,
    scope: &mut Scope,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
    ctx: &mut EvalContext<'_>,
) -> KeywordEvaluation {
    let Value::Array(array) = instance else {
        return OutputNode::ignored(location, instance_path);
    };
    match kind {
        ItemsKind::Single(subschema) => {
            // With a 2020-12 `prefixItems` sibling only the remainder is ours.
            let start = match scope.direct.get("prefixItems") {
                Some(Value::Bool(true)) => array.len(),
                Some(Value::Number(bound)) => bound.as_u64().unwrap_or(0) as usize,
                _ => 0,
            };
            let mut children = Vec::new();
            let mut valid = true;
            for (idx, item) in array.iter().enumerate().skip(start) {
                let child_path = instance_path.push(idx);
                let result = engine::evaluate(subschema, item, location, &child_path, ctx);
                valid &= result.valid();
                children.push(result.node);
                if !valid && ctx.flag_mode {
                    break;
                }
            }
            if valid {
                scope.annotate("items", json!(true));
                OutputNode::success(location, instance_path, Some(json!(true)))
                    .with_children(children)
            } else {
                OutputNode::invalid_children(location, instance_path, children)
            }
        }
        ItemsKind::Positional(schemas) => {
            match positional(schemas, array, location, instance_path, ctx) {
                Ok((children, annotation)) => {
                    scope.annotate("items", annotation.clone());
                    OutputNode::success(location, instance_path, Some(annotation))
                        .with_children(children)
                }
                Err(children) => {
                    OutputNode::invalid_children(location, instance_path, children)
                }
            }
        }
    }
}

pub(crate) fn prefix_items(
    schemas: &[Schema],
    instance: &Value,
    scope: &mut Scope,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
    ctx: &mut EvalContext<'_>,
) -> KeywordEvaluation {
    let Value::Array(array) = instance else {
        return OutputNode::ignored(location, instance_path);
    };
    match positional(schemas, array, location, instance_path, ctx) {
        Ok((children, annotation)) => {
            scope.annotate("prefixItems", annotation.clone());
            OutputNode::success(location, instance_path, Some(annotation)).with_children(children)
        }
        Err(children) => OutputNode::invalid_children(location, instance_path, children),
    }
}

type PositionalOutcome = Result<(Vec<OutputNode>, Value), Vec<OutputNode>>;

/// Validate positional item schemas. On success the annotation is `true`
/// when every item was covered, otherwise the number of items consumed.
fn positional(
    schemas: &[Schema],
    array: &[Value],
    location: &SchemaLocation,
    instance_path: &LazyLocation,
    ctx: &mut EvalContext<'_>,
) -> PositionalOutcome {
    let mut children = Vec::new();
    let mut valid = true;
    let consumed = schemas.len().min(array.len());
    for (idx, (subschema, item)) in schemas.iter().zip(array.iter()).enumerate() {
        let child_location = location.join(idx);
        let child_path = instance_path.push(idx);
        let result = engine::evaluate(subschema, item, &child_location, &child_path, ctx);
        valid &= result.valid();
        children.push(result.node);
        if !valid && ctx.flag_mode {
            break;
        }
    }
    if valid {
        let annotation = if consumed == array.len() {
            json!(true)
        } else {
            json!(consumed)
        };
        Ok((children, annotation))
    } else {
        Err(children)
    }
}

/// Validates items past the positional `items` array of drafts up to
/// 2019-09. Inert when `items` is absent or a single schema.
pub(crate) fn additional_items(
    subschema: &Schema,
    instance: &Value,
    scope: &mut Scope,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
    ctx: &mut EvalContext<'_>,
) -> KeywordEvaluation {
    let Value::Array(array) = instance else {
        return OutputNode::ignored(location, instance_path);
    };
    let start = match scope.direct.get("items") {
        Some(Value::Number(bound)) => bound.as_u64().unwrap_or(0) as usize,
        _ => return OutputNode::ignored(location, instance_path),
    };
    if start >= array.len() {
        return OutputNode::ignored(location, instance_path);
    }
    if matches!(subschema, Schema::Bool(false)) {
        return OutputNode::failure(
            location,
            instance_path,
            instance,
            ValidationErrorKind::AdditionalItems { limit: start },
        );
    }
    let mut children = Vec::new();
    let mut valid = true;
    for (idx, item) in array.iter().enumerate().skip(start) {
        let child_path = instance_path.push(idx);
        let result = engine::evaluate(subschema, item, location, &child_path, ctx);
        valid &= result.valid();
        children.push(result.node);
        if !valid && ctx.flag_mode {
            break;
        }
    }
    if valid {
        scope.annotate("additionalItems", json!(true));
        OutputNode::success(location, instance_path, Some(json!(true))).with_children(children)
    } else {
        OutputNode::invalid_children(location, instance_path, children)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!([1, 2, 3]), true)]
    #[test_case(&json!([1, "x"]), false)]
    #[test_case(&json!("not an array"), true)]
    fn single_schema_items(instance: &Value, expected: bool) {
        let schema = json!({"items": {"type": "integer"}});
        assert_eq!(crate::is_valid(&schema, instance), expected);
    }

    #[test]
    fn prefix_items_then_items() {
        let schema = json!({
            "prefixItems": [{"type": "string"}],
            "items": {"type": "integer"}
        });
        assert!(crate::is_valid(&schema, &json!(["label", 1, 2])));
        assert!(!crate::is_valid(&schema, &json!(["label", "oops"])));
        assert!(!crate::is_valid(&schema, &json!([1])));
    }

    #[test]
    fn positional_items_with_additional_items_under_draft_7() {
        let schema = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "items": [{"type": "integer"}],
            "additionalItems": false
        });
        let validator = crate::validator_for(&schema).expect("Invalid schema");
        assert!(validator.is_valid(&json!([1])));
        assert!(!validator.is_valid(&json!([1, 2])));
        let errors = validator.iter_errors(&json!([1, 2])).collect::<Vec<_>>();
        assert_eq!(
            errors[0].to_string(),
            "Additional items are not allowed (2 was unexpected)"
        );
    }

    #[test]
    fn additional_items_is_inert_without_positional_items() {
        let schema = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "items": {"type": "integer"},
            "additionalItems": false
        });
        assert!(crate::is_valid(&schema, &json!([1, 2, 3])));
    }
}
