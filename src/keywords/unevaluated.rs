//! `unevaluatedItems` and `unevaluatedProperties`: the annotation consumers
//! that run last, after every sibling and every consolidated applicator has
//! reported what it covered.
use serde_json::{json, Value};

use crate::{
    context::EvalContext,
    engine::{self, KeywordEvaluation, Scope},
    error::ValidationErrorKind,
    output::OutputNode,
    paths::{LazyLocation, SchemaLocation},
    schema::Schema,
};

pub(crate) fn unevaluated_properties(
    subschema: &Schema,
    instance: &Value,
    scope: &mut Scope,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
    ctx: &mut EvalContext<'_>,
) -> KeywordEvaluation {
    let Value::Object(object) = instance else {
        return OutputNode::ignored(location, instance_path);
    };
    let covered = scope.evaluated_property_names();
    let mut children = Vec::new();
    let mut evaluated = Vec::new();
    let mut rejected = Vec::new();
    for (name, value) in object {
        if covered.contains(name.as_str()) {
            continue;
        }
        let child_location = location.join(name.as_str());
        let child_path = instance_path.push(name.as_str());
        let result = engine::evaluate(subschema, value, &child_location, &child_path, ctx);
        if result.valid() {
            evaluated.push(Value::String(name.clone()));
        } else {
            rejected.push(name.clone());
        }
        children.push(result.node);
        if !rejected.is_empty() && ctx.flag_mode {
            break;
        }
    }
    if rejected.is_empty() {
        let annotation = Value::Array(evaluated);
        scope.annotate("unevaluatedProperties", annotation.clone());
        OutputNode::success(location, instance_path, Some(annotation)).with_children(children)
    } else if matches!(subschema, Schema::Bool(false)) {
        OutputNode::failure(
            location,
            instance_path,
            instance,
            ValidationErrorKind::UnevaluatedProperties {
                unexpected: rejected,
            },
        )
    } else {
        OutputNode::invalid_children(location, instance_path, children)
    }
}

pub(crate) fn unevaluated_items(
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
    let coverage = scope.evaluated_items();
    let matched = scope.contains_indices();
    let mut children = Vec::new();
    let mut rejected = Vec::new();
    let mut saw_unevaluated = false;
    for (idx, item) in array.iter().enumerate() {
        if coverage.covers(idx) || matched.contains(&idx) {
            continue;
        }
        saw_unevaluated = true;
        let child_location = location.join(idx);
        let child_path = instance_path.push(idx);
        let result = engine::evaluate(subschema, item, &child_location, &child_path, ctx);
        if !result.valid() {
            rejected.push(idx);
        }
        children.push(result.node);
        if !rejected.is_empty() && ctx.flag_mode {
            break;
        }
    }
    if rejected.is_empty() {
        if saw_unevaluated {
            scope.annotate("unevaluatedItems", json!(true));
            OutputNode::success(location, instance_path, Some(json!(true)))
                .with_children(children)
        } else {
            OutputNode::success(location, instance_path, None)
        }
    } else if matches!(subschema, Schema::Bool(false)) {
        OutputNode::failure(
            location,
            instance_path,
            instance,
            ValidationErrorKind::UnevaluatedItems {
                unexpected: rejected,
            },
        )
    } else {
        OutputNode::invalid_children(location, instance_path, children)
    }
}
