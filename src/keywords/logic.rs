//! `allOf`, `anyOf`, `oneOf` and `not`.
use serde_json::Value;

use crate::{
    context::EvalContext,
    engine::{self, KeywordEvaluation, Scope},
    error::ValidationErrorKind,
    output::OutputNode,
    paths::{LazyLocation, SchemaLocation},
    schema::Schema,
};

pub(crate) fn all_of(
    members: &[Schema],
    instance: &Value,
    scope: &mut Scope,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
    ctx: &mut EvalContext<'_>,
) -> KeywordEvaluation {
    let mut children = Vec::with_capacity(members.len());
    let mut valid = true;
    for (idx, member) in members.iter().enumerate() {
        let member_location = location.join(idx);
        let result = engine::evaluate(member, instance, &member_location, instance_path, ctx);
        if result.valid() {
            scope.consolidate(&result.annotations);
        } else {
            valid = false;
        }
        children.push(result.node);
        if !valid && ctx.flag_mode {
            break;
        }
    }
    if valid {
        OutputNode::success(location, instance_path, None).with_children(children)
    } else {
        OutputNode::invalid_children(location, instance_path, children)
    }
}

pub(crate) fn any_of(
    members: &[Schema],
    instance: &Value,
    scope: &mut Scope,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
    ctx: &mut EvalContext<'_>,
) -> KeywordEvaluation {
    let mut children = Vec::with_capacity(members.len());
    let mut valid = false;
    // Members run in author-declared order.
    for (idx, member) in members.iter().enumerate() {
        let member_location = location.join(idx);
        let result = engine::evaluate(member, instance, &member_location, instance_path, ctx);
        if result.valid() {
            valid = true;
            scope.consolidate(&result.annotations);
        }
        children.push(result.node);
        if valid && ctx.flag_mode && !ctx.collect_annotations {
            // Under the flag format one success settles the disjunction.
            break;
        }
    }
    if valid {
        OutputNode::success(location, instance_path, None).with_children(children)
    } else {
        let mut node = OutputNode::failure(
            location,
            instance_path,
            instance,
            ValidationErrorKind::AnyOf,
        );
        node.children = children;
        node
    }
}

pub(crate) fn one_of(
    members: &[Schema],
    instance: &Value,
    scope: &mut Scope,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
    ctx: &mut EvalContext<'_>,
) -> KeywordEvaluation {
    let mut children = Vec::with_capacity(members.len());
    let mut first_valid: Option<usize> = None;
    let mut valid_count = 0usize;
    for (idx, member) in members.iter().enumerate() {
        let member_location = location.join(idx);
        let result = engine::evaluate(member, instance, &member_location, instance_path, ctx);
        if result.valid() {
            valid_count += 1;
            if first_valid.is_none() {
                first_valid = Some(children.len());
                scope.consolidate(&result.annotations);
            }
        }
        children.push(result.node);
        if valid_count > 1 && ctx.flag_mode {
            break;
        }
    }
    match valid_count {
        1 => OutputNode::success(location, instance_path, None).with_children(children),
        0 => {
            let mut node = OutputNode::failure(
                location,
                instance_path,
                instance,
                ValidationErrorKind::OneOfNotValid,
            );
            node.children = children;
            node
        }
        _ => {
            let mut node = OutputNode::failure(
                location,
                instance_path,
                instance,
                ValidationErrorKind::OneOfMultipleValid,
            );
            node.children = children;
            node
        }
    }
}

pub(crate) fn not(
    subschema: &Schema,
    instance: &Value,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
    ctx: &mut EvalContext<'_>,
) -> KeywordEvaluation {
    // Annotations never leak out of a negation.
    let result = engine::evaluate(subschema, instance, location, instance_path, ctx);
    if result.valid() {
        OutputNode::failure(location, instance_path, instance, ValidationErrorKind::Not)
    } else {
        OutputNode::success(location, instance_path, None)
    }
}
