//! `if`/`then`/`else`.
use serde_json::Value;

use crate::{
    context::EvalContext,
    engine::{self, KeywordEvaluation, Scope},
    output::OutputNode,
    paths::{LazyLocation, SchemaLocation},
    schema::Schema,
};

/// `if` never affects validity on its own; it records its outcome for the
/// sibling branches and discards any annotations its subschema produced.
pub(crate) fn if_(
    subschema: &Schema,
    instance: &Value,
    scope: &mut Scope,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
    ctx: &mut EvalContext<'_>,
) -> KeywordEvaluation {
    let result = engine::evaluate(subschema, instance, location, instance_path, ctx);
    scope.if_outcome = Some(result.valid());
    OutputNode::success(location, instance_path, None).with_children(vec![result.node])
}

pub(crate) fn then_(
    subschema: &Schema,
    instance: &Value,
    scope: &mut Scope,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
    ctx: &mut EvalContext<'_>,
) -> KeywordEvaluation {
    branch(subschema, instance, scope, location, instance_path, ctx, Some(true))
}

pub(crate) fn else_(
    subschema: &Schema,
    instance: &Value,
    scope: &mut Scope,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
    ctx: &mut EvalContext<'_>,
) -> KeywordEvaluation {
    branch(subschema, instance, scope, location, instance_path, ctx, Some(false))
}

fn branch(
    subschema: &Schema,
    instance: &Value,
    scope: &mut Scope,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
    ctx: &mut EvalContext<'_>,
    triggered_on: Option<bool>,
) -> KeywordEvaluation {
    if scope.if_outcome != triggered_on {
        // Absence of the triggered branch is success.
        return OutputNode::ignored(location, instance_path);
    }
    let result = engine::evaluate(subschema, instance, location, instance_path, ctx);
    if result.valid() {
        scope.consolidate(&result.annotations);
    }
    result.node
}
