//! `$ref`, `$dynamicRef` and the 2019-09 `$recursiveRef`.
//!
//! A traversal rebinds the lexical base and the current resource, pushes the
//! target onto the dynamic scope, and guards against cycles through the
//! visited-reference set keyed by (absolute reference, instance fingerprint).
//! The visited entry is removed when the traversal returns, so the same
//! reference applied to sibling subschemas is not mistaken for a cycle.
use std::sync::Arc;

use serde_json::Value;

use crate::{
    context::EvalContext,
    engine::{self, KeywordEvaluation, Scope},
    equality,
    error::ValidationErrorKind,
    output::OutputNode,
    paths::{LazyLocation, Location, SchemaLocation},
    resolver::{self, ResolvedTarget},
};

pub(crate) fn ref_(
    reference: &str,
    instance: &Value,
    scope: &mut Scope,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
    ctx: &mut EvalContext<'_>,
) -> KeywordEvaluation {
    let registry = ctx.registry;
    match resolver::resolve_reference(registry, &ctx.base_uri, reference) {
        Ok(target) => follow(&target, instance, scope, location, instance_path, ctx),
        Err(error) => OutputNode::failure(
            location,
            instance_path,
            instance,
            ValidationErrorKind::Referencing(error),
        ),
    }
}

pub(crate) fn dynamic_ref(
    reference: &str,
    instance: &Value,
    scope: &mut Scope,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
    ctx: &mut EvalContext<'_>,
) -> KeywordEvaluation {
    let registry = ctx.registry;
    match resolver::resolve_dynamic_reference(
        registry,
        &ctx.base_uri,
        reference,
        &ctx.dynamic_scope,
    ) {
        Ok(target) => follow(&target, instance, scope, location, instance_path, ctx),
        Err(error) => OutputNode::failure(
            location,
            instance_path,
            instance,
            ValidationErrorKind::Referencing(error),
        ),
    }
}

pub(crate) fn recursive_ref(
    instance: &Value,
    scope: &mut Scope,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
    ctx: &mut EvalContext<'_>,
) -> KeywordEvaluation {
    let registry = ctx.registry;
    match resolver::resolve_recursive_reference(registry, &ctx.base_uri, &ctx.dynamic_scope) {
        Ok(target) => follow(&target, instance, scope, location, instance_path, ctx),
        Err(error) => OutputNode::failure(
            location,
            instance_path,
            instance,
            ValidationErrorKind::Referencing(error),
        ),
    }
}

fn follow(
    target: &ResolvedTarget<'_>,
    instance: &Value,
    scope: &mut Scope,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
    ctx: &mut EvalContext<'_>,
) -> KeywordEvaluation {
    let key = (target.absolute.clone(), equality::fingerprint(instance));
    if !ctx.visited.insert(key.clone()) {
        return OutputNode::failure(
            location,
            instance_path,
            instance,
            ValidationErrorKind::RecursiveReference {
                reference: target.absolute.clone(),
            },
        );
    }
    let prior_base = std::mem::replace(&mut ctx.base_uri, target.entry.uri.clone());
    let prior_entry = std::mem::replace(&mut ctx.entry, Arc::clone(target.entry));
    // The push outlives this traversal on purpose: the dynamic scope covers
    // the rest of the referencing schema's evaluation, and the engine pops it
    // when that evaluation completes.
    ctx.dynamic_scope.push(ctx.base_uri.clone());

    let target_location = location.rebase(
        Some(Arc::new(ctx.base_uri.clone())),
        Location::from_pointer(&target.location),
    );
    let result = engine::evaluate(target.schema, instance, &target_location, instance_path, ctx);

    ctx.entry = prior_entry;
    ctx.base_uri = prior_base;
    ctx.visited.remove(&key);

    if result.valid() {
        scope.consolidate(&result.annotations);
    }
    result.node
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!(2), true)]
    #[test_case(&json!(0), false)]
    fn local_definitions(instance: &Value, expected: bool) {
        let schema = json!({
            "$defs": {"pos": {"type": "integer", "minimum": 1}},
            "$ref": "#/$defs/pos"
        });
        assert_eq!(crate::is_valid(&schema, instance), expected);
    }

    #[test]
    fn self_reference_cycle_is_reported_without_overflow() {
        let schema = json!({
            "$defs": {"x": {"$ref": "#/$defs/x"}},
            "$ref": "#/$defs/x"
        });
        let validator = crate::validator_for(&schema).expect("Invalid schema");
        let errors = validator.iter_errors(&json!(1)).collect::<Vec<_>>();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().starts_with("Recursive reference"));
    }

    #[test]
    fn recursion_over_shrinking_instances_terminates() {
        let schema = json!({
            "properties": {"next": {"$ref": "#"}},
            "type": "object"
        });
        let instance = json!({"next": {"next": {"next": {}}}});
        assert!(crate::is_valid(&schema, &instance));
        assert!(!crate::is_valid(&schema, &json!({"next": 1})));
    }

    #[test]
    fn sibling_uses_of_one_reference_are_not_a_cycle() {
        let schema = json!({
            "$defs": {"name": {"type": "string"}},
            "properties": {
                "first": {"$ref": "#/$defs/name"},
                "second": {"$ref": "#/$defs/name"}
            }
        });
        // Equal sibling values exercise the same (reference, fingerprint)
        // pair twice; each traversal completes before the next begins.
        assert!(crate::is_valid(&schema, &json!({"first": "a", "second": "a"})));
    }

    #[test]
    fn unresolved_reference_fails_only_that_keyword() {
        let schema = json!({"properties": {"a": {"$ref": "https://missing.example.com/schema"}}});
        let validator = crate::validator_for(&schema).expect("Invalid schema");
        assert!(!validator.is_valid(&json!({"a": 1})));
        assert!(validator.is_valid(&json!({})));
        let errors = validator.iter_errors(&json!({"a": 1})).collect::<Vec<_>>();
        assert!(errors[0]
            .to_string()
            .contains("is not present in the registry"));
    }

    #[test]
    fn recursive_anchor_rebinds_to_the_outermost_scope() {
        let mut registry = crate::Registry::with_draft(crate::Draft::Draft201909);
        registry
            .register(
                &json!({
                    "$schema": "https://json-schema.org/draft/2019-09/schema",
                    "$id": "https://example.com/tree",
                    "$recursiveAnchor": true,
                    "type": "object",
                    "properties": {
                        "data": true,
                        "children": {"type": "array", "items": {"$recursiveRef": "#"}}
                    }
                }),
                None,
            )
            .expect("Registration failed");
        registry
            .register(
                &json!({
                    "$schema": "https://json-schema.org/draft/2019-09/schema",
                    "$id": "https://example.com/strict-tree",
                    "$recursiveAnchor": true,
                    "$ref": "tree",
                    "unevaluatedProperties": false
                }),
                None,
            )
            .expect("Registration failed");
        let validator = crate::Validator::from_registry(
            registry,
            "https://example.com/strict-tree",
            crate::ValidationOptions::default(),
        )
        .expect("Unknown URI");
        // The nested "daat" typo must be caught by the outer strict schema.
        assert!(!validator.is_valid(&json!({
            "children": [{"daat": 1}]
        })));
        assert!(validator.is_valid(&json!({
            "children": [{"data": 1}]
        })));
    }
}
