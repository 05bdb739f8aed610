//! `properties`, `patternProperties`, `additionalProperties` and
//! `propertyNames`.
use serde_json::Value;

use crate::{
    context::EvalContext,
    engine::{self, KeywordEvaluation, Scope},
    error::ValidationErrorKind,
    keywords::PatternSchema,
    output::OutputNode,
    paths::{LazyLocation, SchemaLocation},
    schema::Schema,
};

pub(crate) fn properties(
    entries: &[(Box<str>, Schema)],
    instance: &Value,
    scope: &mut Scope,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
    ctx: &mut EvalContext<'_>,
) -> KeywordEvaluation {
    let Value::Object(object) = instance else {
        return OutputNode::ignored(location, instance_path);
    };
    let mut children = Vec::new();
    let mut matched = Vec::new();
    let mut valid = true;
    for (name, subschema) in entries {
        let Some(value) = object.get(&**name) else {
            continue;
        };
        let child_location = location.join(&**name);
        let child_path = instance_path.push(&**name);
        let result = engine::evaluate(subschema, value, &child_location, &child_path, ctx);
        if result.valid() {
            matched.push(Value::String(name.to_string()));
        } else {
            valid = false;
        }
        children.push(result.node);
        if !valid && ctx.flag_mode {
            break;
        }
    }
    if valid {
        let annotation = Value::Array(matched);
        scope.annotate("properties", annotation.clone());
        OutputNode::success(location, instance_path, Some(annotation)).with_children(children)
    } else {
        OutputNode::invalid_children(location, instance_path, children)
    }
}

pub(crate) fn pattern_properties(
    entries: &[PatternSchema],
    instance: &Value,
    scope: &mut Scope,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
    ctx: &mut EvalContext<'_>,
) -> KeywordEvaluation {
    let Value::Object(object) = instance else {
        return OutputNode::ignored(location, instance_path);
    };
    let mut children = Vec::new();
    let mut matched = Vec::new();
    let mut valid = true;
    for entry in entries {
        for (name, value) in object {
            match entry.pattern.is_match(name) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(error) => {
                    return OutputNode::failure(
                        location,
                        instance_path,
                        instance,
                        ValidationErrorKind::BacktrackLimitExceeded {
                            error: error.to_string(),
                        },
                    );
                }
            }
            let child_location = location.join(&*entry.source);
            let child_path = instance_path.push(name.as_str());
            let result = engine::evaluate(&entry.schema, value, &child_location, &child_path, ctx);
            if result.valid() {
                if !matched
                    .iter()
                    .any(|present: &Value| present.as_str() == Some(name.as_str()))
                {
                    matched.push(Value::String(name.clone()));
                }
            } else {
                valid = false;
            }
            children.push(result.node);
            if !valid && ctx.flag_mode {
                break;
            }
        }
    }
    if valid {
        let annotation = Value::Array(matched);
        scope.annotate("patternProperties", annotation.clone());
        OutputNode::success(location, instance_path, Some(annotation)).with_children(children)
    } else {
        OutputNode::invalid_children(location, instance_path, children)
    }
}

/// Validates properties not covered by the sibling `properties` and
/// `patternProperties` annotations.
pub(crate) fn additional_properties(
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
    let covered = scope.direct_property_names();
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
        scope.annotate("additionalProperties", annotation.clone());
        OutputNode::success(location, instance_path, Some(annotation)).with_children(children)
    } else if matches!(subschema, Schema::Bool(false)) {
        OutputNode::failure(
            location,
            instance_path,
            instance,
            ValidationErrorKind::AdditionalProperties {
                unexpected: rejected,
            },
        )
    } else {
        OutputNode::invalid_children(location, instance_path, children)
    }
}

/// Validates each property name, as a JSON string, against the subschema.
pub(crate) fn property_names(
    subschema: &Schema,
    instance: &Value,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
    ctx: &mut EvalContext<'_>,
) -> KeywordEvaluation {
    let Value::Object(object) = instance else {
        return OutputNode::ignored(location, instance_path);
    };
    let mut children = Vec::new();
    let mut valid = true;
    for name in object.keys() {
        let as_value = Value::String(name.clone());
        let child_path = instance_path.push(name.as_str());
        let result = engine::evaluate(subschema, &as_value, location, &child_path, ctx);
        if !result.valid() {
            valid = false;
            let mut failure = OutputNode::failure(
                location,
                &child_path,
                &as_value,
                ValidationErrorKind::PropertyNames {
                    property: name.clone(),
                },
            );
            failure.children = vec![result.node];
            children.push(failure);
            if ctx.flag_mode {
                break;
            }
        }
    }
    if valid {
        OutputNode::success(location, instance_path, None)
    } else {
        OutputNode::invalid_children(location, instance_path, children)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"a": "x"}), true)]
    #[test_case(&json!({"a": 1}), false)]
    #[test_case(&json!({}), true; "missing property is fine without required")]
    #[test_case(&json!(42), true; "non-objects are ignored")]
    fn named_properties(instance: &Value, expected: bool) {
        let schema = json!({"properties": {"a": {"type": "string"}}});
        assert_eq!(crate::is_valid(&schema, instance), expected);
    }

    #[test_case(&json!({"x_count": 1}), true)]
    #[test_case(&json!({"x_count": "one"}), false)]
    #[test_case(&json!({"other": "free"}), true)]
    fn pattern_properties_match_by_regex(instance: &Value, expected: bool) {
        let schema = json!({"patternProperties": {"_count$": {"type": "integer"}}});
        assert_eq!(crate::is_valid(&schema, instance), expected);
    }

    #[test]
    fn additional_properties_sees_both_sibling_annotations() {
        let schema = json!({
            "properties": {"foo": {}},
            "patternProperties": {"^v": {}},
            "additionalProperties": false
        });
        assert!(crate::is_valid(&schema, &json!({"foo": 1, "vroom": 2})));
        assert!(!crate::is_valid(&schema, &json!({"foo": 1, "quux": 2})));
    }

    #[test]
    fn additional_properties_schema_applies_to_the_rest() {
        let schema = json!({
            "properties": {"id": {"type": "integer"}},
            "additionalProperties": {"type": "string"}
        });
        assert!(crate::is_valid(&schema, &json!({"id": 1, "note": "x"})));
        assert!(!crate::is_valid(&schema, &json!({"id": 1, "note": 2})));
    }

    #[test]
    fn property_names_validates_every_key() {
        let schema = json!({"propertyNames": {"maxLength": 3}});
        assert!(crate::is_valid(&schema, &json!({"abc": 1})));
        assert!(!crate::is_valid(&schema, &json!({"abcd": 1})));
        let validator = crate::validator_for(&schema).expect("Invalid schema");
        let errors = validator.iter_errors(&json!({"abcd": 1})).collect::<Vec<_>>();
        assert_eq!(
            errors[0].to_string(),
            "'abcd' is not a valid property name"
        );
    }
}
