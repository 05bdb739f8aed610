//! `required`, dependency keywords, size bounds and `uniqueItems`.
use ahash::AHashMap;
use serde_json::{json, Value};

use crate::{
    context::EvalContext,
    engine::{self, KeywordEvaluation, Scope},
    equality,
    error::ValidationErrorKind,
    keywords::Dependency,
    output::OutputNode,
    paths::{LazyLocation, SchemaLocation},
    schema::Schema,
};

pub(crate) fn required(
    names: &[Box<str>],
    instance: &Value,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
) -> KeywordEvaluation {
    let Value::Object(object) = instance else {
        return OutputNode::ignored(location, instance_path);
    };
    let mut children = Vec::new();
    for name in names {
        if !object.contains_key(&**name) {
            children.push(OutputNode::failure(
                location,
                instance_path,
                instance,
                ValidationErrorKind::Required {
                    property: json!(&**name),
                },
            ));
        }
    }
    if children.is_empty() {
        OutputNode::success(location, instance_path, None)
    } else {
        OutputNode::invalid_children(location, instance_path, children)
    }
}

/// Draft 6/7 `dependencies`: each entry is either a list of property names
/// that must accompany the trigger property, or a subschema applied to the
/// whole object when the trigger is present.
pub(crate) fn dependencies(
    entries: &[(Box<str>, Dependency)],
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
    let mut valid = true;
    for (trigger, dependency) in entries {
        if !object.contains_key(&**trigger) {
            continue;
        }
        match dependency {
            Dependency::Requires(names) => {
                for name in names {
                    if !object.contains_key(&**name) {
                        valid = false;
                        children.push(OutputNode::failure(
                            location,
                            instance_path,
                            instance,
                            ValidationErrorKind::Required {
                                property: json!(&**name),
                            },
                        ));
                    }
                }
            }
            Dependency::Schema(subschema) => {
                let child_location = location.join(&**trigger);
                let result =
                    engine::evaluate(subschema, instance, &child_location, instance_path, ctx);
                if result.valid() {
                    scope.consolidate(&result.annotations);
                } else {
                    valid = false;
                }
                children.push(result.node);
            }
        }
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

pub(crate) fn dependent_required(
    entries: &[(Box<str>, Vec<Box<str>>)],
    instance: &Value,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
) -> KeywordEvaluation {
    let Value::Object(object) = instance else {
        return OutputNode::ignored(location, instance_path);
    };
    let mut children = Vec::new();
    for (trigger, names) in entries {
        if !object.contains_key(&**trigger) {
            continue;
        }
        for name in names {
            if !object.contains_key(&**name) {
                children.push(OutputNode::failure(
                    location,
                    instance_path,
                    instance,
                    ValidationErrorKind::Required {
                        property: json!(&**name),
                    },
                ));
            }
        }
    }
    if children.is_empty() {
        OutputNode::success(location, instance_path, None)
    } else {
        OutputNode::invalid_children(location, instance_path, children)
    }
}

pub(crate) fn dependent_schemas(
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
    let mut valid = true;
    for (trigger, subschema) in entries {
        if !object.contains_key(&**trigger) {
            continue;
        }
        let child_location = location.join(&**trigger);
        let result = engine::evaluate(subschema, instance, &child_location, instance_path, ctx);
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

pub(crate) fn min_items(
    limit: u64,
    instance: &Value,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
) -> KeywordEvaluation {
    let Value::Array(array) = instance else {
        return OutputNode::ignored(location, instance_path);
    };
    if (array.len() as u64) < limit {
        OutputNode::failure(
            location,
            instance_path,
            instance,
            ValidationErrorKind::MinItems { limit },
        )
    } else {
        OutputNode::success(location, instance_path, None)
    }
}

pub(crate) fn max_items(
    limit: u64,
    instance: &Value,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
) -> KeywordEvaluation {
    let Value::Array(array) = instance else {
        return OutputNode::ignored(location, instance_path);
    };
    if (array.len() as u64) > limit {
        OutputNode::failure(
            location,
            instance_path,
            instance,
            ValidationErrorKind::MaxItems { limit },
        )
    } else {
        OutputNode::success(location, instance_path, None)
    }
}

pub(crate) fn unique_items(
    instance: &Value,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
) -> KeywordEvaluation {
    let Value::Array(array) = instance else {
        return OutputNode::ignored(location, instance_path);
    };
    if let Some((first, second)) = first_duplicate(array) {
        OutputNode::failure(
            location,
            instance_path,
            instance,
            ValidationErrorKind::UniqueItems { first, second },
        )
    } else {
        OutputNode::success(location, instance_path, None)
    }
}

/// The earliest pair of equal items, honouring numeric equality.
fn first_duplicate(array: &[Value]) -> Option<(usize, usize)> {
    let mut by_fingerprint: AHashMap<u64, Vec<usize>> = AHashMap::with_capacity(array.len());
    let mut best: Option<(usize, usize)> = None;
    for (idx, item) in array.iter().enumerate() {
        let candidates = by_fingerprint
            .entry(equality::fingerprint(item))
            .or_default();
        for &earlier in candidates.iter() {
            if equality::equal(&array[earlier], item) {
                match best {
                    Some((_, second)) if second <= idx => {}
                    _ => best = Some((earlier, idx)),
                }
                break;
            }
        }
        candidates.push(idx);
    }
    best
}

pub(crate) fn min_properties(
    limit: u64,
    instance: &Value,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
) -> KeywordEvaluation {
    let Value::Object(object) = instance else {
        return OutputNode::ignored(location, instance_path);
    };
    if (object.len() as u64) < limit {
        OutputNode::failure(
            location,
            instance_path,
            instance,
            ValidationErrorKind::MinProperties { limit },
        )
    } else {
        OutputNode::success(location, instance_path, None)
    }
}

pub(crate) fn max_properties(
    limit: u64,
    instance: &Value,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
) -> KeywordEvaluation {
    let Value::Object(object) = instance else {
        return OutputNode::ignored(location, instance_path);
    };
    if (object.len() as u64) > limit {
        OutputNode::failure(
            location,
            instance_path,
            instance,
            ValidationErrorKind::MaxProperties { limit },
        )
    } else {
        OutputNode::success(location, instance_path, None)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test]
    fn required_reports_each_missing_property() {
        let schema = json!({"required": ["foo", "bar"]});
        let validator = crate::validator_for(&schema).expect("Invalid schema");
        let errors = validator.iter_errors(&json!({})).collect::<Vec<_>>();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].to_string(), r#""foo" is a required property"#);
        assert_eq!(errors[1].to_string(), r#""bar" is a required property"#);
    }

    #[test_case(&json!({"bar": 1, "foo": 2}), true)]
    #[test_case(&json!({"bar": 1}), false)]
    #[test_case(&json!({"other": 1}), true; "absent trigger")]
    fn dependencies_array_form(instance: &Value, expected: bool) {
        let schema = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "dependencies": {"bar": ["foo"]}
        });
        assert_eq!(crate::is_valid(&schema, instance), expected);
    }

    #[test]
    fn dependencies_schema_form_applies_to_the_whole_object() {
        let schema = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "dependencies": {"credit_card": {"required": ["billing_address"]}}
        });
        assert!(crate::is_valid(
            &schema,
            &json!({"credit_card": "1234", "billing_address": "x"})
        ));
        assert!(!crate::is_valid(&schema, &json!({"credit_card": "1234"})));
    }

    #[test]
    fn dependent_keywords_split_the_two_forms() {
        let schema = json!({
            "dependentRequired": {"a": ["b"]},
            "dependentSchemas": {"c": {"minProperties": 2}}
        });
        assert!(crate::is_valid(&schema, &json!({"a": 1, "b": 2})));
        assert!(!crate::is_valid(&schema, &json!({"a": 1})));
        assert!(crate::is_valid(&schema, &json!({"c": 1, "d": 2})));
        assert!(!crate::is_valid(&schema, &json!({"c": 1})));
    }

    #[test_case(&json!([1, 2, 3]), true)]
    #[test_case(&json!([1, 1.0, 2]), false; "numeric duplicates")]
    #[test_case(&json!([{"a": 1}, {"a": 1.0}]), false; "nested numeric duplicates")]
    #[test_case(&json!([[1], [2]]), true)]
    fn unique_items_uses_numeric_equality(instance: &Value, expected: bool) {
        let schema = json!({"uniqueItems": true});
        assert_eq!(crate::is_valid(&schema, instance), expected);
    }

    #[test]
    fn unique_items_reports_the_first_colliding_pair() {
        let schema = json!({"uniqueItems": true});
        let validator = crate::validator_for(&schema).expect("Invalid schema");
        let errors = validator.iter_errors(&json!([1, 1.0, 2])).collect::<Vec<_>>();
        assert_eq!(
            errors[0].to_string(),
            "[1,1.0,2] has non-unique elements (items at indices 0 and 1 are equal)"
        );
    }

    #[test]
    fn unique_items_false_is_inert() {
        let schema = json!({"uniqueItems": false});
        assert!(crate::is_valid(&schema, &json!([1, 1])));
    }
}
