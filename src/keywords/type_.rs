//! The `type` keyword.
use serde_json::Value;

use crate::{
    engine::KeywordEvaluation,
    error::{TypeKind, ValidationErrorKind},
    keywords::TypeSpec,
    output::OutputNode,
    paths::{LazyLocation, SchemaLocation},
    primitive_type::{instance_type, PrimitiveType},
};

pub(crate) fn type_(
    spec: &TypeSpec,
    instance: &Value,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
) -> KeywordEvaluation {
    let actual = instance_type(instance);
    match spec {
        TypeSpec::Single(expected) => {
            if matches(*expected, actual, instance) {
                OutputNode::success(location, instance_path, None)
            } else {
                OutputNode::failure(
                    location,
                    instance_path,
                    instance,
                    ValidationErrorKind::Type {
                        kind: TypeKind::Single(*expected),
                    },
                )
            }
        }
        TypeSpec::Multiple(expected) => {
            if expected
                .iter()
                .any(|primitive_type| matches(primitive_type, actual, instance))
            {
                OutputNode::success(location, instance_path, None)
            } else {
                OutputNode::failure(
                    location,
                    instance_path,
                    instance,
                    ValidationErrorKind::Type {
                        kind: TypeKind::Multiple(*expected),
                    },
                )
            }
        }
    }
}

fn matches(expected: PrimitiveType, actual: PrimitiveType, instance: &Value) -> bool {
    match expected {
        PrimitiveType::Number => instance.is_number(),
        // `1.0` counts as an integer, `1.5` does not.
        PrimitiveType::Integer => actual == PrimitiveType::Integer,
        _ => expected == actual,
    }
}
