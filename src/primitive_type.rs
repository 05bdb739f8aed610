use core::fmt;
use std::str::FromStr;

use serde_json::Value;

/// The names the `type` keyword can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrimitiveType {
    Array,
    Boolean,
    Integer,
    Null,
    Number,
    Object,
    String,
}

impl FromStr for PrimitiveType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "array" => Ok(PrimitiveType::Array),
            "boolean" => Ok(PrimitiveType::Boolean),
            "integer" => Ok(PrimitiveType::Integer),
            "null" => Ok(PrimitiveType::Null),
            "number" => Ok(PrimitiveType::Number),
            "object" => Ok(PrimitiveType::Object),
            "string" => Ok(PrimitiveType::String),
            _ => Err(()),
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveType::Array => f.write_str("array"),
            PrimitiveType::Boolean => f.write_str("boolean"),
            PrimitiveType::Integer => f.write_str("integer"),
            PrimitiveType::Null => f.write_str("null"),
            PrimitiveType::Number => f.write_str("number"),
            PrimitiveType::Object => f.write_str("object"),
            PrimitiveType::String => f.write_str("string"),
        }
    }
}

const fn bit(primitive_type: PrimitiveType) -> u8 {
    match primitive_type {
        PrimitiveType::Array => 1 << 0,
        PrimitiveType::Boolean => 1 << 1,
        PrimitiveType::Integer => 1 << 2,
        PrimitiveType::Null => 1 << 3,
        PrimitiveType::Number => 1 << 4,
        PrimitiveType::Object => 1 << 5,
        PrimitiveType::String => 1 << 6,
    }
}

/// A compact set of primitive types, as listed by array-form `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveTypesBitMap {
    inner: u8,
}

impl PrimitiveTypesBitMap {
    pub(crate) const fn new() -> Self {
        Self { inner: 0 }
    }

    #[must_use]
    pub(crate) const fn add(mut self, primitive_type: PrimitiveType) -> Self {
        self.inner |= bit(primitive_type);
        self
    }

    #[must_use]
    pub fn contains(&self, primitive_type: PrimitiveType) -> bool {
        self.inner & bit(primitive_type) != 0
            // Every integer is also a number.
            || (primitive_type == PrimitiveType::Integer
                && self.inner & bit(PrimitiveType::Number) != 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = PrimitiveType> + '_ {
        [
            PrimitiveType::Array,
            PrimitiveType::Boolean,
            PrimitiveType::Integer,
            PrimitiveType::Null,
            PrimitiveType::Number,
            PrimitiveType::Object,
            PrimitiveType::String,
        ]
        .into_iter()
        .filter(|primitive_type| self.inner & bit(*primitive_type) != 0)
    }
}

impl From<PrimitiveType> for PrimitiveTypesBitMap {
    fn from(primitive_type: PrimitiveType) -> Self {
        Self::new().add(primitive_type)
    }
}

/// The primitive type of a JSON value, with integral numbers reported as
/// integers.
pub(crate) fn instance_type(instance: &Value) -> PrimitiveType {
    match instance {
        Value::Null => PrimitiveType::Null,
        Value::Bool(_) => PrimitiveType::Boolean,
        Value::Number(number) => {
            if number.is_u64() || number.is_i64() || number.as_f64().is_some_and(|f| f.fract() == 0.0)
            {
                PrimitiveType::Integer
            } else {
                PrimitiveType::Number
            }
        }
        Value::String(_) => PrimitiveType::String,
        Value::Array(_) => PrimitiveType::Array,
        Value::Object(_) => PrimitiveType::Object,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test]
    fn integer_is_a_number() {
        let types = PrimitiveTypesBitMap::from(PrimitiveType::Number);
        assert!(types.contains(PrimitiveType::Integer));
        assert!(!types.contains(PrimitiveType::String));
    }

    #[test_case(&json!(1), PrimitiveType::Integer)]
    #[test_case(&json!(1.0), PrimitiveType::Integer; "integral float")]
    #[test_case(&json!(1.5), PrimitiveType::Number)]
    #[test_case(&json!("x"), PrimitiveType::String)]
    #[test_case(&json!(null), PrimitiveType::Null)]
    #[test_case(&json!([1]), PrimitiveType::Array)]
    #[test_case(&json!({}), PrimitiveType::Object)]
    fn instance_types(instance: &serde_json::Value, expected: PrimitiveType) {
        assert_eq!(instance_type(instance), expected);
    }
}
