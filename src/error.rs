//! Error types for schema loading, reference resolution and validation.
use core::fmt;

use fluent_uri::error::{ParseError, ResolveError as UriResolveError};
use serde_json::Value;

use crate::{
    paths::Location,
    primitive_type::{PrimitiveType, PrimitiveTypesBitMap},
};

/// An error occurring while parsing or manipulating a URI.
#[derive(Debug)]
pub struct UriError {
    input: String,
    kind: UriErrorKind,
}

#[derive(Debug)]
enum UriErrorKind {
    Parse(ParseError),
    Resolve(UriResolveError),
}

impl UriError {
    pub(crate) fn parse(input: impl Into<String>, error: ParseError) -> Self {
        Self {
            input: input.into(),
            kind: UriErrorKind::Parse(error),
        }
    }

    pub(crate) fn resolve(input: impl Into<String>, error: UriResolveError) -> Self {
        Self {
            input: input.into(),
            kind: UriErrorKind::Resolve(error),
        }
    }
}

impl fmt::Display for UriError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            UriErrorKind::Parse(error) => {
                write!(f, "Invalid URI reference '{}': {error}", self.input)
            }
            UriErrorKind::Resolve(error) => {
                write!(f, "Cannot resolve URI reference '{}': {error}", self.input)
            }
        }
    }
}

impl std::error::Error for UriError {}

/// Errors aborting a schema load.
#[derive(Debug)]
pub enum BuildError {
    /// An unknown `$schema` value was encountered.
    UnknownSpecification { specification: String },
    /// A `$id` value that is not a fragmentless URI-reference.
    InvalidId { id: String },
    /// An `$anchor`/`$dynamicAnchor` name that does not match the anchor form.
    InvalidAnchor { anchor: String },
    /// Registration under an absolute URI that is already taken.
    DuplicateUri { uri: String },
    /// A keyword whose value has the wrong shape for the active draft.
    InvalidKeyword { keyword: String, detail: String },
    /// A `pattern`/`patternProperties` regular expression failed to compile.
    InvalidRegex { pattern: String, error: String },
    /// A URI handed to the registry does not identify any stored schema.
    UnknownUri { uri: String },
    /// An error occurred while parsing or manipulating a URI.
    InvalidUri(UriError),
}

impl BuildError {
    pub(crate) fn unknown_specification(specification: impl Into<String>) -> Self {
        BuildError::UnknownSpecification {
            specification: specification.into(),
        }
    }

    pub(crate) fn invalid_id(id: impl Into<String>) -> Self {
        BuildError::InvalidId { id: id.into() }
    }

    pub(crate) fn invalid_anchor(anchor: impl Into<String>) -> Self {
        BuildError::InvalidAnchor {
            anchor: anchor.into(),
        }
    }

    pub(crate) fn duplicate_uri(uri: impl Into<String>) -> Self {
        BuildError::DuplicateUri { uri: uri.into() }
    }

    pub(crate) fn invalid_keyword(keyword: impl Into<String>, detail: impl Into<String>) -> Self {
        BuildError::InvalidKeyword {
            keyword: keyword.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn invalid_regex(pattern: impl Into<String>, error: impl fmt::Display) -> Self {
        BuildError::InvalidRegex {
            pattern: pattern.into(),
            error: error.to_string(),
        }
    }

    pub(crate) fn unknown_uri(uri: impl Into<String>) -> Self {
        BuildError::UnknownUri { uri: uri.into() }
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::UnknownSpecification { specification } => {
                write!(f, "Unknown specification: {specification}")
            }
            BuildError::InvalidId { id } => write!(f, "Invalid $id: '{id}'"),
            BuildError::InvalidAnchor { anchor } => write!(f, "Invalid anchor name: '{anchor}'"),
            BuildError::DuplicateUri { uri } => {
                write!(f, "A schema is already registered under '{uri}'")
            }
            BuildError::InvalidKeyword { keyword, detail } => {
                write!(f, "Invalid '{keyword}' value: {detail}")
            }
            BuildError::InvalidRegex { pattern, error } => {
                write!(f, "Invalid regular expression '{pattern}': {error}")
            }
            BuildError::UnknownUri { uri } => {
                write!(f, "No schema is registered under '{uri}'")
            }
            BuildError::InvalidUri(error) => error.fmt(f),
        }
    }
}

impl std::error::Error for BuildError {}

impl From<UriError> for BuildError {
    fn from(error: UriError) -> Self {
        BuildError::InvalidUri(error)
    }
}

/// Errors produced while resolving a reference against the registry.
///
/// These never abort validation; the keyword that followed the reference
/// reports them as an ordinary validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The target URI is not present in the registry.
    UnresolvedUri { uri: String },
    /// The target resource has no anchor with this name.
    UnresolvedAnchor { uri: String, anchor: String },
    /// The fragment is neither an anchor name nor a parseable JSON Pointer.
    UnparseableFragment { fragment: String },
    /// The pointer does not lead to a schema within the target resource.
    PointerToNowhere { pointer: String },
    /// The reference is not a valid URI-reference.
    InvalidReference { reference: String },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::UnresolvedUri { uri } => {
                write!(f, "Resource '{uri}' is not present in the registry")
            }
            ResolveError::UnresolvedAnchor { uri, anchor } => {
                write!(f, "Anchor '{anchor}' does not exist within '{uri}'")
            }
            ResolveError::UnparseableFragment { fragment } => {
                write!(f, "Fragment '{fragment}' is not a valid JSON Pointer")
            }
            ResolveError::PointerToNowhere { pointer } => {
                write!(f, "Pointer '{pointer}' does not exist")
            }
            ResolveError::InvalidReference { reference } => {
                write!(f, "Invalid reference: {reference}")
            }
        }
    }
}

impl std::error::Error for ResolveError {}

/// An error that can occur during validation.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Value that failed validation.
    pub instance: Value,
    /// Type of validation error.
    pub kind: ValidationErrorKind,
    /// Path to the value that failed validation.
    pub instance_path: Location,
    /// Path to the JSON Schema keyword that failed validation.
    pub schema_path: Location,
}

/// Kinds of errors that may happen during validation.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub enum ValidationErrorKind {
    /// The input array contains more items than the positional schemas allow.
    AdditionalItems { limit: usize },
    /// Unexpected properties.
    AdditionalProperties { unexpected: Vec<String> },
    /// The input value is not valid under any of the schemas listed in `anyOf`.
    AnyOf,
    /// A regular expression exceeded the engine's backtracking budget.
    BacktrackLimitExceeded { error: String },
    /// The input value doesn't match the expected constant.
    Constant { expected_value: Value },
    /// The input array doesn't contain items conforming to the `contains` schema.
    Contains,
    /// The input value doesn't match any of the specified options.
    Enum { options: Value },
    /// Value is too large.
    ExclusiveMaximum { limit: Value },
    /// Value is too small.
    ExclusiveMinimum { limit: Value },
    /// Everything is invalid for the `false` schema.
    FalseSchema,
    /// The input doesn't match the specified format.
    Format { format: String },
    /// Too few items matched the `contains` schema.
    MinContains { limit: u64, found: usize },
    /// Too many items matched the `contains` schema.
    MaxContains { limit: u64, found: usize },
    /// Evaluation exceeded the configured depth bound.
    MaxDepthReached { limit: usize },
    /// Too many items in an array.
    MaxItems { limit: u64 },
    /// Value is too large.
    Maximum { limit: Value },
    /// String is too long.
    MaxLength { limit: u64 },
    /// Too many properties in an object.
    MaxProperties { limit: u64 },
    /// Too few items in an array.
    MinItems { limit: u64 },
    /// Value is too small.
    Minimum { limit: Value },
    /// String is too short.
    MinLength { limit: u64 },
    /// Not enough properties in an object.
    MinProperties { limit: u64 },
    /// The number is not a multiple of the divisor.
    MultipleOf { multiple_of: Value },
    /// The negated schema accepted the input.
    Not,
    /// The input is valid under more than one `oneOf` member.
    OneOfMultipleValid,
    /// The input is not valid under any `oneOf` member.
    OneOfNotValid,
    /// The input doesn't match the pattern.
    Pattern { pattern: String },
    /// An object property name failed the `propertyNames` schema.
    PropertyNames { property: String },
    /// A reference was revisited for the same instance value.
    RecursiveReference { reference: String },
    /// Resolving a reference failed.
    Referencing(ResolveError),
    /// A required property is missing.
    Required { property: Value },
    /// The input doesn't match one or multiple required types.
    Type { kind: TypeKind },
    /// Unexpected items.
    UnevaluatedItems { unexpected: Vec<usize> },
    /// Unexpected properties.
    UnevaluatedProperties { unexpected: Vec<String> },
    /// The input array has equal elements at the named indices.
    UniqueItems { first: usize, second: usize },
}

#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub enum TypeKind {
    Single(PrimitiveType),
    Multiple(PrimitiveTypesBitMap),
}

impl ValidationError {
    pub(crate) fn new(
        kind: ValidationErrorKind,
        instance: &Value,
        instance_path: Location,
        schema_path: Location,
    ) -> Self {
        Self {
            instance: instance.clone(),
            kind,
            instance_path,
            schema_path,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValidationErrorKind::AdditionalItems { limit } => {
                let extras: Vec<_> = self
                    .instance
                    .as_array()
                    .into_iter()
                    .flatten()
                    .skip(*limit)
                    .collect();
                let verb = if extras.len() == 1 { "was" } else { "were" };
                write!(
                    f,
                    "Additional items are not allowed ({} {verb} unexpected)",
                    extras
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<String>>()
                        .join(", ")
                )
            }
            ValidationErrorKind::AdditionalProperties { unexpected } => {
                let verb = if unexpected.len() == 1 { "was" } else { "were" };
                write!(
                    f,
                    "Additional properties are not allowed ({} {verb} unexpected)",
                    unexpected
                        .iter()
                        .map(|x| format!("'{x}'"))
                        .collect::<Vec<String>>()
                        .join(", ")
                )
            }
            ValidationErrorKind::AnyOf => write!(
                f,
                "{} is not valid under any of the schemas listed in the 'anyOf' keyword",
                self.instance
            ),
            ValidationErrorKind::BacktrackLimitExceeded { error } => f.write_str(error),
            ValidationErrorKind::Constant { expected_value } => {
                write!(f, "{expected_value} was expected")
            }
            ValidationErrorKind::Contains => write!(
                f,
                "None of {} are valid under the given schema",
                self.instance
            ),
            ValidationErrorKind::Enum { options } => {
                write!(f, "{} is not one of {options}", self.instance)
            }
            ValidationErrorKind::ExclusiveMaximum { limit } => write!(
                f,
                "{} is greater than or equal to the maximum of {limit}",
                self.instance
            ),
            ValidationErrorKind::ExclusiveMinimum { limit } => write!(
                f,
                "{} is less than or equal to the minimum of {limit}",
                self.instance
            ),
            ValidationErrorKind::FalseSchema => {
                write!(f, "False schema does not allow {}", self.instance)
            }
            ValidationErrorKind::Format { format } => {
                write!(f, r#"{} is not a "{format}""#, self.instance)
            }
            ValidationErrorKind::MinContains { limit, found } => write!(
                f,
                "{} contains {found} matching item{}, expected at least {limit}",
                self.instance,
                if *found == 1 { "" } else { "s" }
            ),
            ValidationErrorKind::MaxContains { limit, found } => write!(
                f,
                "{} contains {found} matching item{}, expected at most {limit}",
                self.instance,
                if *found == 1 { "" } else { "s" }
            ),
            ValidationErrorKind::MaxDepthReached { limit } => {
                write!(f, "Evaluation exceeded the depth limit of {limit}")
            }
            ValidationErrorKind::Maximum { limit } => write!(
                f,
                "{} is greater than the maximum of {limit}",
                self.instance
            ),
            ValidationErrorKind::Minimum { limit } => {
                write!(f, "{} is less than the minimum of {limit}", self.instance)
            }
            ValidationErrorKind::MaxLength { limit } => write!(
                f,
                "{} is longer than {limit} character{}",
                self.instance,
                if *limit == 1 { "" } else { "s" }
            ),
            ValidationErrorKind::MinLength { limit } => write!(
                f,
                "{} is shorter than {limit} character{}",
                self.instance,
                if *limit == 1 { "" } else { "s" }
            ),
            ValidationErrorKind::MaxItems { limit } => write!(
                f,
                "{} has more than {limit} item{}",
                self.instance,
                if *limit == 1 { "" } else { "s" }
            ),
            ValidationErrorKind::MinItems { limit } => write!(
                f,
                "{} has less than {limit} item{}",
                self.instance,
                if *limit == 1 { "" } else { "s" }
            ),
            ValidationErrorKind::MaxProperties { limit } => write!(
                f,
                "{} has more than {limit} propert{}",
                self.instance,
                if *limit == 1 { "y" } else { "ies" }
            ),
            ValidationErrorKind::MinProperties { limit } => write!(
                f,
                "{} has less than {limit} propert{}",
                self.instance,
                if *limit == 1 { "y" } else { "ies" }
            ),
            ValidationErrorKind::MultipleOf { multiple_of } => {
                write!(f, "{} is not a multiple of {multiple_of}", self.instance)
            }
            ValidationErrorKind::Not => {
                write!(f, "{} is not allowed by the negated schema", self.instance)
            }
            ValidationErrorKind::OneOfMultipleValid => write!(
                f,
                "{} is valid under more than one of the schemas listed in the 'oneOf' keyword",
                self.instance
            ),
            ValidationErrorKind::OneOfNotValid => write!(
                f,
                "{} is not valid under any of the schemas listed in the 'oneOf' keyword",
                self.instance
            ),
            ValidationErrorKind::Pattern { pattern } => {
                write!(f, r#"{} does not match "{pattern}""#, self.instance)
            }
            ValidationErrorKind::PropertyNames { property } => {
                write!(f, "'{property}' is not a valid property name")
            }
            ValidationErrorKind::RecursiveReference { reference } => {
                write!(f, "Recursive reference detected for '{reference}'")
            }
            ValidationErrorKind::Referencing(error) => error.fmt(f),
            ValidationErrorKind::Required { property } => {
                write!(f, "{property} is a required property")
            }
            ValidationErrorKind::Type {
                kind: TypeKind::Single(primitive_type),
            } => write!(f, r#"{} is not of type "{primitive_type}""#, self.instance),
            ValidationErrorKind::Type {
                kind: TypeKind::Multiple(types),
            } => write!(
                f,
                "{} is not of types {}",
                self.instance,
                types
                    .iter()
                    .map(|t| format!(r#""{t}""#))
                    .collect::<Vec<String>>()
                    .join(", ")
            ),
            ValidationErrorKind::UnevaluatedItems { unexpected } => {
                let verb = if unexpected.len() == 1 { "was" } else { "were" };
                write!(
                    f,
                    "Unevaluated items are not allowed ({} {verb} unexpected)",
                    unexpected
                        .iter()
                        .map(|idx| format!("item at index {idx}"))
                        .collect::<Vec<String>>()
                        .join(", ")
                )
            }
            ValidationErrorKind::UnevaluatedProperties { unexpected } => {
                let verb = if unexpected.len() == 1 { "was" } else { "were" };
                write!(
                    f,
                    "Unevaluated properties are not allowed ({} {verb} unexpected)",
                    unexpected
                        .iter()
                        .map(|x| format!("'{x}'"))
                        .collect::<Vec<String>>()
                        .join(", ")
                )
            }
            ValidationErrorKind::UniqueItems { first, second } => write!(
                f,
                "{} has non-unique elements (items at indices {first} and {second} are equal)",
                self.instance
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unique_items_message_names_both_indices() {
        let instance = json!([1, 1.0, 2]);
        let error = ValidationError::new(
            ValidationErrorKind::UniqueItems {
                first: 0,
                second: 1,
            },
            &instance,
            Location::default(),
            Location::default(),
        );
        assert_eq!(
            error.to_string(),
            "[1,1.0,2] has non-unique elements (items at indices 0 and 1 are equal)"
        );
    }

    #[test]
    fn minimum_message_embeds_both_values() {
        let instance = json!(-1);
        let error = ValidationError::new(
            ValidationErrorKind::Minimum { limit: json!(0) },
            &instance,
            Location::default(),
            Location::default(),
        );
        assert_eq!(error.to_string(), "-1 is less than the minimum of 0");
    }
}
