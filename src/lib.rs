//! JSON Schema validation for Rust across drafts 6, 7, 2019-09 and 2020-12.
//!
//! The validator builds an immutable schema tree out of keyword nodes,
//! resolves `$ref`/`$dynamicRef`/`$recursiveRef` through a URI-keyed
//! [`Registry`], and evaluates instances with full annotation flow, so
//! `unevaluatedItems`/`unevaluatedProperties` see what their siblings and
//! consolidated applicators covered.
//!
//! # Basic usage
//!
//! ```rust
//! use serde_json::json;
//!
//! let schema = json!({"type": "integer", "minimum": 0});
//! let validator = conforma::validator_for(&schema).expect("A valid schema");
//!
//! assert!(validator.is_valid(&json!(3)));
//! assert!(!validator.is_valid(&json!(-1)));
//!
//! let errors: Vec<_> = validator.iter_errors(&json!(-1)).collect();
//! assert_eq!(errors[0].to_string(), "-1 is less than the minimum of 0");
//! ```
//!
//! # Output formats
//!
//! [`Validator::apply`] defers the work until you pick one of the standard
//! output formats: `flag` (a boolean, allowed to short-circuit), `basic`
//! (a flat list of errors or annotations), `detailed` and `verbose`
//! (result trees).
//!
//! ```rust
//! use serde_json::json;
//!
//! let schema = json!({"properties": {"a": {"type": "string"}}});
//! let validator = conforma::validator_for(&schema).expect("A valid schema");
//! let output = validator.apply(&json!({"a": 1})).basic();
//! assert!(!output.is_valid());
//! ```
//!
//! # Multiple documents
//!
//! Schemas referencing each other by URI live in a [`Registry`], which is
//! read-only after loading and can be shared by concurrent validations.
//!
//! ```rust
//! use serde_json::json;
//!
//! let mut registry = conforma::Registry::new();
//! registry
//!     .register(&json!({"$id": "https://example.com/item", "type": "integer"}), None)
//!     .expect("A valid schema");
//! registry
//!     .register(
//!         &json!({"$id": "https://example.com/list", "items": {"$ref": "item"}}),
//!         None,
//!     )
//!     .expect("A valid schema");
//! let validator = conforma::Validator::from_registry(
//!     registry,
//!     "https://example.com/list",
//!     conforma::ValidationOptions::default(),
//! )
//! .expect("A registered URI");
//! assert!(validator.is_valid(&json!([1, 2])));
//! assert!(!validator.is_valid(&json!([1, "x"])));
//! ```
mod builder;
mod content;
mod context;
mod drafts;
mod engine;
mod equality;
mod error;
mod formats;
mod keywords;
mod options;
mod output;
mod paths;
mod primitive_type;
mod registry;
mod resolver;
mod schema;
pub mod uri;
mod vocabularies;

use std::sync::Arc;

use serde_json::Value;

use crate::{
    context::EvalContext,
    paths::{LazyLocation, SchemaLocation},
    registry::ResourceEntry,
};

pub use drafts::Draft;
pub use error::{
    BuildError, ResolveError, TypeKind, UriError, ValidationError, ValidationErrorKind,
};
pub use formats::register_format;
pub use options::{ContentDecoder, ValidationOptions};
pub use output::{BasicOutput, ErrorDescription, Output, OutputFormat, OutputUnit};
pub use paths::{Location, LocationSegment};
pub use primitive_type::{PrimitiveType, PrimitiveTypesBitMap};
pub use registry::Registry;
pub use vocabularies::{Vocabulary, VocabularySet};

/// A compiled schema, ready to validate instances.
#[derive(Debug)]
pub struct Validator {
    registry: Registry,
    root_uri: fluent_uri::Uri<String>,
    options: ValidationOptions,
}

impl Validator {
    pub(crate) fn with_options(
        schema: &Value,
        options: ValidationOptions,
    ) -> Result<Validator, BuildError> {
        let mut registry = match options.validating_as {
            Some(draft) => Registry::with_draft(draft),
            None => Registry::new(),
        };
        let root_uri = registry.register(schema, options.default_base_uri.as_deref())?;
        Ok(Validator {
            registry,
            root_uri,
            options,
        })
    }

    /// Validate against a schema already stored in a registry.
    ///
    /// # Errors
    ///
    /// When no schema is registered under `uri`.
    pub fn from_registry(
        registry: Registry,
        uri: &str,
        options: ValidationOptions,
    ) -> Result<Validator, BuildError> {
        let root_uri = registry
            .entry_by_str(uri)
            .map(|entry| entry.uri.clone())
            .ok_or_else(|| BuildError::unknown_uri(uri))?;
        Ok(Validator {
            registry,
            root_uri,
            options,
        })
    }

    fn root_entry(&self) -> &Arc<ResourceEntry> {
        self.registry
            .entry(&self.root_uri)
            .expect("The root URI was registered at construction")
    }

    fn run(&self, instance: &Value, flag_mode: bool) -> engine::Evaluation {
        let entry = self.root_entry();
        let schema = entry
            .schema()
            .expect("A registered resource always resolves within its document");
        let mut ctx = EvalContext::new(&self.registry, &self.options, Arc::clone(entry), flag_mode);
        let location = SchemaLocation {
            relative: Location::default(),
            resource: Location::from_pointer(&entry.location),
            base: Some(Arc::new(entry.uri.clone())),
        };
        engine::evaluate(schema, instance, &location, &LazyLocation::new(), &mut ctx)
    }

    /// Whether the instance conforms, with short-circuiting allowed.
    #[must_use]
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.run(instance, true).valid()
    }

    /// Validate and return the first error, in keyword execution order.
    ///
    /// # Errors
    ///
    /// On the first validation failure.
    pub fn validate(&self, instance: &Value) -> Result<(), ValidationError> {
        let mut errors = Vec::new();
        self.run(instance, false).node.collect_errors(&mut errors);
        match errors.into_iter().next() {
            None => Ok(()),
            Some(error) => Err(error),
        }
    }

    /// Iterate over every validation error, in keyword execution order.
    pub fn iter_errors(&self, instance: &Value) -> impl Iterator<Item = ValidationError> {
        let mut errors = Vec::new();
        self.run(instance, false).node.collect_errors(&mut errors);
        errors.into_iter()
    }

    /// Apply the schema, deferring the choice of output format.
    #[must_use]
    pub fn apply<'a, 'b>(&'a self, instance: &'b Value) -> Output<'a, 'b> {
        Output::new(self, instance)
    }

    /// Render the result in the configured output format.
    #[must_use]
    pub fn evaluate(&self, instance: &Value) -> Value {
        self.apply(instance).render(self.options.output_format)
    }

    pub(crate) fn evaluate_full(&self, instance: &Value) -> crate::output::OutputNode {
        self.run(instance, false).node
    }
}

/// Validate `instance` against `schema` built with default options.
///
/// # Panics
///
/// Panics on an invalid schema; build a [`Validator`] to handle that case.
#[must_use]
pub fn is_valid(schema: &Value, instance: &Value) -> bool {
    validator_for(schema)
        .expect("Invalid schema")
        .is_valid(instance)
}

/// Build a [`Validator`] with default options.
///
/// # Errors
///
/// On an invalid schema.
pub fn validator_for(schema: &Value) -> Result<Validator, BuildError> {
    options().build(schema)
}

/// Start configuring a [`Validator`].
#[must_use]
pub fn options() -> ValidationOptions {
    ValidationOptions::default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    #[test]
    fn boolean_schemas() {
        for instance in [json!(null), json!(0), json!("x"), json!([1]), json!({})] {
            assert!(crate::is_valid(&json!(true), &instance));
            assert!(!crate::is_valid(&json!(false), &instance));
        }
        let validator = crate::validator_for(&json!(false)).expect("Invalid schema");
        let errors = validator.iter_errors(&json!(null)).collect::<Vec<_>>();
        assert_eq!(errors[0].to_string(), "False schema does not allow null");
    }

    #[test]
    fn evaluate_renders_the_configured_format() {
        let schema = json!({"type": "integer"});
        let validator = crate::options()
            .output_format(crate::OutputFormat::Basic)
            .build(&schema)
            .expect("Invalid schema");
        let rendered = validator.evaluate(&json!("x"));
        assert_eq!(rendered["valid"], json!(false));
        assert!(rendered["errors"].is_array());
    }

    #[test]
    fn results_are_deterministic() {
        let schema = json!({
            "type": "object",
            "properties": {"a": {"type": "string"}, "b": {"type": "integer"}},
            "patternProperties": {"^x": {"minimum": 0}},
            "required": ["a", "b"],
            "unevaluatedProperties": false
        });
        let instance = json!({"a": 1, "x1": -1, "extra": true});
        let validator = crate::options()
            .output_format(crate::OutputFormat::Verbose)
            .build(&schema)
            .expect("Invalid schema");
        let first = validator.evaluate(&instance);
        for _ in 0..3 {
            assert_eq!(validator.evaluate(&instance), first);
        }
    }
}
