//! Configuration for building a [`Validator`].
use core::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::{drafts::Draft, error::BuildError, output::OutputFormat, Validator};

/// Decodes a string instance so `contentSchema` can validate the decoded
/// value: `(media_type, encoding, content) -> Option<decoded>`. Returning
/// `None` leaves `contentSchema` annotation-only for that instance.
pub type ContentDecoder = dyn Fn(&str, &str, &str) -> Option<Value> + Send + Sync;

/// Full configuration to guide schema validation.
///
/// Using a `ValidationOptions` instance you can make a [`Validator`]
/// with adjusted defaults:
///
/// ```rust
/// use serde_json::json;
///
/// let schema = json!({"format": "email"});
/// let validator = conforma::options()
///     .require_format_validation(true)
///     .build(&schema)
///     .expect("A valid schema");
/// assert!(!validator.is_valid(&json!("not an email")));
/// ```
#[derive(Clone)]
pub struct ValidationOptions {
    pub(crate) output_format: OutputFormat,
    pub(crate) validating_as: Option<Draft>,
    pub(crate) log_indent_level: usize,
    pub(crate) require_format_validation: bool,
    pub(crate) default_base_uri: Option<String>,
    pub(crate) max_depth: usize,
    pub(crate) content_decoder: Option<Arc<ContentDecoder>>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        ValidationOptions {
            output_format: OutputFormat::Flag,
            validating_as: None,
            log_indent_level: 0,
            require_format_validation: false,
            default_base_uri: None,
            max_depth: 128,
            content_decoder: None,
        }
    }
}

impl fmt::Debug for ValidationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationOptions")
            .field("output_format", &self.output_format)
            .field("validating_as", &self.validating_as)
            .field("log_indent_level", &self.log_indent_level)
            .field("require_format_validation", &self.require_format_validation)
            .field("default_base_uri", &self.default_base_uri)
            .field("max_depth", &self.max_depth)
            .field(
                "content_decoder",
                &self.content_decoder.as_ref().map(|_| "<decoder>"),
            )
            .finish()
    }
}

impl ValidationOptions {
    /// The output format rendered by [`Validator::evaluate`].
    #[must_use]
    pub fn output_format(mut self, output_format: OutputFormat) -> Self {
        self.output_format = output_format;
        self
    }

    /// Validate as the given draft when a schema has no `$schema` keyword.
    #[must_use]
    pub fn with_draft(mut self, draft: Draft) -> Self {
        self.validating_as = Some(draft);
        self
    }

    /// The starting depth reported in evaluation log events.
    #[must_use]
    pub fn log_indent_level(mut self, level: usize) -> Self {
        self.log_indent_level = level;
        self
    }

    /// Validate `format` even when the active vocabularies only treat it as
    /// an annotation.
    #[must_use]
    pub fn require_format_validation(mut self, yes: bool) -> Self {
        self.require_format_validation = yes;
        self
    }

    /// The base URI assumed for schemas registered without an identifier.
    #[must_use]
    pub fn default_base_uri(mut self, uri: impl Into<String>) -> Self {
        self.default_base_uri = Some(uri.into());
        self
    }

    /// Bound evaluation depth; exceeding it is a validation failure.
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Install the content decoder used by `contentSchema`.
    #[must_use]
    pub fn content_decoder(
        mut self,
        decoder: impl Fn(&str, &str, &str) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        self.content_decoder = Some(Arc::new(decoder));
        self
    }

    /// Build a [`Validator`] for the given schema with these options.
    ///
    /// # Errors
    ///
    /// On an invalid schema.
    pub fn build(&self, schema: &Value) -> Result<Validator, BuildError> {
        Validator::with_options(schema, self.clone())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    #[test]
    fn default_base_uri_anchors_relative_references() {
        let schema = json!({
            "$id": "folder/root.json",
            "$defs": {"name": {"$id": "name.json", "type": "string"}},
            "$ref": "name.json"
        });
        let validator = crate::options()
            .default_base_uri("https://example.com/")
            .build(&schema)
            .expect("Invalid schema");
        assert!(validator.is_valid(&json!("x")));
        assert!(!validator.is_valid(&json!(1)));
    }

    #[test]
    fn max_depth_turns_runaway_nesting_into_a_failure() {
        // Unbounded instance recursion through a self reference is caught by
        // the visited set; the depth bound catches deeply nested instances.
        let schema = json!({
            "properties": {"next": {"$ref": "#"}}
        });
        let mut instance = json!({});
        for _ in 0..64 {
            instance = json!({"next": instance});
        }
        let validator = crate::options()
            .max_depth(16)
            .build(&schema)
            .expect("Invalid schema");
        assert!(!validator.is_valid(&instance));
    }
}
