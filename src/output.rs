//! Output formats from the JSON Schema specification: `flag`, `basic`,
//! `detailed` and `verbose`.
use core::fmt;

use serde::ser::SerializeMap;
use serde_json::Value;

use crate::{
    error::{ValidationError, ValidationErrorKind},
    paths::{LazyLocation, Location, SchemaLocation},
    Validator,
};

/// The standard output shapes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// A single boolean.
    #[default]
    Flag,
    /// A flat list of errors or annotations.
    Basic,
    /// A pruned result tree.
    Detailed,
    /// The complete result tree.
    Verbose,
}

/// One evaluated schema or keyword location in the result tree.
///
/// The engine produces one node per executed keyword and per evaluated
/// subschema; renderers flatten or prune this tree per output format.
#[derive(Debug, Clone)]
pub(crate) struct OutputNode {
    pub(crate) valid: bool,
    /// Set when a keyword did not apply to the instance's kind and reported
    /// success without looking at it.
    pub(crate) ignored: bool,
    pub(crate) keyword_location: Location,
    pub(crate) absolute_keyword_location: Option<String>,
    pub(crate) instance_location: Location,
    pub(crate) error: Option<Box<ValidationError>>,
    pub(crate) annotation: Option<Value>,
    pub(crate) children: Vec<OutputNode>,
}

impl OutputNode {
    fn new(location: &SchemaLocation, instance_path: &LazyLocation) -> Self {
        OutputNode {
            valid: true,
            ignored: false,
            keyword_location: location.relative.clone(),
            absolute_keyword_location: location.absolute(),
            instance_location: Location::from(instance_path),
            error: None,
            annotation: None,
            children: Vec::new(),
        }
    }

    pub(crate) fn success(
        location: &SchemaLocation,
        instance_path: &LazyLocation,
        annotation: Option<Value>,
    ) -> Self {
        let mut node = Self::new(location, instance_path);
        node.annotation = annotation;
        node
    }

    pub(crate) fn annotation(
        location: &SchemaLocation,
        instance_path: &LazyLocation,
        value: Value,
    ) -> Self {
        Self::success(location, instance_path, Some(value))
    }

    pub(crate) fn ignored(location: &SchemaLocation, instance_path: &LazyLocation) -> Self {
        let mut node = Self::new(location, instance_path);
        node.ignored = true;
        node
    }

    pub(crate) fn failure(
        location: &SchemaLocation,
        instance_path: &LazyLocation,
        instance: &Value,
        kind: ValidationErrorKind,
    ) -> Self {
        let mut node = Self::new(location, instance_path);
        node.valid = false;
        node.error = Some(Box::new(ValidationError::new(
            kind,
            instance,
            node.instance_location.clone(),
            node.keyword_location.clone(),
        )));
        node
    }

    /// An invalid node whose failure is carried entirely by its children.
    pub(crate) fn invalid_children(
        location: &SchemaLocation,
        instance_path: &LazyLocation,
        children: Vec<OutputNode>,
    ) -> Self {
        let mut node = Self::new(location, instance_path);
        node.valid = false;
        node.children = children;
        node
    }

    #[must_use]
    pub(crate) fn with_children(mut self, children: Vec<OutputNode>) -> Self {
        self.children = children;
        self
    }

    /// All validation errors beneath this node, in keyword execution order.
    pub(crate) fn collect_errors(&self, into: &mut Vec<ValidationError>) {
        if let Some(error) = &self.error {
            into.push((**error).clone());
        }
        for child in &self.children {
            child.collect_errors(into);
        }
    }
}

/// The result of applying a validator to an instance, renderable in any of
/// the standard output formats.
#[derive(Debug, Clone)]
pub struct Output<'a, 'b> {
    validator: &'a Validator,
    instance: &'b Value,
}

impl<'a, 'b> Output<'a, 'b> {
    pub(crate) const fn new(validator: &'a Validator, instance: &'b Value) -> Output<'a, 'b> {
        Output {
            validator,
            instance,
        }
    }

    /// The `flag` format: a single boolean.
    #[must_use]
    pub fn flag(&self) -> bool {
        self.validator.is_valid(self.instance)
    }

    /// The `basic` format: a flat list of errors or annotations.
    #[must_use]
    pub fn basic(&self) -> BasicOutput {
        let root = self.validator.evaluate_full(self.instance);
        if root.valid {
            let mut units = Vec::new();
            flatten_annotations(&root, &mut units);
            BasicOutput::Valid(units)
        } else {
            let mut units = Vec::new();
            flatten_errors(&root, &mut units);
            BasicOutput::Invalid(units)
        }
    }

    /// The `detailed` format: the result tree pruned to relevant units, with
    /// single-child chains collapsed.
    #[must_use]
    pub fn detailed(&self) -> OutputUnit {
        let root = self.validator.evaluate_full(self.instance);
        prune(&root).unwrap_or_else(|| OutputUnit::from_node(&root))
    }

    /// The `verbose` format: the complete result tree.
    #[must_use]
    pub fn verbose(&self) -> OutputUnit {
        OutputUnit::from_node_recursive(&self.validator.evaluate_full(self.instance))
    }

    /// Render the requested format as a JSON value.
    #[must_use]
    pub fn render(&self, format: OutputFormat) -> Value {
        match format {
            OutputFormat::Flag => {
                serde_json::json!({ "valid": self.flag() })
            }
            OutputFormat::Basic => {
                serde_json::to_value(self.basic()).expect("Output is always serializable")
            }
            OutputFormat::Detailed => {
                serde_json::to_value(self.detailed()).expect("Output is always serializable")
            }
            OutputFormat::Verbose => {
                serde_json::to_value(self.verbose()).expect("Output is always serializable")
            }
        }
    }
}

fn flatten_errors(node: &OutputNode, units: &mut Vec<OutputUnit>) {
    if node.error.is_some() {
        units.push(OutputUnit::from_node(node));
    }
    for child in &node.children {
        if !child.valid {
            flatten_errors(child, units);
        }
    }
}

fn flatten_annotations(node: &OutputNode, units: &mut Vec<OutputUnit>) {
    if !node.valid {
        return;
    }
    if node.annotation.is_some() {
        units.push(OutputUnit::from_node(node));
    }
    for child in &node.children {
        flatten_annotations(child, units);
    }
}

fn prune(node: &OutputNode) -> Option<OutputUnit> {
    let relevant: Vec<OutputUnit> = node
        .children
        .iter()
        .filter(|child| {
            if node.valid {
                child.valid
            } else {
                !child.valid
            }
        })
        .filter_map(prune)
        .collect();
    if node.error.is_none() && node.annotation.is_none() {
        match relevant.len() {
            0 => return None,
            1 => return relevant.into_iter().next(),
            _ => {}
        }
    }
    let mut unit = OutputUnit::from_node(node);
    unit.nested = relevant;
    Some(unit)
}

/// A single output unit: where in the schema, where in the instance, and
/// either an error or an annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputUnit {
    valid: bool,
    ignored: bool,
    keyword_location: Location,
    absolute_keyword_location: Option<String>,
    instance_location: Location,
    error: Option<ErrorDescription>,
    annotation: Option<Value>,
    nested: Vec<OutputUnit>,
}

impl OutputUnit {
    fn from_node(node: &OutputNode) -> Self {
        OutputUnit {
            valid: node.valid,
            ignored: node.ignored,
            keyword_location: node.keyword_location.clone(),
            absolute_keyword_location: node.absolute_keyword_location.clone(),
            instance_location: node.instance_location.clone(),
            error: node.error.as_ref().map(|error| error.as_ref().into()),
            annotation: node.annotation.clone(),
            nested: Vec::new(),
        }
    }

    fn from_node_recursive(node: &OutputNode) -> Self {
        let mut unit = Self::from_node(node);
        unit.nested = node.children.iter().map(Self::from_node_recursive).collect();
        unit
    }

    /// Whether this unit describes a successful application.
    #[must_use]
    pub const fn valid(&self) -> bool {
        self.valid
    }

    /// Whether the keyword succeeded only because the instance's kind is not
    /// one it applies to.
    #[must_use]
    pub const fn ignored(&self) -> bool {
        self.ignored
    }

    /// The location of the keyword, through any traversed references.
    #[must_use]
    pub const fn keyword_location(&self) -> &Location {
        &self.keyword_location
    }

    /// The absolute, reference-independent location of the keyword.
    #[must_use]
    pub fn absolute_keyword_location(&self) -> Option<&str> {
        self.absolute_keyword_location.as_deref()
    }

    /// The location in the instance.
    #[must_use]
    pub const fn instance_location(&self) -> &Location {
        &self.instance_location
    }

    /// The error for this unit, if it describes a failure.
    #[must_use]
    pub const fn error_description(&self) -> Option<&ErrorDescription> {
        self.error.as_ref()
    }

    /// The annotation attached to this unit, if any.
    #[must_use]
    pub const fn annotation(&self) -> Option<&Value> {
        self.annotation.as_ref()
    }

    /// Nested units, for the `detailed` and `verbose` formats.
    #[must_use]
    pub fn nested(&self) -> &[OutputUnit] {
        &self.nested
    }
}

/// The `basic` output format.
#[derive(Debug, Clone, PartialEq)]
pub enum BasicOutput {
    /// The schema was valid; collected annotations can be examined.
    Valid(Vec<OutputUnit>),
    /// The schema was invalid.
    Invalid(Vec<OutputUnit>),
}

impl BasicOutput {
    /// A shortcut to check whether the output represents passed validation.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, BasicOutput::Valid(..))
    }

    /// The flat list of output units.
    #[must_use]
    pub fn units(&self) -> &[OutputUnit] {
        match self {
            BasicOutput::Valid(units) | BasicOutput::Invalid(units) => units,
        }
    }
}

/// A rendered error message attached to an output unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDescription(String);

impl ErrorDescription {
    /// Returns the inner [`String`] of the error description.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ErrorDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&ValidationError> for ErrorDescription {
    fn from(error: &ValidationError) -> Self {
        ErrorDescription(error.to_string())
    }
}

impl serde::Serialize for ErrorDescription {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl serde::Serialize for BasicOutput {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(2))?;
        match self {
            BasicOutput::Valid(units) => {
                map.serialize_entry("valid", &true)?;
                map.serialize_entry("annotations", units)?;
            }
            BasicOutput::Invalid(units) => {
                map.serialize_entry("valid", &false)?;
                map.serialize_entry("errors", units)?;
            }
        }
        map.end()
    }
}

impl serde::Serialize for OutputUnit {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("valid", &self.valid)?;
        if self.ignored {
            map.serialize_entry("ignored", &true)?;
        }
        map.serialize_entry("keywordLocation", &self.keyword_location)?;
        if let Some(absolute) = &self.absolute_keyword_location {
            map.serialize_entry("absoluteKeywordLocation", absolute)?;
        }
        map.serialize_entry("instanceLocation", &self.instance_location)?;
        if let Some(error) = &self.error {
            map.serialize_entry("error", error)?;
        }
        if let Some(annotation) = &self.annotation {
            map.serialize_entry("annotation", annotation)?;
        }
        if !self.nested.is_empty() {
            if self.valid {
                map.serialize_entry("annotations", &self.nested)?;
            } else {
                map.serialize_entry("errors", &self.nested)?;
            }
        }
        map.end()
    }
}
