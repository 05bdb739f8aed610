use serde_json::Value;

use crate::{error::BuildError, vocabularies::VocabularySet};

/// JSON Schema specification versions.
#[non_exhaustive]
#[derive(Debug, Default, PartialEq, Copy, Clone, Hash, Eq, PartialOrd, Ord)]
pub enum Draft {
    /// JSON Schema Draft 6
    Draft6,
    /// JSON Schema Draft 7
    Draft7,
    /// JSON Schema Draft 2019-09
    Draft201909,
    /// JSON Schema Draft 2020-12
    #[default]
    Draft202012,
}

pub(crate) type DraftSet = u8;

pub(crate) const DRAFT6_ONWARDS: DraftSet = 0b1111;
pub(crate) const DRAFT7_ONWARDS: DraftSet = 0b1110;
pub(crate) const DRAFT201909_ONWARDS: DraftSet = 0b1100;
pub(crate) const DRAFT201909_ONLY: DraftSet = 0b0100;
pub(crate) const DRAFT202012_ONLY: DraftSet = 0b1000;
pub(crate) const UP_TO_DRAFT201909: DraftSet = 0b0111;

impl Draft {
    pub(crate) const fn bit(self) -> DraftSet {
        match self {
            Draft::Draft6 => 0b0001,
            Draft::Draft7 => 0b0010,
            Draft::Draft201909 => 0b0100,
            Draft::Draft202012 => 0b1000,
        }
    }

    pub(crate) const fn is_in(self, set: DraftSet) -> bool {
        set & self.bit() != 0
    }

    /// Detect which specification applies to the given document.
    ///
    /// Without a `$schema` keyword the receiver is returned unchanged.
    ///
    /// # Errors
    ///
    /// On an unknown `$schema` value it returns [`BuildError::UnknownSpecification`].
    pub fn detect(self, contents: &Value) -> Result<Draft, BuildError> {
        if let Some(schema) = contents
            .as_object()
            .and_then(|contents| contents.get("$schema"))
            .and_then(|schema| schema.as_str())
        {
            Ok(match schema.trim_end_matches('#') {
                "https://json-schema.org/draft/2020-12/schema" => Draft::Draft202012,
                "https://json-schema.org/draft/2019-09/schema" => Draft::Draft201909,
                "http://json-schema.org/draft-07/schema" => Draft::Draft7,
                "http://json-schema.org/draft-06/schema" => Draft::Draft6,
                value => return Err(BuildError::unknown_specification(value)),
            })
        } else {
            Ok(self)
        }
    }

    pub(crate) fn id_of(self, contents: &Value) -> Option<&str> {
        let id = contents
            .as_object()
            .and_then(|contents| contents.get("$id"))
            .and_then(Value::as_str)?;
        match self {
            // `$id: "#name"` is an anchor in these drafts, not an identifier.
            Draft::Draft6 | Draft::Draft7 if id.starts_with('#') => None,
            _ => Some(id),
        }
    }

    /// Whether array-form `items` (positional subschemas) is allowed.
    pub(crate) const fn allows_array_items(self) -> bool {
        !matches!(self, Draft::Draft202012)
    }

    /// Identifies known JSON Schema keywords per draft.
    #[must_use]
    pub fn is_known_keyword(&self, keyword: &str) -> bool {
        match keyword {
            "$id" | "$ref" | "$schema" | "additionalItems" | "additionalProperties" | "allOf"
            | "anyOf" | "const" | "contains" | "definitions" | "dependencies" | "enum"
            | "exclusiveMaximum" | "exclusiveMinimum" | "format" | "items" | "maxItems"
            | "maxLength" | "maxProperties" | "maximum" | "minItems" | "minLength"
            | "minProperties" | "minimum" | "multipleOf" | "not" | "oneOf" | "pattern"
            | "patternProperties" | "properties" | "propertyNames" | "required" | "type"
            | "uniqueItems" => true,

            "contentEncoding" | "contentMediaType" | "else" | "if" | "then"
                if *self >= Draft::Draft7 =>
            {
                true
            }

            "$anchor" | "$defs" | "$recursiveAnchor" | "$recursiveRef" | "$vocabulary"
            | "contentSchema" | "dependentRequired" | "dependentSchemas" | "maxContains"
            | "minContains" | "unevaluatedItems" | "unevaluatedProperties"
                if *self >= Draft::Draft201909 =>
            {
                true
            }

            "$dynamicAnchor" | "$dynamicRef" | "prefixItems" if *self == Draft::Draft202012 => {
                true
            }

            _ => false,
        }
    }

    pub(crate) fn default_vocabularies(self) -> VocabularySet {
        match self {
            Draft::Draft6 | Draft::Draft7 => VocabularySet::unrestricted(),
            Draft::Draft201909 => VocabularySet::draft_2019_09(),
            Draft::Draft202012 => VocabularySet::draft_2020_12(),
        }
    }
}
