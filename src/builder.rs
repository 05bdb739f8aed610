//! Constructing the schema tree from a decoded JSON document.
//!
//! The walk recognizes keywords per draft, resolves `$id` against the active
//! base URI, records every resource and its anchors, and preserves unknown
//! keywords verbatim as annotations.
use ahash::AHashMap;
use fluent_uri::Uri;
use serde_json::{Map, Number, Value};

use crate::{
    drafts::Draft,
    error::BuildError,
    keywords::{
        self, Dependency, ItemsKind, Keyword, KeywordNode, PatternSchema, TypeSpec,
    },
    primitive_type::{PrimitiveType, PrimitiveTypesBitMap},
    resolver,
    schema::{ObjectSchema, Schema},
    uri,
    vocabularies::{self, VocabularySet},
};

/// One schema resource discovered during the walk: the document root or any
/// subschema carrying `$id`.
#[derive(Debug)]
pub(crate) struct ResourceRecord {
    pub(crate) uri: Uri<String>,
    /// Pointer from the document root to the resource root.
    pub(crate) location: Box<str>,
    /// Anchor name to pointer from the document root.
    pub(crate) anchors: AHashMap<Box<str>, Box<str>>,
    pub(crate) dynamic_anchors: AHashMap<Box<str>, Box<str>>,
    pub(crate) recursive_anchor: bool,
    pub(crate) vocabularies: Option<VocabularySet>,
}

impl ResourceRecord {
    fn new(uri: Uri<String>, location: &str, vocabularies: Option<VocabularySet>) -> Self {
        ResourceRecord {
            uri,
            location: location.into(),
            anchors: AHashMap::new(),
            dynamic_anchors: AHashMap::new(),
            recursive_anchor: false,
            vocabularies,
        }
    }
}

/// Build the schema tree for a document, returning the tree and the list of
/// resources it defines. The first record is always the document root.
pub(crate) fn build_schema(
    contents: &Value,
    draft: Draft,
    default_base: Uri<String>,
) -> Result<(Schema, Vec<ResourceRecord>), BuildError> {
    let base = match draft.id_of(contents) {
        Some(id) => uri::resolve_id(&default_base, id)?,
        None => default_base,
    };
    let mut builder = Builder {
        draft,
        records: vec![ResourceRecord::new(
            base.clone(),
            "",
            vocabularies::find(contents)?,
        )],
    };
    let schema = builder.value(contents, &base, "", 0, true)?;
    Ok((schema, builder.records))
}

struct Builder {
    draft: Draft,
    records: Vec<ResourceRecord>,
}

impl Builder {
    fn value(
        &mut self,
        value: &Value,
        base: &Uri<String>,
        location: &str,
        resource: usize,
        is_document_root: bool,
    ) -> Result<Schema, BuildError> {
        match value {
            Value::Bool(boolean) => Ok(Schema::Bool(*boolean)),
            Value::Object(map) => {
                self.object(value, map, base, location, resource, is_document_root)
            }
            _ => Err(BuildError::invalid_keyword(
                "schema",
                format!("expected a boolean or an object, found {value}"),
            )),
        }
    }

    fn object(
        &mut self,
        value: &Value,
        map: &Map<String, Value>,
        base: &Uri<String>,
        location: &str,
        resource: usize,
        is_document_root: bool,
    ) -> Result<Schema, BuildError> {
        let mut base = base.clone();
        let mut resource = resource;
        let mut base_uri = None;
        if is_document_root {
            if self.draft.id_of(value).is_some() {
                base_uri = Some(base.clone());
            }
        } else if let Some(id) = self.draft.id_of(value) {
            let new_base = uri::resolve_id(&base, id)?;
            self.records.push(ResourceRecord::new(
                new_base.clone(),
                location,
                vocabularies::find(value)?,
            ));
            resource = self.records.len() - 1;
            base = new_base;
            base_uri = Some(base.clone());
        }

        self.collect_anchor(map, location, resource)?;
        self.collect_dynamic_anchor(map, location, resource)?;
        self.collect_recursive_anchor(map, location, resource);

        let mut nodes = Vec::with_capacity(map.len());
        // In drafts 6 and 7 `$ref` replaces the schema it appears in; only
        // definitions stay reachable for pointer navigation.
        let legacy_exclusive_ref =
            self.draft <= Draft::Draft7 && map.contains_key("$ref");
        for (name, entry) in map {
            if matches!(
                name.as_str(),
                "$schema" | "$id" | "$anchor" | "$dynamicAnchor" | "$recursiveAnchor"
                    | "$vocabulary"
            ) && self.draft.is_known_keyword(name)
            {
                continue;
            }
            if legacy_exclusive_ref && !matches!(name.as_str(), "$ref" | "definitions" | "$defs")
            {
                continue;
            }
            if let Some(kind) = self.keyword(name, entry, &base, location, resource)? {
                nodes.push(KeywordNode {
                    name: name.as_str().into(),
                    kind,
                });
            }
        }
        nodes.sort_by(|a, b| {
            keywords::priority_of(a)
                .cmp(&keywords::priority_of(b))
                .then_with(|| a.name.cmp(&b.name))
        });
        let needs_annotations = nodes.iter().any(|node| {
            matches!(
                node.kind,
                Keyword::UnevaluatedItems(_) | Keyword::UnevaluatedProperties(_)
            )
        });
        Ok(Schema::Object(Box::new(ObjectSchema {
            base_uri,
            keywords: nodes,
            needs_annotations,
        })))
    }

    fn collect_anchor(
        &mut self,
        map: &Map<String, Value>,
        location: &str,
        resource: usize,
    ) -> Result<(), BuildError> {
        let name = if self.draft >= Draft::Draft201909 {
            map.get("$anchor").and_then(Value::as_str)
        } else {
            map.get("$id")
                .and_then(Value::as_str)
                .and_then(|id| id.strip_prefix('#'))
        };
        let Some(name) = name else {
            return Ok(());
        };
        if !resolver::is_anchor_name(name) {
            return Err(BuildError::invalid_anchor(name));
        }
        self.records[resource]
            .anchors
            .insert(name.into(), location.into());
        Ok(())
    }

    fn collect_dynamic_anchor(
        &mut self,
        map: &Map<String, Value>,
        location: &str,
        resource: usize,
    ) -> Result<(), BuildError> {
        if self.draft != Draft::Draft202012 {
            return Ok(());
        }
        let Some(name) = map.get("$dynamicAnchor").and_then(Value::as_str) else {
            return Ok(());
        };
        if !resolver::is_anchor_name(name) {
            return Err(BuildError::invalid_anchor(name));
        }
        let record = &mut self.records[resource];
        record.dynamic_anchors.insert(name.into(), location.into());
        // A dynamic anchor also resolves as a plain anchor.
        record.anchors.insert(name.into(), location.into());
        Ok(())
    }

    fn collect_recursive_anchor(&mut self, map: &Map<String, Value>, location: &str, resource: usize) {
        if self.draft == Draft::Draft201909
            && map.get("$recursiveAnchor").and_then(Value::as_bool) == Some(true)
            && *self.records[resource].location == *location
        {
            self.records[resource].recursive_anchor = true;
        }
    }

    fn keyword(
        &mut self,
        name: &str,
        value: &Value,
        base: &Uri<String>,
        location: &str,
        resource: usize,
    ) -> Result<Option<Keyword>, BuildError> {
        if !self.draft.is_known_keyword(name) {
            return Ok(Some(Keyword::Annotation(Box::new(value.clone()))));
        }
        let kind = match name {
            "allOf" => Keyword::AllOf(self.list(name, value, base, location, resource)?),
            "anyOf" => Keyword::AnyOf(self.list(name, value, base, location, resource)?),
            "oneOf" => Keyword::OneOf(self.list(name, value, base, location, resource)?),
            "not" | "if" | "then" | "else" | "additionalProperties" | "additionalItems"
            | "propertyNames" | "contains" | "unevaluatedItems" | "unevaluatedProperties"
            | "contentSchema" => {
                let inner = Box::new(self.subschema(value, base, location, resource, name)?);
                match name {
                    "not" => Keyword::Not(inner),
                    "if" => Keyword::If(inner),
                    "then" => Keyword::Then(inner),
                    "else" => Keyword::Else(inner),
                    "additionalProperties" => Keyword::AdditionalProperties(inner),
                    "additionalItems" => Keyword::AdditionalItems(inner),
                    "propertyNames" => Keyword::PropertyNames(inner),
                    "contains" => Keyword::Contains(inner),
                    "unevaluatedItems" => Keyword::UnevaluatedItems(inner),
                    "unevaluatedProperties" => Keyword::UnevaluatedProperties(inner),
                    _ => Keyword::ContentSchema(inner),
                }
            }
            "items" => match value {
                Value::Array(positional) => {
                    if !self.draft.allows_array_items() {
                        return Err(BuildError::invalid_keyword(
                            "items",
                            "the array form is not allowed in draft 2020-12; use prefixItems",
                        ));
                    }
                    let mut schemas = Vec::with_capacity(positional.len());
                    for (idx, entry) in positional.iter().enumerate() {
                        let child = join(location, name);
                        let child = join_index(&child, idx);
                        schemas.push(self.value(entry, base, &child, resource, false)?);
                    }
                    Keyword::Items(ItemsKind::Positional(schemas))
                }
                _ => Keyword::Items(ItemsKind::Single(Box::new(
                    self.subschema(value, base, location, resource, "items")?,
                ))),
            },
            "prefixItems" => Keyword::PrefixItems(self.list(name, value, base, location, resource)?),
            "properties" => Keyword::Properties(self.entries(name, value, base, location, resource)?),
            "patternProperties" => {
                let Some(object) = value.as_object() else {
                    return Err(BuildError::invalid_keyword(name, "expected an object"));
                };
                let mut entries = Vec::with_capacity(object.len());
                for (pattern, entry) in object {
                    let compiled = fancy_regex::Regex::new(pattern)
                        .map_err(|error| BuildError::invalid_regex(pattern, error))?;
                    let child = join(&join(location, name), pattern);
                    entries.push(PatternSchema {
                        pattern: compiled,
                        source: pattern.as_str().into(),
                        schema: self.value(entry, base, &child, resource, false)?,
                    });
                }
                Keyword::PatternProperties(entries)
            }
            "dependentSchemas" => {
                Keyword::DependentSchemas(self.entries(name, value, base, location, resource)?)
            }
            "dependentRequired" => {
                let Some(object) = value.as_object() else {
                    return Err(BuildError::invalid_keyword(name, "expected an object"));
                };
                let mut entries = Vec::with_capacity(object.len());
                for (property, dependency) in object {
                    entries.push((
                        property.as_str().into(),
                        string_list(name, dependency)?,
                    ));
                }
                Keyword::DependentRequired(entries)
            }
            "dependencies" => {
                let Some(object) = value.as_object() else {
                    return Err(BuildError::invalid_keyword(name, "expected an object"));
                };
                let mut entries = Vec::with_capacity(object.len());
                for (property, dependency) in object {
                    let dependency = if dependency.is_array() {
                        Dependency::Requires(string_list(name, dependency)?)
                    } else {
                        let child = join(&join(location, name), property);
                        Dependency::Schema(self.value(dependency, base, &child, resource, false)?)
                    };
                    entries.push((property.as_str().into(), dependency));
                }
                Keyword::Dependencies(entries)
            }
            "$defs" | "definitions" => {
                Keyword::Defs(self.entries(name, value, base, location, resource)?)
            }
            "type" => match value {
                Value::String(single) => Keyword::Type(TypeSpec::Single(
                    single
                        .parse::<PrimitiveType>()
                        .map_err(|()| BuildError::invalid_keyword("type", single.clone()))?,
                )),
                Value::Array(names) => {
                    let mut types = PrimitiveTypesBitMap::new();
                    for name in names {
                        let name = name.as_str().ok_or_else(|| {
                            BuildError::invalid_keyword("type", "expected a list of type names")
                        })?;
                        types = types.add(
                            name.parse::<PrimitiveType>()
                                .map_err(|()| BuildError::invalid_keyword("type", name))?,
                        );
                    }
                    Keyword::Type(TypeSpec::Multiple(types))
                }
                _ => {
                    return Err(BuildError::invalid_keyword(
                        "type",
                        "expected a type name or a list of type names",
                    ))
                }
            },
            "enum" => match value {
                Value::Array(options) => Keyword::Enum(options.clone()),
                _ => return Err(BuildError::invalid_keyword("enum", "expected an array")),
            },
            "const" => Keyword::Const(Box::new(value.clone())),
            "minimum" => Keyword::Minimum(number(name, value)?),
            "maximum" => Keyword::Maximum(number(name, value)?),
            "exclusiveMinimum" => Keyword::ExclusiveMinimum(number(name, value)?),
            "exclusiveMaximum" => Keyword::ExclusiveMaximum(number(name, value)?),
            "multipleOf" => {
                let divisor = number(name, value)?;
                if divisor.as_f64().is_some_and(|value| value <= 0.0) {
                    return Err(BuildError::invalid_keyword(
                        "multipleOf",
                        "expected a strictly positive number",
                    ));
                }
                Keyword::MultipleOf(divisor)
            }
            "minLength" => Keyword::MinLength(unsigned("minLength", value)?),
            "maxLength" => Keyword::MaxLength(unsigned("maxLength", value)?),
            "minItems" => Keyword::MinItems(unsigned("minItems", value)?),
            "maxItems" => Keyword::MaxItems(unsigned("maxItems", value)?),
            "minProperties" => Keyword::MinProperties(unsigned("minProperties", value)?),
            "maxProperties" => Keyword::MaxProperties(unsigned("maxProperties", value)?),
            "minContains" => Keyword::MinContains(unsigned("minContains", value)?),
            "maxContains" => Keyword::MaxContains(unsigned("maxContains", value)?),
            "uniqueItems" => match value.as_bool() {
                Some(true) => Keyword::UniqueItems,
                Some(false) => return Ok(None),
                None => return Err(BuildError::invalid_keyword(name, "expected a boolean")),
            },
            "required" => Keyword::Required(string_list(name, value)?),
            "pattern" => {
                let Some(source) = value.as_str() else {
                    return Err(BuildError::invalid_keyword(name, "expected a string"));
                };
                Keyword::Pattern {
                    pattern: fancy_regex::Regex::new(source)
                        .map_err(|error| BuildError::invalid_regex(source, error))?,
                    source: source.into(),
                }
            }
            "format" => match value.as_str() {
                Some(format) => Keyword::Format(format.into()),
                None => return Err(BuildError::invalid_keyword(name, "expected a string")),
            },
            "$ref" => Keyword::Ref(reference(name, value)?),
            "$dynamicRef" => Keyword::DynamicRef(reference(name, value)?),
            "$recursiveRef" => {
                if value.as_str() != Some("#") {
                    return Err(BuildError::invalid_keyword(
                        "$recursiveRef",
                        format!("expected \"#\", found {value}"),
                    ));
                }
                Keyword::RecursiveRef
            }
            "contentEncoding" => match value.as_str() {
                Some(encoding) => Keyword::ContentEncoding(encoding.into()),
                None => return Err(BuildError::invalid_keyword(name, "expected a string")),
            },
            "contentMediaType" => match value.as_str() {
                Some(media_type) => Keyword::ContentMediaType(media_type.into()),
                None => return Err(BuildError::invalid_keyword(name, "expected a string")),
            },
            // Metadata keywords pass through as annotations.
            _ => Keyword::Annotation(Box::new(value.clone())),
        };
        Ok(Some(kind))
    }

    fn subschema(
        &mut self,
        value: &Value,
        base: &Uri<String>,
        location: &str,
        resource: usize,
        name: &str,
    ) -> Result<Schema, BuildError> {
        let child = join(location, name);
        match value {
            Value::Bool(_) | Value::Object(_) => {
                self.value(value, base, &child, resource, false)
            }
            _ => Err(BuildError::invalid_keyword(name, "expected a schema")),
        }
    }

    fn list(
        &mut self,
        name: &str,
        value: &Value,
        base: &Uri<String>,
        location: &str,
        resource: usize,
    ) -> Result<Vec<Schema>, BuildError> {
        let Some(items) = value.as_array() else {
            return Err(BuildError::invalid_keyword(name, "expected an array"));
        };
        if items.is_empty() {
            return Err(BuildError::invalid_keyword(name, "expected a non-empty array"));
        }
        let mut schemas = Vec::with_capacity(items.len());
        for (idx, entry) in items.iter().enumerate() {
            let child = join_index(&join(location, name), idx);
            schemas.push(self.value(entry, base, &child, resource, false)?);
        }
        Ok(schemas)
    }

    fn entries(
        &mut self,
        name: &str,
        value: &Value,
        base: &Uri<String>,
        location: &str,
        resource: usize,
    ) -> Result<Vec<(Box<str>, Schema)>, BuildError> {
        let Some(object) = value.as_object() else {
            return Err(BuildError::invalid_keyword(name, "expected an object"));
        };
        let mut entries = Vec::with_capacity(object.len());
        for (key, entry) in object {
            let child = join(&join(location, name), key);
            entries.push((
                key.as_str().into(),
                self.value(entry, base, &child, resource, false)?,
            ));
        }
        Ok(entries)
    }
}

fn join(location: &str, token: &str) -> String {
    let mut next = String::with_capacity(location.len() + token.len() + 1);
    next.push_str(location);
    next.push('/');
    for ch in token.chars() {
        match ch {
            '~' => next.push_str("~0"),
            '/' => next.push_str("~1"),
            _ => next.push(ch),
        }
    }
    next
}

fn join_index(location: &str, idx: usize) -> String {
    format!("{location}/{idx}")
}

fn number(name: &str, value: &Value) -> Result<Number, BuildError> {
    value
        .as_number()
        .cloned()
        .ok_or_else(|| BuildError::invalid_keyword(name, "expected a number"))
}

fn unsigned(name: &str, value: &Value) -> Result<u64, BuildError> {
    if let Some(limit) = value.as_u64() {
        return Ok(limit);
    }
    // The meta-schemas allow integral floats like 2.0.
    if let Some(float) = value.as_f64() {
        if float >= 0.0 && float.fract() == 0.0 && float <= u64::MAX as f64 {
            return Ok(float as u64);
        }
    }
    Err(BuildError::invalid_keyword(
        name,
        "expected a non-negative integer",
    ))
}

fn string_list(name: &str, value: &Value) -> Result<Vec<Box<str>>, BuildError> {
    let Some(items) = value.as_array() else {
        return Err(BuildError::invalid_keyword(name, "expected an array"));
    };
    items
        .iter()
        .map(|item| {
            item.as_str().map(Into::into).ok_or_else(|| {
                BuildError::invalid_keyword(name, "expected an array of strings")
            })
        })
        .collect()
}

fn reference(name: &str, value: &Value) -> Result<Box<str>, BuildError> {
    value
        .as_str()
        .map(Into::into)
        .ok_or_else(|| BuildError::invalid_keyword(name, "expected a string"))
}

#[cfg(test)]
mod tests {
    use super::build_schema;
    use crate::{drafts::Draft, uri};
    use serde_json::json;
    use test_case::test_case;

    fn base() -> fluent_uri::Uri<String> {
        uri::from_str("https://example.com/root").expect("Invalid base")
    }

    #[test]
    fn array_items_rejected_in_2020_12() {
        let schema = json!({"items": [{"type": "integer"}], "additionalItems": false});
        let error = build_schema(&schema, Draft::Draft202012, base()).expect_err("Must fail");
        assert_eq!(
            error.to_string(),
            "Invalid 'items' value: the array form is not allowed in draft 2020-12; use prefixItems"
        );
        assert!(build_schema(&schema, Draft::Draft7, base()).is_ok());
    }

    #[test]
    fn collects_subresources_and_anchors() {
        let schema = json!({
            "$id": "https://example.com/root",
            "$defs": {
                "a": {"$id": "sub", "$anchor": "here", "type": "integer"},
                "b": {"$dynamicAnchor": "T"}
            }
        });
        let (_, records) = build_schema(&schema, Draft::Draft202012, base()).expect("Valid");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].uri.as_str(), "https://example.com/root");
        assert_eq!(records[1].uri.as_str(), "https://example.com/sub");
        assert_eq!(
            records[1].anchors.get("here").map(|p| &**p),
            Some("/$defs/a")
        );
        assert_eq!(
            records[0].dynamic_anchors.get("T").map(|p| &**p),
            Some("/$defs/b")
        );
        // Dynamic anchors are also plain anchors.
        assert!(records[0].anchors.contains_key("T"));
    }

    #[test]
    fn legacy_anchor_in_dollar_id() {
        let schema = json!({"$defs": {"a": {"$id": "#frag", "type": "integer"}}});
        let (_, records) = build_schema(&schema, Draft::Draft7, base()).expect("Valid");
        assert_eq!(
            records[0].anchors.get("frag").map(|p| &**p),
            Some("/$defs/a")
        );
    }

    #[test]
    fn recursive_anchor_marks_the_resource() {
        let schema = json!({"$recursiveAnchor": true});
        let (_, records) = build_schema(&schema, Draft::Draft201909, base()).expect("Valid");
        assert!(records[0].recursive_anchor);
    }

    #[test_case(&json!({"type": 1}))]
    #[test_case(&json!({"type": "unknown"}))]
    #[test_case(&json!({"enum": 1}))]
    #[test_case(&json!({"minimum": "1"}))]
    #[test_case(&json!({"minLength": -1}))]
    #[test_case(&json!({"multipleOf": 0}))]
    #[test_case(&json!({"pattern": "("}))]
    #[test_case(&json!({"required": [1]}))]
    #[test_case(&json!({"$recursiveRef": "#/other"}))]
    fn malformed_keywords_fail_the_load(schema: &serde_json::Value) {
        let draft = Draft::Draft201909;
        assert!(build_schema(schema, draft, base()).is_err());
    }

    #[test]
    fn invalid_anchor_name_fails_the_load() {
        let schema = json!({"$anchor": "not/a-name"});
        assert!(build_schema(&schema, Draft::Draft202012, base()).is_err());
    }

    #[test]
    fn unknown_keywords_become_annotations() {
        let schema = json!({"customKeyword": {"nested": true}});
        let (schema, _) = build_schema(&schema, Draft::Draft202012, base()).expect("Valid");
        let object = schema.as_object().expect("Object schema");
        assert!(object.get("customKeyword").is_some());
    }
}
