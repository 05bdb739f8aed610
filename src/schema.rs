//! The schema object model: a schema is either a boolean or an ordered set of
//! keyword nodes.
use fluent_uri::Uri;

use crate::{
    keywords::{Dependency, ItemsKind, Keyword, KeywordNode},
    paths,
};

/// A node in the schema tree.
#[derive(Debug)]
pub(crate) enum Schema {
    /// `true` accepts everything, `false` rejects everything.
    Bool(bool),
    Object(Box<ObjectSchema>),
}

/// An object schema: identity data plus keyword nodes in evaluation order.
///
/// Anchors declared by the schema are indexed on its registry entry, which
/// owns resolution; the node itself only keeps what evaluation consults.
#[derive(Debug)]
pub(crate) struct ObjectSchema {
    /// Absolute URI assigned by `$id`, resolved at load time.
    pub(crate) base_uri: Option<Uri<String>>,
    /// Sorted by `(priority, name)` at build time.
    pub(crate) keywords: Vec<KeywordNode>,
    /// Whether an `unevaluated*` consumer forces full annotation collection
    /// beneath this schema.
    pub(crate) needs_annotations: bool,
}

impl Schema {
    pub(crate) fn as_object(&self) -> Option<&ObjectSchema> {
        match self {
            Schema::Object(object) => Some(object),
            Schema::Bool(_) => None,
        }
    }

    /// Apply an RFC 6901 pointer to the schema tree.
    ///
    /// Navigation is keyword-aware: an integer segment descends into a schema
    /// list, a string segment into a keyed mapping, and a unary keyword
    /// segment selects its single carried subschema.
    pub(crate) fn resolve_pointer(&self, pointer: &str) -> Option<&Schema> {
        let tokens = paths::parse_pointer(pointer)?;
        self.resolve_tokens(&tokens)
    }

    pub(crate) fn resolve_tokens(&self, tokens: &[String]) -> Option<&Schema> {
        let mut current = self;
        let mut tokens = tokens.iter();
        while let Some(token) = tokens.next() {
            let object = current.as_object()?;
            let node = object.get(token)?;
            current = match &node.kind {
                Keyword::Not(inner)
                | Keyword::If(inner)
                | Keyword::Then(inner)
                | Keyword::Else(inner)
                | Keyword::AdditionalProperties(inner)
                | Keyword::AdditionalItems(inner)
                | Keyword::PropertyNames(inner)
                | Keyword::Contains(inner)
                | Keyword::UnevaluatedItems(inner)
                | Keyword::UnevaluatedProperties(inner)
                | Keyword::ContentSchema(inner) => &**inner,
                Keyword::Items(ItemsKind::Single(inner)) => &**inner,
                Keyword::Items(ItemsKind::Positional(list)) => indexed(list, tokens.next()?)?,
                Keyword::AllOf(list) | Keyword::AnyOf(list) | Keyword::OneOf(list) => {
                    indexed(list, tokens.next()?)?
                }
                Keyword::PrefixItems(list) => indexed(list, tokens.next()?)?,
                Keyword::Properties(entries)
                | Keyword::Defs(entries)
                | Keyword::DependentSchemas(entries) => keyed(entries, tokens.next()?)?,
                Keyword::PatternProperties(entries) => {
                    let key = tokens.next()?;
                    entries
                        .iter()
                        .find(|entry| &*entry.source == key.as_str())
                        .map(|entry| &entry.schema)?
                }
                Keyword::Dependencies(entries) => {
                    let key = tokens.next()?;
                    match entries.iter().find(|(name, _)| &**name == key.as_str())? {
                        (_, Dependency::Schema(schema)) => schema,
                        (_, Dependency::Requires(_)) => return None,
                    }
                }
                _ => return None,
            };
        }
        Some(current)
    }
}

fn indexed<'a>(list: &'a [Schema], token: &str) -> Option<&'a Schema> {
    // Leading zeros are not valid array indices in RFC 6901.
    if token.len() > 1 && token.starts_with('0') {
        return None;
    }
    list.get(token.parse::<usize>().ok()?)
}

fn keyed<'a>(entries: &'a [(Box<str>, Schema)], token: &str) -> Option<&'a Schema> {
    entries
        .iter()
        .find(|(name, _)| &**name == token)
        .map(|(_, schema)| schema)
}

impl ObjectSchema {
    pub(crate) fn get(&self, name: &str) -> Option<&KeywordNode> {
        self.keywords.iter().find(|node| &*node.name == name)
    }
}

#[cfg(test)]
mod tests {
    use crate::{builder, drafts::Draft, uri};
    use serde_json::json;

    fn build(value: &serde_json::Value) -> super::Schema {
        let base = uri::DEFAULT_ROOT_URI.clone();
        builder::build_schema(value, Draft::Draft202012, base)
            .expect("Invalid schema")
            .0
    }

    #[test]
    fn pointer_into_keyed_mapping() {
        let schema = build(&json!({"$defs": {"pos": {"type": "integer"}}}));
        let target = schema.resolve_pointer("/$defs/pos").expect("Resolved");
        assert!(target.as_object().expect("Object schema").get("type").is_some());
    }

    #[test]
    fn pointer_into_schema_list() {
        let schema = build(&json!({"anyOf": [{"type": "string"}, {"type": "integer"}]}));
        assert!(schema.resolve_pointer("/anyOf/1").is_some());
        assert!(schema.resolve_pointer("/anyOf/2").is_none());
        assert!(schema.resolve_pointer("/anyOf/01").is_none());
    }

    #[test]
    fn pointer_into_unary_keyword() {
        let schema = build(&json!({"not": {"type": "null"}}));
        assert!(schema.resolve_pointer("/not").is_some());
    }

    #[test]
    fn pointer_with_escapes() {
        let schema = build(&json!({"properties": {"a/b": {"type": "string"}}}));
        assert!(schema.resolve_pointer("/properties/a~1b").is_some());
    }

    #[test]
    fn pointer_to_nowhere() {
        let schema = build(&json!({"type": "integer"}));
        assert!(schema.resolve_pointer("/missing").is_none());
        assert!(schema.resolve_pointer("/type/0").is_none());
    }
}
