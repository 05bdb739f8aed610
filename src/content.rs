//! The content keywords.
//!
//! `contentEncoding` and `contentMediaType` are annotation-only; decoding is
//! the host's business. `contentSchema` validates the decoded value when the
//! configured decoder produces one and is otherwise annotation-only.
use serde_json::{json, Value};

use crate::{
    context::EvalContext,
    engine::{self, KeywordEvaluation, Scope},
    keywords::Keyword,
    output::OutputNode,
    paths::{LazyLocation, SchemaLocation},
    schema::{ObjectSchema, Schema},
};

pub(crate) fn content_encoding(
    encoding: &str,
    instance: &Value,
    scope: &mut Scope,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
) -> KeywordEvaluation {
    if !instance.is_string() {
        return OutputNode::ignored(location, instance_path);
    }
    scope.annotate("contentEncoding", json!(encoding));
    OutputNode::annotation(location, instance_path, json!(encoding))
}

pub(crate) fn content_media_type(
    media_type: &str,
    instance: &Value,
    scope: &mut Scope,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
) -> KeywordEvaluation {
    if !instance.is_string() {
        return OutputNode::ignored(location, instance_path);
    }
    scope.annotate("contentMediaType", json!(media_type));
    OutputNode::annotation(location, instance_path, json!(media_type))
}

pub(crate) fn content_schema(
    subschema: &Schema,
    parent: &ObjectSchema,
    instance: &Value,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
    ctx: &mut EvalContext<'_>,
) -> KeywordEvaluation {
    let Value::String(content) = instance else {
        return OutputNode::ignored(location, instance_path);
    };
    let Some(decoder) = ctx.options.content_decoder.clone() else {
        return OutputNode::ignored(location, instance_path);
    };
    let Some(media_type) = parent.get("contentMediaType").and_then(|node| {
        match &node.kind {
            Keyword::ContentMediaType(media_type) => Some(&**media_type),
            _ => None,
        }
    }) else {
        return OutputNode::ignored(location, instance_path);
    };
    let encoding = parent
        .get("contentEncoding")
        .and_then(|node| match &node.kind {
            Keyword::ContentEncoding(encoding) => Some(&**encoding),
            _ => None,
        })
        .unwrap_or("");
    let Some(decoded) = decoder(media_type, encoding, content) else {
        // Undecodable content keeps the keyword annotation-only.
        return OutputNode::ignored(location, instance_path);
    };
    let result = engine::evaluate(subschema, &decoded, location, instance_path, ctx);
    result.node
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    fn json_decoder(media_type: &str, _encoding: &str, content: &str) -> Option<Value> {
        if media_type == "application/json" {
            serde_json::from_str(content).ok()
        } else {
            None
        }
    }

    #[test]
    fn content_schema_validates_the_decoded_value() {
        let schema = json!({
            "contentMediaType": "application/json",
            "contentSchema": {"required": ["answer"]}
        });
        let validator = crate::options()
            .content_decoder(json_decoder)
            .build(&schema)
            .expect("Invalid schema");
        assert!(validator.is_valid(&json!(r#"{"answer": 42}"#)));
        assert!(!validator.is_valid(&json!(r#"{"question": "?"}"#)));
    }

    #[test]
    fn without_a_decoder_content_keywords_only_annotate() {
        let schema = json!({
            "contentMediaType": "application/json",
            "contentSchema": {"required": ["answer"]}
        });
        let validator = crate::validator_for(&schema).expect("Invalid schema");
        assert!(validator.is_valid(&json!("not even json")));
    }

    #[test]
    fn undecodable_content_is_not_a_failure() {
        let schema = json!({
            "contentMediaType": "text/csv",
            "contentSchema": {"type": "array"}
        });
        let validator = crate::options()
            .content_decoder(json_decoder)
            .build(&schema)
            .expect("Invalid schema");
        assert!(validator.is_valid(&json!("a,b,c")));
    }
}
