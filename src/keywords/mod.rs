//! The keyword catalogue: one tagged variant per keyword, a const metadata
//! table driving applicability and execution order, and the dispatcher the
//! evaluation engine calls.
pub(crate) mod conditional;
pub(crate) mod contains;
pub(crate) mod enum_;
pub(crate) mod items;
pub(crate) mod logic;
pub(crate) mod misc;
pub(crate) mod numeric;
pub(crate) mod properties;
pub(crate) mod references;
pub(crate) mod strings;
pub(crate) mod type_;
pub(crate) mod unevaluated;

use serde_json::{Number, Value};

use crate::{
    content,
    context::EvalContext,
    drafts::{
        Draft, DraftSet, DRAFT201909_ONLY, DRAFT201909_ONWARDS, DRAFT202012_ONLY, DRAFT6_ONWARDS,
        DRAFT7_ONWARDS, UP_TO_DRAFT201909,
    },
    engine::{KeywordEvaluation, Scope},
    formats,
    paths::{LazyLocation, SchemaLocation},
    primitive_type::{PrimitiveType, PrimitiveTypesBitMap},
    schema::{ObjectSchema, Schema},
    vocabularies::{Vocabulary, VocabularySet},
};

/// A keyword with its parsed payload.
#[derive(Debug)]
pub(crate) struct KeywordNode {
    pub(crate) name: Box<str>,
    pub(crate) kind: Keyword,
}

/// A compiled `patternProperties` entry or `pattern` payload.
#[derive(Debug)]
pub(crate) struct PatternSchema {
    pub(crate) pattern: fancy_regex::Regex,
    pub(crate) source: Box<str>,
    pub(crate) schema: Schema,
}

/// The two historical shapes of `items`.
#[derive(Debug)]
pub(crate) enum ItemsKind {
    /// A single schema applied to every item.
    Single(Box<Schema>),
    /// Positional subschemas (drafts up to 2019-09).
    Positional(Vec<Schema>),
}

/// A draft 6/7 `dependencies` entry.
#[derive(Debug)]
pub(crate) enum Dependency {
    Requires(Vec<Box<str>>),
    Schema(Schema),
}

/// `type` as written: a single name or a list.
#[derive(Debug)]
pub(crate) enum TypeSpec {
    Single(PrimitiveType),
    Multiple(PrimitiveTypesBitMap),
}

#[derive(Debug)]
pub(crate) enum Keyword {
    // Logical applicators
    AllOf(Vec<Schema>),
    AnyOf(Vec<Schema>),
    OneOf(Vec<Schema>),
    Not(Box<Schema>),
    // Conditional applicators
    If(Box<Schema>),
    Then(Box<Schema>),
    Else(Box<Schema>),
    // Object applicators
    Properties(Vec<(Box<str>, Schema)>),
    PatternProperties(Vec<PatternSchema>),
    AdditionalProperties(Box<Schema>),
    PropertyNames(Box<Schema>),
    UnevaluatedProperties(Box<Schema>),
    // Array applicators
    Items(ItemsKind),
    PrefixItems(Vec<Schema>),
    AdditionalItems(Box<Schema>),
    Contains(Box<Schema>),
    MinContains(u64),
    MaxContains(u64),
    UnevaluatedItems(Box<Schema>),
    // Dependency keywords
    Dependencies(Vec<(Box<str>, Dependency)>),
    DependentRequired(Vec<(Box<str>, Vec<Box<str>>)>),
    DependentSchemas(Vec<(Box<str>, Schema)>),
    // Validation keywords
    Type(TypeSpec),
    Enum(Vec<Value>),
    Const(Box<Value>),
    Minimum(Number),
    Maximum(Number),
    ExclusiveMinimum(Number),
    ExclusiveMaximum(Number),
    MultipleOf(Number),
    MinLength(u64),
    MaxLength(u64),
    Pattern {
        pattern: fancy_regex::Regex,
        source: Box<str>,
    },
    MinItems(u64),
    MaxItems(u64),
    UniqueItems,
    MinProperties(u64),
    MaxProperties(u64),
    Required(Vec<Box<str>>),
    Format(Box<str>),
    // Reference keywords
    Ref(Box<str>),
    DynamicRef(Box<str>),
    RecursiveRef,
    // Identity keywords kept for navigation; they never validate
    Defs(Vec<(Box<str>, Schema)>),
    // Content keywords
    ContentEncoding(Box<str>),
    ContentMediaType(Box<str>),
    ContentSchema(Box<Schema>),
    // Metadata and unknown keywords, preserved verbatim as annotations
    Annotation(Box<Value>),
}

pub(crate) const PRIORITY_ANNOTATION: u32 = 0;
pub(crate) const PRIORITY_REFERENCE: u32 = 100;
pub(crate) const PRIORITY_VALIDATION: u32 = 200;
pub(crate) const PRIORITY_APPLICATOR: u32 = 300;
pub(crate) const PRIORITY_BRANCH: u32 = 310;
pub(crate) const PRIORITY_ADDITIONAL: u32 = 400;
pub(crate) const PRIORITY_UNEVALUATED: u32 = 500;

/// Static facts about a keyword: when it runs, which drafts and vocabulary it
/// belongs to, and whether it recurses into subschemas.
#[derive(Debug)]
pub(crate) struct KeywordMeta {
    pub(crate) priority: u32,
    pub(crate) drafts: DraftSet,
    pub(crate) vocabulary: Vocabulary,
    pub(crate) applicator: bool,
}

macro_rules! meta {
    ($priority:expr, $drafts:expr, $vocabulary:expr, $applicator:expr) => {
        Some(&KeywordMeta {
            priority: $priority,
            drafts: $drafts,
            vocabulary: $vocabulary,
            applicator: $applicator,
        })
    };
}

/// The metadata table. Unknown keywords return `None` and evaluate as
/// pass-through annotations.
pub(crate) fn meta(keyword: &str) -> Option<&'static KeywordMeta> {
    match keyword {
        "$ref" => meta!(PRIORITY_REFERENCE, DRAFT6_ONWARDS, Vocabulary::Core, true),
        "$recursiveRef" => meta!(
            PRIORITY_REFERENCE,
            DRAFT201909_ONLY,
            Vocabulary::Core,
            true
        ),
        "$dynamicRef" => meta!(PRIORITY_REFERENCE, DRAFT202012_ONLY, Vocabulary::Core, true),
        "allOf" => meta!(
            PRIORITY_APPLICATOR,
            DRAFT6_ONWARDS,
            Vocabulary::Applicator,
            true
        ),
        "anyOf" => meta!(
            PRIORITY_APPLICATOR,
            DRAFT6_ONWARDS,
            Vocabulary::Applicator,
            true
        ),
        "oneOf" => meta!(
            PRIORITY_APPLICATOR,
            DRAFT6_ONWARDS,
            Vocabulary::Applicator,
            true
        ),
        "not" => meta!(
            PRIORITY_APPLICATOR,
            DRAFT6_ONWARDS,
            Vocabulary::Applicator,
            true
        ),
        "if" => meta!(
            PRIORITY_APPLICATOR,
            DRAFT7_ONWARDS,
            Vocabulary::Applicator,
            true
        ),
        "then" => meta!(
            PRIORITY_BRANCH,
            DRAFT7_ONWARDS,
            Vocabulary::Applicator,
            true
        ),
        "else" => meta!(
            PRIORITY_BRANCH,
            DRAFT7_ONWARDS,
            Vocabulary::Applicator,
            true
        ),
        "properties" => meta!(
            PRIORITY_APPLICATOR,
            DRAFT6_ONWARDS,
            Vocabulary::Applicator,
            true
        ),
        "patternProperties" => meta!(
            PRIORITY_APPLICATOR,
            DRAFT6_ONWARDS,
            Vocabulary::Applicator,
            true
        ),
        "additionalProperties" => meta!(
            PRIORITY_ADDITIONAL,
            DRAFT6_ONWARDS,
            Vocabulary::Applicator,
            true
        ),
        "propertyNames" => meta!(
            PRIORITY_APPLICATOR,
            DRAFT6_ONWARDS,
            Vocabulary::Applicator,
            true
        ),
        "unevaluatedProperties" => meta!(
            PRIORITY_UNEVALUATED,
            DRAFT201909_ONWARDS,
            Vocabulary::Unevaluated,
            true
        ),
        // Runs after `prefixItems`, whose coverage annotation it consumes.
        "items" => meta!(
            PRIORITY_BRANCH,
            DRAFT6_ONWARDS,
            Vocabulary::Applicator,
            true
        ),
        "prefixItems" => meta!(
            PRIORITY_APPLICATOR,
            DRAFT202012_ONLY,
            Vocabulary::Applicator,
            true
        ),
        "additionalItems" => meta!(
            PRIORITY_ADDITIONAL,
            UP_TO_DRAFT201909,
            Vocabulary::Applicator,
            true
        ),
        "contains" => meta!(
            PRIORITY_APPLICATOR,
            DRAFT6_ONWARDS,
            Vocabulary::Applicator,
            true
        ),
        "minContains" => meta!(
            PRIORITY_ADDITIONAL,
            DRAFT201909_ONWARDS,
            Vocabulary::Validation,
            false
        ),
        "maxContains" => meta!(
            PRIORITY_ADDITIONAL,
            DRAFT201909_ONWARDS,
            Vocabulary::Validation,
            false
        ),
        "unevaluatedItems" => meta!(
            PRIORITY_UNEVALUATED,
            DRAFT201909_ONWARDS,
            Vocabulary::Unevaluated,
            true
        ),
        "dependencies" => meta!(
            PRIORITY_APPLICATOR,
            DRAFT6_ONWARDS,
            Vocabulary::Applicator,
            true
        ),
        "dependentRequired" => meta!(
            PRIORITY_VALIDATION,
            DRAFT201909_ONWARDS,
            Vocabulary::Validation,
            false
        ),
        "dependentSchemas" => meta!(
            PRIORITY_APPLICATOR,
            DRAFT201909_ONWARDS,
            Vocabulary::Applicator,
            true
        ),
        "type" | "enum" | "const" | "minimum" | "maximum" | "exclusiveMinimum"
        | "exclusiveMaximum" | "multipleOf" | "minLength" | "maxLength" | "pattern"
        | "minItems" | "maxItems" | "uniqueItems" | "minProperties" | "maxProperties"
        | "required" => meta!(
            PRIORITY_VALIDATION,
            DRAFT6_ONWARDS,
            Vocabulary::Validation,
            false
        ),
        "format" => meta!(
            PRIORITY_VALIDATION,
            DRAFT6_ONWARDS,
            Vocabulary::FormatAnnotation,
            false
        ),
        "$defs" => meta!(
            PRIORITY_ANNOTATION,
            DRAFT201909_ONWARDS,
            Vocabulary::Core,
            false
        ),
        "definitions" => meta!(PRIORITY_ANNOTATION, DRAFT6_ONWARDS, Vocabulary::Core, false),
        "contentEncoding" | "contentMediaType" => meta!(
            PRIORITY_VALIDATION,
            DRAFT7_ONWARDS,
            Vocabulary::Content,
            false
        ),
        "contentSchema" => meta!(
            PRIORITY_VALIDATION,
            DRAFT201909_ONWARDS,
            Vocabulary::Content,
            true
        ),
        "title" | "description" | "default" | "examples" | "deprecated" | "readOnly"
        | "writeOnly" | "$comment" => meta!(
            PRIORITY_ANNOTATION,
            DRAFT6_ONWARDS,
            Vocabulary::Metadata,
            false
        ),
        _ => None,
    }
}

/// Whether a keyword node participates in validation under the active draft
/// and vocabulary set.
pub(crate) fn applies(node: &KeywordNode, draft: Draft, vocabularies: &VocabularySet) -> bool {
    let Some(meta) = meta(&node.name) else {
        // Unknown keywords are pass-through annotations in every draft.
        return true;
    };
    if !draft.is_in(meta.drafts) {
        return false;
    }
    let vocabulary = match &*node.name {
        // In 2019-09 `unevaluated*` had not yet moved into its own vocabulary.
        "unevaluatedItems" | "unevaluatedProperties" if draft == Draft::Draft201909 => {
            Vocabulary::Applicator
        }
        // `format` always runs; whether it asserts is decided at evaluation.
        "format" => return true,
        _ => meta.vocabulary,
    };
    vocabularies.enables(vocabulary)
}

pub(crate) fn priority_of(node: &KeywordNode) -> u32 {
    meta(&node.name).map_or(PRIORITY_ANNOTATION, |meta| meta.priority)
}

/// Run one keyword contract against the instance.
pub(crate) fn dispatch(
    node: &KeywordNode,
    parent: &ObjectSchema,
    instance: &Value,
    scope: &mut Scope,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
    ctx: &mut EvalContext<'_>,
) -> KeywordEvaluation {
    let location = location.join(&*node.name);
    match &node.kind {
        Keyword::AllOf(members) => {
            logic::all_of(members, instance, scope, &location, instance_path, ctx)
        }
        Keyword::AnyOf(members) => {
            logic::any_of(members, instance, scope, &location, instance_path, ctx)
        }
        Keyword::OneOf(members) => {
            logic::one_of(members, instance, scope, &location, instance_path, ctx)
        }
        Keyword::Not(subschema) => logic::not(subschema, instance, &location, instance_path, ctx),
        Keyword::If(subschema) => {
            conditional::if_(subschema, instance, scope, &location, instance_path, ctx)
        }
        Keyword::Then(subschema) => {
            conditional::then_(subschema, instance, scope, &location, instance_path, ctx)
        }
        Keyword::Else(subschema) => {
            conditional::else_(subschema, instance, scope, &location, instance_path, ctx)
        }
        Keyword::Properties(entries) => {
            properties::properties(entries, instance, scope, &location, instance_path, ctx)
        }
        Keyword::PatternProperties(entries) => {
            properties::pattern_properties(entries, instance, scope, &location, instance_path, ctx)
        }
        Keyword::AdditionalProperties(subschema) => properties::additional_properties(
            subschema,
            instance,
            scope,
            &location,
            instance_path,
            ctx,
        ),
        Keyword::PropertyNames(subschema) => {
            properties::property_names(subschema, instance, &location, instance_path, ctx)
        }
        Keyword::UnevaluatedProperties(subschema) => unevaluated::unevaluated_properties(
            subschema,
            instance,
            scope,
            &location,
            instance_path,
            ctx,
        ),
        Keyword::Items(kind) => {
            items::items(kind, instance, scope, &location, instance_path, ctx)
        }
        Keyword::PrefixItems(list) => {
            items::prefix_items(list, instance, scope, &location, instance_path, ctx)
        }
        Keyword::AdditionalItems(subschema) => {
            items::additional_items(subschema, instance, scope, &location, instance_path, ctx)
        }
        Keyword::Contains(subschema) => {
            contains::contains(subschema, parent, instance, scope, &location, instance_path, ctx)
        }
        Keyword::MinContains(limit) => {
            contains::min_contains(*limit, parent, instance, scope, &location, instance_path)
        }
        Keyword::MaxContains(limit) => {
            contains::max_contains(*limit, parent, instance, scope, &location, instance_path)
        }
        Keyword::UnevaluatedItems(subschema) => unevaluated::unevaluated_items(
            subschema,
            instance,
            scope,
            &location,
            instance_path,
            ctx,
        ),
        Keyword::Dependencies(entries) => {
            misc::dependencies(entries, instance, scope, &location, instance_path, ctx)
        }
        Keyword::DependentRequired(entries) => {
            misc::dependent_required(entries, instance, &location, instance_path)
        }
        Keyword::DependentSchemas(entries) => {
            misc::dependent_schemas(entries, instance, scope, &location, instance_path, ctx)
        }
        Keyword::Type(spec) => type_::type_(spec, instance, &location, instance_path),
        Keyword::Enum(options) => enum_::enum_(options, instance, &location, instance_path),
        Keyword::Const(expected) => enum_::const_(expected, instance, &location, instance_path),
        Keyword::Minimum(limit) => {
            numeric::minimum(limit, instance, &location, instance_path)
        }
        Keyword::Maximum(limit) => {
            numeric::maximum(limit, instance, &location, instance_path)
        }
        Keyword::ExclusiveMinimum(limit) => {
            numeric::exclusive_minimum(limit, instance, &location, instance_path)
        }
        Keyword::ExclusiveMaximum(limit) => {
            numeric::exclusive_maximum(limit, instance, &location, instance_path)
        }
        Keyword::MultipleOf(divisor) => {
            numeric::multiple_of(divisor, instance, &location, instance_path)
        }
        Keyword::MinLength(limit) => {
            strings::min_length(*limit, instance, &location, instance_path)
        }
        Keyword::MaxLength(limit) => {
            strings::max_length(*limit, instance, &location, instance_path)
        }
        Keyword::Pattern { pattern, source } => {
            strings::pattern(pattern, source, instance, &location, instance_path)
        }
        Keyword::MinItems(limit) => misc::min_items(*limit, instance, &location, instance_path),
        Keyword::MaxItems(limit) => misc::max_items(*limit, instance, &location, instance_path),
        Keyword::UniqueItems => misc::unique_items(instance, &location, instance_path),
        Keyword::MinProperties(limit) => {
            misc::min_properties(*limit, instance, &location, instance_path)
        }
        Keyword::MaxProperties(limit) => {
            misc::max_properties(*limit, instance, &location, instance_path)
        }
        Keyword::Required(names) => misc::required(names, instance, &location, instance_path),
        Keyword::Format(format) => {
            formats::format(format, instance, &location, instance_path, ctx)
        }
        Keyword::Ref(reference) => {
            references::ref_(reference, instance, scope, &location, instance_path, ctx)
        }
        Keyword::DynamicRef(reference) => {
            references::dynamic_ref(reference, instance, scope, &location, instance_path, ctx)
        }
        Keyword::RecursiveRef => {
            references::recursive_ref(instance, scope, &location, instance_path, ctx)
        }
        Keyword::Defs(_) => KeywordEvaluation::success(&location, instance_path, None),
        Keyword::ContentEncoding(encoding) => {
            content::content_encoding(encoding, instance, scope, &location, instance_path)
        }
        Keyword::ContentMediaType(media_type) => {
            content::content_media_type(media_type, instance, scope, &location, instance_path)
        }
        Keyword::ContentSchema(subschema) => {
            content::content_schema(subschema, parent, instance, &location, instance_path, ctx)
        }
        Keyword::Annotation(value) => {
            scope.annotate(&node.name, (**value).clone());
            KeywordEvaluation::annotation(&location, instance_path, (**value).clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"prefixItems": [{}], "items": {"type": "integer"}}), &json!([null, 2, 3, "foo"]), r#""foo" is not of type "integer""#)]
    #[test_case(&json!({"prefixItems": [{}, {}, {}], "items": false}), &json!([1, 2, 3, 4]), r#"False schema does not allow 4"#)]
    #[test_case(&json!({"properties": {"foo": {}, "bar": {}}, "patternProperties": {"^v": {}}, "additionalProperties": false}), &json!({"foo": 1, "bar": 2, "quux": "boom"}), r#"Additional properties are not allowed ('quux' was unexpected)"#)]
    #[test_case(&json!({"anyOf": [{"type": "integer"}, {"minimum": 2}]}), &json!(1.5), r#"1.5 is not valid under any of the schemas listed in the 'anyOf' keyword"#)]
    #[test_case(&json!({"const": 2}), &json!(5), r#"2 was expected"#)]
    #[test_case(&json!({"contains": {"minimum": 5}}), &json!([2, 3, 4]), r#"None of [2,3,4] are valid under the given schema"#)]
    #[test_case(&json!({"enum": [1, 2, 3]}), &json!(4), r#"4 is not one of [1,2,3]"#)]
    #[test_case(&json!({"exclusiveMaximum": 3}), &json!(3.0), r#"3.0 is greater than or equal to the maximum of 3"#)]
    #[test_case(&json!({"exclusiveMinimum": 1}), &json!(1.0), r#"1.0 is less than or equal to the minimum of 1"#)]
    #[test_case(&json!({"format": "ipv4"}), &json!("2001:0db8:85a3:0000:0000:8a2e:0370:7334"), r#""2001:0db8:85a3:0000:0000:8a2e:0370:7334" is not a "ipv4""#)]
    #[test_case(&json!({"maximum": 3}), &json!(3.5), r#"3.5 is greater than the maximum of 3"#)]
    #[test_case(&json!({"minimum": 3}), &json!(2.5), r#"2.5 is less than the minimum of 3"#)]
    #[test_case(&json!({"maxItems": 2}), &json!([1, 2, 3]), r#"[1,2,3] has more than 2 items"#)]
    #[test_case(&json!({"maxLength": 2}), &json!("foo"), r#""foo" is longer than 2 characters"#)]
    #[test_case(&json!({"minItems": 1}), &json!([]), r#"[] has less than 1 item"#)]
    #[test_case(&json!({"minLength": 2}), &json!("f"), r#""f" is shorter than 2 characters"#)]
    #[test_case(&json!({"minProperties": 1}), &json!({}), r#"{} has less than 1 property"#)]
    #[test_case(&json!({"multipleOf": 2}), &json!(7), r#"7 is not a multiple of 2"#)]
    #[test_case(&json!({"oneOf": [{"type": "integer"}, {"minimum": 2}]}), &json!(1.1), r#"1.1 is not valid under any of the schemas listed in the 'oneOf' keyword"#)]
    #[test_case(&json!({"oneOf": [{"type": "integer"}, {"minimum": 2}]}), &json!(3), r#"3 is valid under more than one of the schemas listed in the 'oneOf' keyword"#)]
    #[test_case(&json!({"pattern": "^a*$"}), &json!("abc"), r#""abc" does not match "^a*$""#)]
    #[test_case(&json!({"properties": {"foo": {}, "bar": {}}, "required": ["foo"]}), &json!({"bar": 1}), r#""foo" is a required property"#)]
    #[test_case(&json!({"type": "integer"}), &json!(1.1), r#"1.1 is not of type "integer""#)]
    #[test_case(&json!({"type": ["integer", "string"]}), &json!(null), r#"null is not of types "integer", "string""#)]
    #[test_case(&json!({"uniqueItems": true}), &json!([1, 1]), r#"[1,1] has non-unique elements (items at indices 0 and 1 are equal)"#)]
    fn error_message(schema: &Value, instance: &Value, expected: &str) {
        let validator = crate::options()
            .require_format_validation(true)
            .build(schema)
            .expect("Invalid schema");
        let errors: Vec<_> = validator.iter_errors(instance).collect::<Vec<_>>();
        assert_eq!(errors[0].to_string(), expected);
    }

    #[test_case(&json!({"additionalProperties": {"type": "string"}}))]
    #[test_case(&json!({"additionalProperties": false}))]
    #[test_case(&json!({"contains": {"minimum": 5}}))]
    #[test_case(&json!({"dependencies": {"bar": ["foo"]}}))]
    #[test_case(&json!({"exclusiveMaximum": 5}))]
    #[test_case(&json!({"format": "ipv4"}))]
    #[test_case(&json!({"maximum": 2}))]
    #[test_case(&json!({"maxItems": 2}))]
    #[test_case(&json!({"multipleOf": 2.5}))]
    #[test_case(&json!({"required": ["a"]}))]
    #[test_case(&json!({"pattern": "^a"}))]
    #[test_case(&json!({"patternProperties": {"f.*o": {"type": "integer"}}}))]
    #[test_case(&json!({"propertyNames": {"maxLength": 3}}))]
    fn inapplicable_kind_is_ignored(schema: &Value) {
        let instance = json!(null);
        assert!(crate::options()
            .require_format_validation(true)
            .build(schema)
            .expect("Invalid schema")
            .is_valid(&instance));
    }
}
