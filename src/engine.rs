//! The evaluation engine: walks a schema against an instance, running
//! keywords in priority order, merging their results with AND and
//! consolidating annotations from applicators.
use ahash::AHashMap;
use serde_json::Value;

use crate::{
    context::EvalContext,
    equality,
    error::ValidationErrorKind,
    keywords,
    output::OutputNode,
    paths::{LazyLocation, SchemaLocation},
    schema::Schema,
};

/// The result of one keyword contract: an output node whose `valid` flag is
/// merged into the schema verdict with AND.
pub(crate) type KeywordEvaluation = OutputNode;

/// Annotations keyed by keyword name.
pub(crate) type AnnotationMap = AHashMap<Box<str>, Value>;

/// The annotation state of one schema evaluation.
///
/// `direct` holds annotations produced by this schema's own keywords,
/// visible to later-priority siblings (`additionalProperties` and friends).
/// `consolidated` holds annotations merged from in-place applicators whose
/// subschemas validated the same instance location; `unevaluated*` consumers
/// see the union of both.
pub(crate) struct Scope {
    pub(crate) direct: AnnotationMap,
    pub(crate) consolidated: AnnotationMap,
    /// Outcome of a sibling `if`, consumed by `then` and `else`.
    pub(crate) if_outcome: Option<bool>,
}

impl Scope {
    pub(crate) fn new() -> Self {
        Scope {
            direct: AnnotationMap::new(),
            consolidated: AnnotationMap::new(),
            if_outcome: None,
        }
    }

    /// Record an annotation produced by one of this schema's own keywords.
    pub(crate) fn annotate(&mut self, keyword: &str, value: Value) {
        merge_annotation(&mut self.direct, keyword, value);
    }

    /// Merge the annotations of a successfully applied in-place applicator.
    pub(crate) fn consolidate(&mut self, annotations: &AnnotationMap) {
        for (keyword, value) in annotations {
            merge_annotation(&mut self.consolidated, keyword, value.clone());
        }
    }

    /// Property names covered by this schema's own `properties` and
    /// `patternProperties` keywords.
    pub(crate) fn direct_property_names(&self) -> ahash::AHashSet<&str> {
        let mut names = ahash::AHashSet::new();
        for keyword in ["properties", "patternProperties"] {
            collect_names(self.direct.get(keyword), &mut names);
        }
        names
    }

    /// Property names evaluated by this schema or anything consolidated into
    /// it.
    pub(crate) fn evaluated_property_names(&self) -> ahash::AHashSet<&str> {
        let mut names = ahash::AHashSet::new();
        for keyword in [
            "properties",
            "patternProperties",
            "additionalProperties",
            "unevaluatedProperties",
        ] {
            collect_names(self.direct.get(keyword), &mut names);
            collect_names(self.consolidated.get(keyword), &mut names);
        }
        names
    }

    /// The item-index coverage from positional and whole-array keywords.
    pub(crate) fn evaluated_items(&self) -> ItemsCoverage {
        let mut coverage = ItemsCoverage::None;
        for keyword in [
            "prefixItems",
            "items",
            "additionalItems",
            "unevaluatedItems",
        ] {
            coverage = coverage.merge(self.direct.get(keyword));
            coverage = coverage.merge(self.consolidated.get(keyword));
        }
        coverage
    }

    /// Indices matched by `contains`, from this schema or consolidated.
    pub(crate) fn contains_indices(&self) -> Vec<usize> {
        let mut indices = Vec::new();
        for map in [&self.direct, &self.consolidated] {
            if let Some(Value::Array(items)) = map.get("contains") {
                indices.extend(items.iter().filter_map(Value::as_u64).map(|idx| idx as usize));
            }
        }
        indices
    }

    /// Indices matched by this schema's own `contains` keyword.
    pub(crate) fn direct_contains(&self) -> Option<usize> {
        match self.direct.get("contains") {
            Some(Value::Array(items)) => Some(items.len()),
            _ => None,
        }
    }

    fn into_annotations(mut self) -> AnnotationMap {
        for (keyword, value) in self.consolidated {
            merge_annotation(&mut self.direct, &keyword, value);
        }
        self.direct
    }
}

/// How far along an array the item-applicator annotations reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ItemsCoverage {
    None,
    /// Indices below the bound are covered.
    UpTo(usize),
    All,
}

impl ItemsCoverage {
    fn merge(self, annotation: Option<&Value>) -> Self {
        match (self, annotation) {
            (ItemsCoverage::All, _) | (_, Some(Value::Bool(true))) => ItemsCoverage::All,
            (current, Some(Value::Number(bound))) => {
                let bound = bound.as_u64().unwrap_or(0) as usize;
                match current {
                    ItemsCoverage::UpTo(existing) if existing >= bound => current,
                    _ => ItemsCoverage::UpTo(bound),
                }
            }
            (current, _) => current,
        }
    }

    pub(crate) fn covers(self, idx: usize) -> bool {
        match self {
            ItemsCoverage::None => false,
            ItemsCoverage::UpTo(bound) => idx < bound,
            ItemsCoverage::All => true,
        }
    }
}

fn collect_names<'s>(annotation: Option<&'s Value>, into: &mut ahash::AHashSet<&'s str>) {
    if let Some(Value::Array(names)) = annotation {
        into.extend(names.iter().filter_map(Value::as_str));
    }
}

/// Union-merge one annotation value into a map: name and index sets join,
/// `true` dominates numeric item coverage, scalars take the latest value.
fn merge_annotation(map: &mut AnnotationMap, keyword: &str, value: Value) {
    match map.get_mut(keyword) {
        None => {
            map.insert(keyword.into(), value);
        }
        Some(existing) => match (existing, value) {
            (Value::Array(existing), Value::Array(incoming)) => {
                for item in incoming {
                    if !existing.iter().any(|present| equality::equal(present, &item)) {
                        existing.push(item);
                    }
                }
            }
            (Value::Bool(true), _) => {}
            (existing @ Value::Number(_), incoming @ Value::Bool(true)) => {
                *existing = incoming;
            }
            (existing @ Value::Number(_), Value::Number(incoming)) => {
                let current = existing.as_u64().unwrap_or(0);
                if incoming.as_u64().unwrap_or(0) > current {
                    *existing = Value::Number(incoming);
                }
            }
            (existing, incoming) => *existing = incoming,
        },
    }
}

/// A schema evaluation: the output subtree plus the annotations this scope
/// exposes to whoever applied it.
pub(crate) struct Evaluation {
    pub(crate) node: OutputNode,
    pub(crate) annotations: AnnotationMap,
}

impl Evaluation {
    pub(crate) fn valid(&self) -> bool {
        self.node.valid
    }
}

/// Evaluate a schema against an instance.
pub(crate) fn evaluate(
    schema: &Schema,
    instance: &Value,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
    ctx: &mut EvalContext<'_>,
) -> Evaluation {
    match schema {
        Schema::Bool(true) => Evaluation {
            node: OutputNode::success(location, instance_path, None),
            annotations: AnnotationMap::new(),
        },
        Schema::Bool(false) => Evaluation {
            node: OutputNode::failure(
                location,
                instance_path,
                instance,
                ValidationErrorKind::FalseSchema,
            ),
            annotations: AnnotationMap::new(),
        },
        Schema::Object(object) => {
            if ctx.depth >= ctx.options.max_depth {
                return Evaluation {
                    node: OutputNode::failure(
                        location,
                        instance_path,
                        instance,
                        ValidationErrorKind::MaxDepthReached {
                            limit: ctx.options.max_depth,
                        },
                    ),
                    annotations: AnnotationMap::new(),
                };
            }
            ctx.depth += 1;
            let lexical = match &object.base_uri {
                Some(base) if *base != ctx.base_uri => Some(ctx.rebase_lexical(base)),
                _ => None,
            };
            let location = match (&object.base_uri, &lexical) {
                (Some(_), Some(_)) => location.rebase(
                    Some(std::sync::Arc::new(ctx.base_uri.clone())),
                    crate::paths::Location::default(),
                ),
                _ => location.clone(),
            };
            let saved_collect = ctx.collect_annotations;
            if object.needs_annotations {
                ctx.collect_annotations = true;
            }
            let scope_depth = ctx.dynamic_scope.len();

            let mut scope = Scope::new();
            let mut children = Vec::with_capacity(object.keywords.len());
            let mut valid = true;
            for node in &object.keywords {
                if !keywords::applies(node, ctx.draft(), &ctx.entry.vocabularies) {
                    continue;
                }
                if ctx.flag_mode && !valid {
                    // The verdict cannot change back; remaining keywords can
                    // only add diagnostics the flag format never shows.
                    break;
                }
                let result = keywords::dispatch(
                    node,
                    object,
                    instance,
                    &mut scope,
                    &location,
                    instance_path,
                    ctx,
                );
                valid &= result.valid;
                children.push(result);
            }

            ctx.dynamic_scope.truncate(scope_depth);
            ctx.collect_annotations = saved_collect;
            if let Some(frame) = lexical {
                ctx.restore_lexical(frame);
            }
            ctx.depth -= 1;
            tracing::trace!(
                depth = ctx.depth + ctx.options.log_indent_level,
                valid,
                location = %location.relative,
                "schema evaluated"
            );

            if valid {
                Evaluation {
                    node: OutputNode::success(&location, instance_path, None)
                        .with_children(children),
                    annotations: scope.into_annotations(),
                }
            } else {
                Evaluation {
                    node: OutputNode::invalid_children(&location, instance_path, children),
                    annotations: AnnotationMap::new(),
                }
            }
        }
    }
}
