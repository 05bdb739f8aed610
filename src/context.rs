//! The per-validation context threaded through the engine.
use std::sync::Arc;

use ahash::AHashSet;
use fluent_uri::Uri;

use crate::{
    drafts::Draft,
    options::ValidationOptions,
    registry::{Registry, ResourceEntry},
};

/// Everything one top-level validation call mutates along its active stack:
/// the lexical base URI, the dynamic-scope stack of URIs entered through
/// reference traversal, the visited-reference set for cycle detection, and
/// the evaluation depth.
pub(crate) struct EvalContext<'a> {
    pub(crate) registry: &'a Registry,
    pub(crate) options: &'a ValidationOptions,
    /// The resource currently providing draft, vocabularies and anchors.
    pub(crate) entry: Arc<ResourceEntry>,
    pub(crate) base_uri: Uri<String>,
    /// Outermost first. Grows on reference traversal and shrinks when the
    /// schema evaluation that performed the traversal completes.
    pub(crate) dynamic_scope: Vec<Uri<String>>,
    /// Keyed by (canonical absolute reference, instance fingerprint); an
    /// entry lives exactly as long as the traversal it guards.
    pub(crate) visited: AHashSet<(String, u64)>,
    pub(crate) depth: usize,
    /// `flag` output: short-circuiting is permitted.
    pub(crate) flag_mode: bool,
    /// Suppresses short-circuits that would lose annotations an
    /// `unevaluated*` consumer later needs.
    pub(crate) collect_annotations: bool,
}

/// Saved lexical state to restore when leaving a rebased subtree.
pub(crate) struct LexicalFrame {
    prior_base: Uri<String>,
    prior_entry: Option<Arc<ResourceEntry>>,
}

impl<'a> EvalContext<'a> {
    pub(crate) fn new(
        registry: &'a Registry,
        options: &'a ValidationOptions,
        entry: Arc<ResourceEntry>,
        flag_mode: bool,
    ) -> Self {
        let base_uri = entry.uri.clone();
        EvalContext {
            registry,
            options,
            entry,
            base_uri: base_uri.clone(),
            dynamic_scope: vec![base_uri],
            visited: AHashSet::new(),
            depth: 0,
            flag_mode,
            collect_annotations: !flag_mode,
        }
    }

    pub(crate) fn draft(&self) -> Draft {
        self.entry.draft
    }

    /// Switch the lexical base when entering a subschema with its own `$id`,
    /// returning the state to restore on exit.
    pub(crate) fn rebase_lexical(&mut self, base: &Uri<String>) -> LexicalFrame {
        let prior_base = std::mem::replace(&mut self.base_uri, base.clone());
        let prior_entry = self
            .registry
            .entry(base)
            .map(|entry| std::mem::replace(&mut self.entry, Arc::clone(entry)));
        LexicalFrame {
            prior_base,
            prior_entry,
        }
    }

    pub(crate) fn restore_lexical(&mut self, frame: LexicalFrame) {
        self.base_uri = frame.prior_base;
        if let Some(entry) = frame.prior_entry {
            self.entry = entry;
        }
    }
}
