//! The schema registry: stores built schema trees by absolute URI, together
//! with their draft, vocabulary set and anchor indexes.
use std::sync::Arc;

use ahash::AHashMap;
use fluent_uri::Uri;
use serde_json::Value;

use crate::{
    builder::{self, ResourceRecord},
    drafts::Draft,
    error::BuildError,
    schema::Schema,
    uri,
    vocabularies::VocabularySet,
};

/// One registered schema resource.
#[derive(Debug)]
pub(crate) struct ResourceEntry {
    pub(crate) uri: Uri<String>,
    /// The whole document tree this resource lives in. Subresources created
    /// by nested `$id` alias into the same tree.
    pub(crate) root: Arc<Schema>,
    /// Pointer from the document root to this resource.
    pub(crate) location: Box<str>,
    pub(crate) draft: Draft,
    pub(crate) vocabularies: VocabularySet,
    /// Anchor name to pointer from the document root.
    pub(crate) anchors: AHashMap<Box<str>, Box<str>>,
    pub(crate) dynamic_anchors: AHashMap<Box<str>, Box<str>>,
    pub(crate) recursive_anchor: bool,
}

impl ResourceEntry {
    /// The schema at the resource root.
    pub(crate) fn schema(&self) -> Option<&Schema> {
        self.root.resolve_pointer(&self.location)
    }
}

/// A long-lived, append-only store of schemas indexed by canonical URI.
///
/// Registration walks each document eagerly: nested `$id` subresources,
/// anchors and dynamic anchors become immediately resolvable. The registry is
/// read-only during validation; concurrent validations may share it freely.
#[derive(Debug, Default)]
pub struct Registry {
    default_draft: Draft,
    entries: AHashMap<String, Arc<ResourceEntry>>,
}

impl Registry {
    /// An empty registry interpreting `$schema`-less documents as the latest
    /// draft.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty registry with the given fallback draft.
    #[must_use]
    pub fn with_draft(draft: Draft) -> Self {
        Registry {
            default_draft: draft,
            entries: AHashMap::new(),
        }
    }

    /// Store a schema document and index its subresources and anchors.
    ///
    /// The document is registered under its `$id`, under `uri` when given,
    /// and under the default base URI when neither is present. Returns the
    /// URI validation should start from.
    ///
    /// # Errors
    ///
    /// On a malformed schema, or when any absolute URI involved is already
    /// registered.
    pub fn register(
        &mut self,
        contents: &Value,
        registered_under: Option<&str>,
    ) -> Result<Uri<String>, BuildError> {
        let draft = self.default_draft.detect(contents)?;
        let explicit = registered_under.map(uri::from_str).transpose()?;
        let default_base = explicit
            .clone()
            .unwrap_or_else(|| uri::DEFAULT_ROOT_URI.clone());
        let (schema, records) = builder::build_schema(contents, draft, default_base)?;
        let root = Arc::new(schema);
        let root_uri = records[0].uri.clone();

        let mut additions: Vec<(String, Arc<ResourceEntry>)> = Vec::with_capacity(records.len() + 1);
        for record in records {
            let key = uri::canonical(&record.uri).to_string();
            additions.push((key, Arc::new(entry_from_record(record, &root, draft))));
        }
        if let Some(explicit) = explicit {
            let key = uri::canonical(&explicit).to_string();
            if additions.iter().all(|(existing, _)| existing != &key) {
                let alias = ResourceEntry {
                    uri: explicit,
                    ..clone_entry(&additions[0].1)
                };
                additions.push((key, Arc::new(alias)));
            }
        }
        let mut seen = ahash::AHashSet::new();
        for (key, _) in &additions {
            if self.entries.contains_key(key) || !seen.insert(key.clone()) {
                return Err(BuildError::duplicate_uri(key.clone()));
            }
        }
        tracing::debug!(
            uri = root_uri.as_str(),
            ?draft,
            resources = additions.len(),
            "registered schema"
        );
        self.entries.extend(additions);
        Ok(root_uri)
    }

    /// The resource registered under the given URI, ignoring any fragment.
    pub(crate) fn entry(&self, uri: &Uri<String>) -> Option<&Arc<ResourceEntry>> {
        self.entries.get(uri::canonical(uri))
    }

    pub(crate) fn entry_by_str(&self, uri: &str) -> Option<&Arc<ResourceEntry>> {
        let key = uri.split_once('#').map_or(uri, |(base, _)| base);
        self.entries.get(key)
    }

    /// Whether the resource at `uri` defines a dynamic anchor with this name.
    #[must_use]
    pub fn dynamic_scope_defines_anchor(&self, uri: &str, anchor: &str) -> bool {
        self.entry_by_str(uri)
            .is_some_and(|entry| entry.dynamic_anchors.contains_key(anchor))
    }

    /// The URIs of all registered resources, in unspecified order.
    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

fn entry_from_record(record: ResourceRecord, root: &Arc<Schema>, draft: Draft) -> ResourceEntry {
    let vocabularies = record
        .vocabularies
        .unwrap_or_else(|| draft.default_vocabularies());
    ResourceEntry {
        uri: record.uri,
        root: Arc::clone(root),
        location: record.location,
        draft,
        vocabularies,
        anchors: record.anchors,
        dynamic_anchors: record.dynamic_anchors,
        recursive_anchor: record.recursive_anchor,
    }
}

fn clone_entry(entry: &ResourceEntry) -> ResourceEntry {
    ResourceEntry {
        uri: entry.uri.clone(),
        root: Arc::clone(&entry.root),
        location: entry.location.clone(),
        draft: entry.draft,
        vocabularies: entry.vocabularies.clone(),
        anchors: entry.anchors.clone(),
        dynamic_anchors: entry.dynamic_anchors.clone(),
        recursive_anchor: entry.recursive_anchor,
    }
}
