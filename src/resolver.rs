//! Reference resolution: turning a `(base URI, fragment)` pair into a target
//! schema under the lexical and dynamic scopes.
use std::sync::Arc;

use fluent_uri::Uri;

use crate::{
    error::ResolveError,
    paths,
    registry::{Registry, ResourceEntry},
    schema::Schema,
    uri,
};

/// A reference resolved to a schema within a registered resource.
#[derive(Debug)]
pub(crate) struct ResolvedTarget<'r> {
    pub(crate) schema: &'r Schema,
    /// The entry providing the base URI, draft and vocabularies for
    /// evaluation of the target.
    pub(crate) entry: &'r Arc<ResourceEntry>,
    /// Pointer from the target entry's document root to the schema.
    pub(crate) location: Box<str>,
    /// The canonical absolute form of the reference, used to key the
    /// visited-reference set.
    pub(crate) absolute: String,
}

/// Whether a fragment is an anchor name rather than a JSON Pointer.
pub(crate) fn is_anchor_name(fragment: &str) -> bool {
    let mut chars = fragment.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '.' | '_'))
}

/// Resolve a static reference (`$ref`) against the current base URI.
pub(crate) fn resolve_reference<'r>(
    registry: &'r Registry,
    current_base: &Uri<String>,
    reference: &str,
) -> Result<ResolvedTarget<'r>, ResolveError> {
    let (base, fragment) = uri::split_fragment(reference);
    let target_uri = target_uri(current_base, base, reference)?;
    lookup(registry, &target_uri, fragment)
}

/// Resolve `$dynamicRef`: when the dynamic scope defines a dynamic anchor
/// with the fragment name, the scope is searched from the outermost URI
/// inwards and the outermost resource defining that anchor wins. Otherwise
/// the reference falls back to a static lookup against the target.
pub(crate) fn resolve_dynamic_reference<'r>(
    registry: &'r Registry,
    current_base: &Uri<String>,
    reference: &str,
    dynamic_scope: &[Uri<String>],
) -> Result<ResolvedTarget<'r>, ResolveError> {
    let (base, fragment) = uri::split_fragment(reference);
    let target_uri = target_uri(current_base, base, reference)?;
    if is_anchor_name(fragment) {
        for scope_uri in dynamic_scope {
            if let Some(entry) = registry.entry(scope_uri) {
                if entry.dynamic_anchors.contains_key(fragment) {
                    return lookup(registry, &entry.uri.clone(), fragment);
                }
            }
        }
    }
    lookup(registry, &target_uri, fragment)
}

/// Resolve `$recursiveRef: "#"`: when the current resource carries
/// `$recursiveAnchor: true`, the outermost resource in the dynamic scope that
/// also carries it wins; otherwise the current resource itself is the target.
pub(crate) fn resolve_recursive_reference<'r>(
    registry: &'r Registry,
    current_base: &Uri<String>,
    dynamic_scope: &[Uri<String>],
) -> Result<ResolvedTarget<'r>, ResolveError> {
    let current = registry
        .entry(current_base)
        .ok_or_else(|| ResolveError::UnresolvedUri {
            uri: current_base.as_str().to_string(),
        })?;
    if current.recursive_anchor {
        for scope_uri in dynamic_scope {
            if let Some(entry) = registry.entry(scope_uri) {
                if entry.recursive_anchor {
                    return lookup(registry, &entry.uri.clone(), "");
                }
            }
        }
    }
    let uri = current.uri.clone();
    lookup(registry, &uri, "")
}

fn target_uri(
    current_base: &Uri<String>,
    base: &str,
    reference: &str,
) -> Result<Uri<String>, ResolveError> {
    if base.is_empty() {
        Ok(current_base.clone())
    } else {
        uri::resolve_against(&current_base.borrow(), base).map_err(|_| {
            ResolveError::InvalidReference {
                reference: reference.to_string(),
            }
        })
    }
}

fn lookup<'r>(
    registry: &'r Registry,
    target: &Uri<String>,
    fragment: &str,
) -> Result<ResolvedTarget<'r>, ResolveError> {
    let entry = registry
        .entry(target)
        .ok_or_else(|| ResolveError::UnresolvedUri {
            uri: target.as_str().to_string(),
        })?;
    let absolute = format!("{}#{fragment}", uri::canonical(target));
    let location: Box<str> = if fragment.is_empty() {
        entry.location.clone()
    } else if is_anchor_name(fragment) {
        entry
            .anchors
            .get(fragment)
            .cloned()
            .ok_or_else(|| ResolveError::UnresolvedAnchor {
                uri: target.as_str().to_string(),
                anchor: fragment.to_string(),
            })?
    } else {
        let tokens =
            paths::parse_fragment(fragment).ok_or_else(|| ResolveError::UnparseableFragment {
                fragment: fragment.to_string(),
            })?;
        let mut location = entry.location.to_string();
        for token in &tokens {
            location.push('/');
            for ch in token.chars() {
                match ch {
                    '~' => location.push_str("~0"),
                    '/' => location.push_str("~1"),
                    _ => location.push(ch),
                }
            }
        }
        location.into()
    };
    let schema = entry
        .root
        .resolve_pointer(&location)
        .ok_or_else(|| ResolveError::PointerToNowhere {
            pointer: format!("#{fragment}"),
        })?;
    Ok(ResolvedTarget {
        schema,
        entry,
        location,
        absolute,
    })
}

#[cfg(test)]
mod tests {
    use super::{is_anchor_name, resolve_dynamic_reference, resolve_reference};
    use crate::{registry::Registry, uri};
    use serde_json::json;
    use test_case::test_case;

    #[test_case("foo", true; "foo")]
    #[test_case("_bar", true; "underscore_bar")]
    #[test_case("a-b.c_d", true; "a_b_c_d")]
    #[test_case("", false; "empty")]
    #[test_case("1abc", false; "leading_digit")]
    #[test_case("/a/b", false; "leading_slash_a_b")]
    #[test_case("a/b", false; "a_slash_b")]
    fn anchor_names(fragment: &str, expected: bool) {
        assert_eq!(is_anchor_name(fragment), expected);
    }

    #[test]
    fn resolves_pointer_fragments() {
        let mut registry = Registry::new();
        let root = registry
            .register(
                &json!({"$id": "https://example.com/root", "$defs": {"pos": {"type": "integer"}}}),
                None,
            )
            .expect("Registration failed");
        let target =
            resolve_reference(&registry, &root, "#/$defs/pos").expect("Resolution failed");
        assert!(target.schema.as_object().is_some());
        assert_eq!(target.absolute, "https://example.com/root#/$defs/pos");
    }

    #[test]
    fn resolves_anchors() {
        let mut registry = Registry::new();
        let root = registry
            .register(
                &json!({"$id": "https://example.com/root", "$defs": {"a": {"$anchor": "mark", "type": "string"}}}),
                None,
            )
            .expect("Registration failed");
        assert!(resolve_reference(&registry, &root, "#mark").is_ok());
        let error = resolve_reference(&registry, &root, "#missing").expect_err("Must fail");
        assert_eq!(
            error.to_string(),
            "Anchor 'missing' does not exist within 'https://example.com/root'"
        );
    }

    #[test]
    fn resolves_across_documents_via_parent_folder() {
        let mut registry = Registry::new();
        registry
            .register(&json!({"$id": "https://example.com/a/root", "type": "integer"}), None)
            .expect("Registration failed");
        registry
            .register(&json!({"$id": "https://example.com/a/other", "$ref": "root"}), None)
            .expect("Registration failed");
        let base = uri::from_str("https://example.com/a/other").expect("Invalid URI");
        let target = resolve_reference(&registry, &base, "root").expect("Resolution failed");
        assert_eq!(target.entry.uri.as_str(), "https://example.com/a/root");
    }

    #[test]
    fn dynamic_reference_prefers_the_outermost_scope() {
        let mut registry = Registry::new();
        registry
            .register(
                &json!({"$id": "https://a/", "$dynamicAnchor": "T", "type": "string"}),
                None,
            )
            .expect("Registration failed");
        registry
            .register(
                &json!({"$id": "https://b/", "$dynamicAnchor": "T", "type": "integer"}),
                None,
            )
            .expect("Registration failed");
        let base = uri::from_str("https://a/").expect("Invalid URI");
        let scope = [
            uri::from_str("https://b/").expect("Invalid URI"),
            uri::from_str("https://a/").expect("Invalid URI"),
        ];
        let target = resolve_dynamic_reference(&registry, &base, "#T", &scope)
            .expect("Resolution failed");
        assert_eq!(target.entry.uri.as_str(), "https://b/");
    }

    #[test]
    fn unresolved_uri_is_reported() {
        let registry = Registry::new();
        let base = uri::from_str("https://example.com/none").expect("Invalid URI");
        let error = resolve_reference(&registry, &base, "#").expect_err("Must fail");
        assert_eq!(
            error.to_string(),
            "Resource 'https://example.com/none' is not present in the registry"
        );
    }
}
