//! URI plumbing: joining references against base URIs and splitting fragments.
use fluent_uri::{Uri, UriRef};
use once_cell::sync::Lazy;

use crate::error::{BuildError, UriError};

/// The base URI assumed for schemas registered without any identifier.
pub(crate) static DEFAULT_ROOT_URI: Lazy<Uri<String>> =
    Lazy::new(|| Uri::parse("json-schema:///".to_string()).expect("Invalid URI"));

/// Resolves the URI reference against the given base URI.
///
/// RFC 3986 merging handles the "folder" rule: a sibling reference resolves
/// against the parent of a base that does not end in `/`.
///
/// # Errors
///
/// Returns an error if the reference does not parse or cannot be resolved.
pub fn resolve_against(base: &Uri<&str>, reference: &str) -> Result<Uri<String>, UriError> {
    Ok(UriRef::parse(reference)
        .map_err(|error| UriError::parse(reference, error))?
        .resolve_against(base)
        .map_err(|error| UriError::resolve(reference, error))?
        .normalize())
}

/// Parses an absolute URI, resolving relative input against the default root.
///
/// # Errors
///
/// Returns an error if the input is not a valid URI-reference.
pub fn from_str(uri: &str) -> Result<Uri<String>, UriError> {
    let uriref = UriRef::parse(uri)
        .map_err(|error| UriError::parse(uri, error))?
        .normalize();
    if uriref.has_scheme() {
        Uri::try_from(uriref.as_str())
            .map(|uri| uri.into())
            .map_err(|error| UriError::parse(uriref.as_str(), error))
    } else {
        uriref
            .resolve_against(&DEFAULT_ROOT_URI.borrow())
            .map_err(|error| UriError::resolve(uri, error))
    }
}

/// Split a URI-reference into its base and fragment parts.
///
/// The fragment comes back without the leading `#`; a reference without `#`
/// has an empty fragment.
pub(crate) fn split_fragment(reference: &str) -> (&str, &str) {
    match reference.split_once('#') {
        Some((base, fragment)) => (base, fragment),
        None => (reference, ""),
    }
}

/// The canonical, fragmentless form of a URI used as a registry key.
pub(crate) fn canonical(uri: &Uri<String>) -> &str {
    let s = uri.as_str();
    s.split_once('#').map_or(s, |(base, _)| base)
}

/// Resolve a schema identifier against the current base.
///
/// Identifiers must not carry a non-empty fragment; the drafts reserve
/// fragments for anchors and pointers.
pub(crate) fn resolve_id(base: &Uri<String>, id: &str) -> Result<Uri<String>, BuildError> {
    let (raw, fragment) = split_fragment(id);
    if !fragment.is_empty() {
        return Err(BuildError::invalid_id(id));
    }
    resolve_against(&base.borrow(), raw).map_err(|_| BuildError::invalid_id(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("https://example.com/root", "other", "https://example.com/other"; "sibling resolves against the parent folder")]
    #[test_case("https://example.com/dir/", "other", "https://example.com/dir/other"; "folder base keeps the folder")]
    #[test_case("https://example.com/root", "https://other.com/x", "https://other.com/x"; "absolute reference wins")]
    #[test_case("https://example.com/a/b", "../c", "https://example.com/c"; "dot segments normalize")]
    fn resolution(base: &str, reference: &str, expected: &str) {
        let base = from_str(base).expect("Invalid base");
        let resolved = resolve_against(&base.borrow(), reference).expect("Resolution failed");
        assert_eq!(resolved.as_str(), expected);
    }

    #[test_case("https://a/#frag", ("https://a/", "frag"))]
    #[test_case("https://a/", ("https://a/", ""))]
    #[test_case("#/defs/x", ("", "/defs/x"))]
    fn fragments(reference: &str, expected: (&str, &str)) {
        assert_eq!(split_fragment(reference), expected);
    }

    #[test]
    fn relative_input_uses_default_root() {
        let uri = from_str("folder/schema.json").expect("Invalid URI");
        assert_eq!(uri.as_str(), "json-schema:///folder/schema.json");
    }

    #[test]
    fn id_with_fragment_is_rejected() {
        let base = from_str("https://example.com/root").expect("Invalid base");
        assert!(resolve_id(&base, "other#frag").is_err());
        assert!(resolve_id(&base, "other").is_ok());
    }
}
