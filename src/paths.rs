//! Locations within schemas and instances, plus RFC 6901 pointer parsing.
use std::{borrow::Cow, fmt, fmt::Write, slice::Iter, sync::Arc};

use fluent_uri::Uri;
use percent_encoding::percent_decode_str;

/// A key within a JSON object or an index within a JSON array.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LocationSegment {
    /// Property name within a JSON object, or a schema keyword.
    Property(Box<str>),
    /// Index within a JSON array.
    Index(usize),
}

impl From<&str> for LocationSegment {
    #[inline]
    fn from(value: &str) -> Self {
        LocationSegment::Property(value.into())
    }
}

impl From<String> for LocationSegment {
    #[inline]
    fn from(value: String) -> Self {
        LocationSegment::Property(value.into_boxed_str())
    }
}

impl From<usize> for LocationSegment {
    #[inline]
    fn from(value: usize) -> Self {
        LocationSegment::Index(value)
    }
}

/// A JSON Pointer as a sequence of segments.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Location(Vec<LocationSegment>);

impl Location {
    /// Iterate over the underlying path segments.
    pub fn iter(&self) -> Iter<'_, LocationSegment> {
        self.0.iter()
    }

    #[must_use]
    pub(crate) fn join(&self, segment: impl Into<LocationSegment>) -> Self {
        let mut next = self.clone();
        next.0.push(segment.into());
        next
    }

    /// The pointer as a vector of strings, one per segment.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.0
            .into_iter()
            .map(|segment| match segment {
                LocationSegment::Property(value) => value.into_string(),
                LocationSegment::Index(idx) => idx.to_string(),
            })
            .collect()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            f.write_char('/')?;
            match segment {
                LocationSegment::Property(value) => {
                    for ch in value.chars() {
                        match ch {
                            '/' => f.write_str("~1")?,
                            '~' => f.write_str("~0")?,
                            _ => f.write_char(ch)?,
                        }
                    }
                }
                LocationSegment::Index(idx) => f.write_str(itoa::Buffer::new().format(*idx))?,
            }
        }
        Ok(())
    }
}

impl serde::Serialize for Location {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl From<&[&str]> for Location {
    fn from(path: &[&str]) -> Self {
        Location(path.iter().map(|item| (*item).into()).collect())
    }
}

impl Location {
    /// Rebuild a location from an RFC 6901 pointer produced by this crate.
    pub(crate) fn from_pointer(pointer: &str) -> Self {
        match parse_pointer(pointer) {
            Some(tokens) => Location(tokens.into_iter().map(Into::into).collect()),
            None => Location::default(),
        }
    }
}

/// Parse an RFC 6901 pointer (`/a/0/b`, with `~0`/`~1` escapes) into its
/// reference tokens. A fragment-form pointer must be stripped of the leading
/// `#` and percent-decoded first; see [`parse_fragment`].
pub(crate) fn parse_pointer(pointer: &str) -> Option<Vec<String>> {
    if pointer.is_empty() {
        return Some(Vec::new());
    }
    if !pointer.starts_with('/') {
        return None;
    }
    let mut tokens = Vec::new();
    for token in pointer.split('/').skip(1) {
        let mut unescaped = String::with_capacity(token.len());
        let mut chars = token.chars();
        while let Some(ch) = chars.next() {
            if ch == '~' {
                match chars.next() {
                    Some('0') => unescaped.push('~'),
                    Some('1') => unescaped.push('/'),
                    _ => return None,
                }
            } else {
                unescaped.push(ch);
            }
        }
        tokens.push(unescaped);
    }
    Some(tokens)
}

/// Parse a URI fragment holding a JSON Pointer, undoing percent-encoding.
pub(crate) fn parse_fragment(fragment: &str) -> Option<Vec<String>> {
    let decoded: Cow<'_, str> = percent_decode_str(fragment).decode_utf8().ok()?;
    parse_pointer(&decoded)
}

/// A node in a linked list of instance path segments.
///
/// Built incrementally on the stack during evaluation so that descending into
/// a property or item never allocates; materialized into a [`Location`] only
/// when an error or annotation is recorded.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct LazyLocation<'a, 'b> {
    pub(crate) segment: LazySegment<'a>,
    pub(crate) parent: Option<&'b LazyLocation<'b, 'a>>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum LazySegment<'a> {
    Property(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for LazySegment<'a> {
    #[inline]
    fn from(value: &'a str) -> Self {
        LazySegment::Property(value)
    }
}

impl From<usize> for LazySegment<'_> {
    #[inline]
    fn from(value: usize) -> Self {
        LazySegment::Index(value)
    }
}

impl Default for LazyLocation<'_, '_> {
    fn default() -> Self {
        LazyLocation::new()
    }
}

impl<'a, 'b> LazyLocation<'a, 'b> {
    /// The root of an instance path.
    pub(crate) const fn new() -> Self {
        LazyLocation {
            // Never read; the root is identified by the missing parent.
            segment: LazySegment::Index(0),
            parent: None,
        }
    }

    #[inline]
    pub(crate) fn push(&'a self, segment: impl Into<LazySegment<'a>>) -> Self {
        LazyLocation {
            segment: segment.into(),
            parent: Some(self),
        }
    }
}

impl From<&LazyLocation<'_, '_>> for Location {
    fn from(path: &LazyLocation<'_, '_>) -> Self {
        let mut capacity = 0;
        let mut head = path;
        while let Some(next) = head.parent {
            head = next;
            capacity += 1;
        }
        let mut buffer = Vec::with_capacity(capacity);
        let mut head = path;
        while head.parent.is_some() {
            buffer.push(match head.segment {
                LazySegment::Property(property) => LocationSegment::Property(property.into()),
                LazySegment::Index(idx) => LocationSegment::Index(idx),
            });
            head = head.parent.expect("parent presence was just checked");
        }
        buffer.reverse();
        Location(buffer)
    }
}

/// Where the engine currently stands on the schema side.
///
/// `relative` is the dynamic keyword location, growing through `$ref`
/// traversals; `resource` is the pointer from the current resource root and
/// resets whenever a reference or `$id` rebases evaluation.
#[derive(Clone, Debug)]
pub(crate) struct SchemaLocation {
    pub(crate) relative: Location,
    pub(crate) resource: Location,
    pub(crate) base: Option<Arc<Uri<String>>>,
}

impl SchemaLocation {
    pub(crate) fn root(base: Option<Uri<String>>) -> Self {
        SchemaLocation {
            relative: Location::default(),
            resource: Location::default(),
            base: base.map(Arc::new),
        }
    }

    #[must_use]
    pub(crate) fn join(&self, segment: impl Into<LocationSegment>) -> Self {
        let segment = segment.into();
        SchemaLocation {
            relative: self.relative.join(segment.clone()),
            resource: self.resource.join(segment),
            base: self.base.clone(),
        }
    }

    /// Rebase after following a reference: the dynamic path keeps growing
    /// while the resource-relative pointer restarts at the target.
    #[must_use]
    pub(crate) fn rebase(&self, base: Option<Arc<Uri<String>>>, resource: Location) -> Self {
        SchemaLocation {
            relative: self.relative.clone(),
            resource,
            base,
        }
    }

    pub(crate) fn absolute(&self) -> Option<String> {
        self.base
            .as_ref()
            .map(|base| format!("{}#{}", crate::uri::canonical(base), self.resource))
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_fragment, parse_pointer, LazyLocation, Location};
    use serde_json::json;

    #[test]
    fn pointer_display_escapes() {
        let segments = ["/", "~"];
        let pointer = Location::from(&segments[..]).to_string();
        assert_eq!(pointer, "/~1/~0");
        let data = json!({"/": {"~": 42}});
        assert_eq!(data.pointer(&pointer), Some(&json!(42)));
    }

    #[test]
    fn parses_escaped_tokens() {
        assert_eq!(
            parse_pointer("/a~1b/c~0d/0").expect("Valid pointer"),
            vec!["a/b".to_string(), "c~d".to_string(), "0".to_string()]
        );
        assert_eq!(parse_pointer("").expect("Valid pointer"), Vec::<String>::new());
        assert!(parse_pointer("a/b").is_none());
        assert!(parse_pointer("/a~2b").is_none());
    }

    #[test]
    fn parses_percent_encoded_fragments() {
        assert_eq!(
            parse_fragment("/a%20b").expect("Valid fragment"),
            vec!["a b".to_string()]
        );
    }

    #[test]
    fn lazy_location_materializes_in_order() {
        let root = LazyLocation::new();
        let first = root.push("foo");
        let second = first.push(2);
        let location = Location::from(&second);
        assert_eq!(location.to_string(), "/foo/2");
    }
}
