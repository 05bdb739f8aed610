//! The `format` keyword: built-in predicates plus a process-wide registry
//! for custom formats.
//!
//! Whether `format` asserts or only annotates depends on the active
//! vocabularies and the `require_format_validation` option. Unknown formats
//! always succeed.
use std::{
    net::{Ipv4Addr, Ipv6Addr},
    str::FromStr,
    sync::Arc,
};

use ahash::AHashMap;
use fluent_uri::{Uri, UriRef};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use serde_json::{json, Value};

use crate::{
    context::EvalContext,
    drafts::Draft,
    engine::KeywordEvaluation,
    error::ValidationErrorKind,
    output::OutputNode,
    paths::{self, LazyLocation, SchemaLocation},
    vocabularies::Vocabulary,
};

type CustomFormats = AHashMap<String, Arc<dyn Fn(&str) -> bool + Send + Sync>>;

static CUSTOM_FORMATS: Lazy<RwLock<CustomFormats>> =
    Lazy::new(|| RwLock::new(AHashMap::new()));

/// Register a process-wide format predicate.
///
/// Registration is meant for startup; validation only reads the registry.
/// A custom predicate shadows the built-in of the same name.
pub fn register_format(name: impl Into<String>, predicate: impl Fn(&str) -> bool + Send + Sync + 'static) {
    CUSTOM_FORMATS
        .write()
        .insert(name.into(), Arc::new(predicate));
}

pub(crate) fn format(
    name: &str,
    instance: &Value,
    location: &SchemaLocation,
    instance_path: &LazyLocation,
    ctx: &mut EvalContext<'_>,
) -> KeywordEvaluation {
    let assert = ctx.options.require_format_validation
        || (ctx.draft() >= Draft::Draft201909
            && ctx.entry.vocabularies.enables(Vocabulary::Format));
    if !assert {
        return OutputNode::annotation(location, instance_path, json!(name));
    }
    let Value::String(string) = instance else {
        return OutputNode::ignored(location, instance_path);
    };
    let outcome = if let Some(predicate) = CUSTOM_FORMATS.read().get(name) {
        Some(predicate(string))
    } else {
        builtin(name, string)
    };
    match outcome {
        Some(false) => OutputNode::failure(
            location,
            instance_path,
            instance,
            ValidationErrorKind::Format {
                format: name.to_string(),
            },
        ),
        // Unknown formats validate successfully.
        Some(true) | None => OutputNode::annotation(location, instance_path, json!(name)),
    }
}

fn builtin(name: &str, value: &str) -> Option<bool> {
    Some(match name {
        "date" => is_date(value),
        "time" => is_time(value),
        "date-time" => is_date_time(value),
        "duration" => DURATION.is_match(value).unwrap_or(false),
        "email" | "idn-email" => EMAIL.is_match(value),
        "hostname" => is_hostname(value),
        "ipv4" => Ipv4Addr::from_str(value).is_ok(),
        "ipv6" => Ipv6Addr::from_str(value).is_ok(),
        "uri" => Uri::parse(value).is_ok(),
        "uri-reference" | "iri-reference" => UriRef::parse(value).is_ok(),
        "uuid" => is_uuid(value),
        "json-pointer" => paths::parse_pointer(value).is_some(),
        "relative-json-pointer" => RELATIVE_JSON_POINTER.is_match(value),
        "regex" => fancy_regex::Regex::new(value).is_ok(),
        _ => return None,
    })
}

// Lookahead keeps "P" and a trailing "T" from matching, so this one needs
// the backtracking engine.
static DURATION: Lazy<fancy_regex::Regex> = Lazy::new(|| {
    fancy_regex::Regex::new(r"^P(?:\d+W|(?=\d|T\d)(?:\d+Y)?(?:\d+M)?(?:\d+D)?(?:T(?=\d)(?:\d+H)?(?:\d+M)?(?:\d+(?:\.\d+)?S)?)?)$")
        .expect("Invalid regex")
});

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^[^@\s"]+@[^@\s]+\.[^@\s.]+$|^[^@\s"]+@\[[0-9A-Fa-f:.]+\]$"#)
        .expect("Invalid regex")
});

static RELATIVE_JSON_POINTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:0|[1-9][0-9]*)(?:#|(?:/[^#]*)?)$").expect("Invalid regex"));

fn is_hostname(value: &str) -> bool {
    if value.is_empty() || value.len() > 253 {
        return false;
    }
    value.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-')
    })
}

fn is_uuid(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 36 {
        return false;
    }
    for (idx, byte) in bytes.iter().enumerate() {
        match idx {
            8 | 13 | 18 | 23 => {
                if *byte != b'-' {
                    return false;
                }
            }
            _ => {
                if !byte.is_ascii_hexdigit() {
                    return false;
                }
            }
        }
    }
    true
}

fn digits2(bytes: &[u8]) -> Option<u32> {
    if bytes.len() == 2 && bytes[0].is_ascii_digit() && bytes[1].is_ascii_digit() {
        Some(u32::from(bytes[0] - b'0') * 10 + u32::from(bytes[1] - b'0'))
    } else {
        None
    }
}

fn is_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }
    if !bytes[..4].iter().all(u8::is_ascii_digit) {
        return false;
    }
    let year: u32 = value[..4].parse().unwrap_or(0);
    let (Some(month), Some(day)) = (digits2(&bytes[5..7]), digits2(&bytes[8..10])) else {
        return false;
    };
    if !(1..=12).contains(&month) || day == 0 {
        return false;
    }
    let leap = year % 4 == 0 && (year % 100 != 0 || year % 400 == 0);
    let max_day = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ if leap => 29,
        _ => 28,
    };
    day <= max_day
}

fn is_time(value: &str) -> bool {
    let (clock, offset) = match value.find(|ch| matches!(ch, 'Z' | 'z' | '+' | '-')) {
        Some(idx) => value.split_at(idx),
        None => return false,
    };
    let bytes = clock.as_bytes();
    if bytes.len() < 8 || bytes[2] != b':' || bytes[5] != b':' {
        return false;
    }
    let (Some(hour), Some(minute), Some(second)) = (
        digits2(&bytes[..2]),
        digits2(&bytes[3..5]),
        digits2(&bytes[6..8]),
    ) else {
        return false;
    };
    // 60 covers leap seconds.
    if hour > 23 || minute > 59 || second > 60 {
        return false;
    }
    let fraction = &clock[8..];
    if !fraction.is_empty()
        && !(fraction.starts_with('.')
            && fraction.len() > 1
            && fraction[1..].bytes().all(|byte| byte.is_ascii_digit()))
    {
        return false;
    }
    match offset {
        "Z" | "z" => true,
        _ => {
            let bytes = offset.as_bytes();
            bytes.len() == 6
                && bytes[3] == b':'
                && digits2(&bytes[1..3]).is_some_and(|hours| hours <= 23)
                && digits2(&bytes[4..6]).is_some_and(|minutes| minutes <= 59)
        }
    }
}

fn is_date_time(value: &str) -> bool {
    match value.split_once(|ch| matches!(ch, 'T' | 't')) {
        Some((date, time)) => is_date(date) && is_time(time),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::builtin;

    #[test_case("date", "2024-02-29", true; "leap day")]
    #[test_case("date", "2023-02-29", false; "not a leap year")]
    #[test_case("date", "2023-13-01", false)]
    #[test_case("date", "2023-1-01", false; "short month")]
    #[test_case("time", "23:59:59Z", true)]
    #[test_case("time", "23:59:60Z", true; "leap second")]
    #[test_case("time", "10:00:00+02:00", true)]
    #[test_case("time", "24:00:00Z", false)]
    #[test_case("time", "10:00:00", false; "missing offset")]
    #[test_case("date-time", "2024-02-29T23:59:59.123Z", true)]
    #[test_case("date-time", "2024-02-29 23:59:59Z", false)]
    #[test_case("duration", "P1Y2M3DT4H5M6S", true)]
    #[test_case("duration", "P4W", true)]
    #[test_case("duration", "PT0.5S", true)]
    #[test_case("duration", "P", false)]
    #[test_case("email", "user@example.com", true)]
    #[test_case("email", "not an email", false)]
    #[test_case("hostname", "example.com", true)]
    #[test_case("hostname", "-bad.example", false)]
    #[test_case("ipv4", "127.0.0.1", true)]
    #[test_case("ipv4", "256.0.0.1", false)]
    #[test_case("ipv6", "::1", true)]
    #[test_case("ipv6", "12345::", false)]
    #[test_case("uri", "https://example.com/a", true)]
    #[test_case("uri", "relative/path", false)]
    #[test_case("uri-reference", "relative/path", true)]
    #[test_case("uuid", "550e8400-e29b-41d4-a716-446655440000", true)]
    #[test_case("uuid", "550e8400e29b41d4a716446655440000", false)]
    #[test_case("json-pointer", "/a/b~0c", true)]
    #[test_case("json-pointer", "a/b", false)]
    #[test_case("relative-json-pointer", "0/a", true)]
    #[test_case("relative-json-pointer", "01/a", false)]
    #[test_case("regex", "^a+$", true)]
    #[test_case("regex", "(", false)]
    fn builtins(name: &str, value: &str, expected: bool) {
        assert_eq!(builtin(name, value), Some(expected));
    }

    #[test]
    fn unknown_formats_validate() {
        assert_eq!(builtin("no-such-format", "anything"), None);
        let schema = serde_json::json!({"format": "no-such-format"});
        assert!(crate::options()
            .require_format_validation(true)
            .build(&schema)
            .expect("Invalid schema")
            .is_valid(&serde_json::json!("anything")));
    }

    #[test]
    fn custom_formats_are_process_wide() {
        super::register_format("even-length", |value| value.len() % 2 == 0);
        let schema = serde_json::json!({"format": "even-length"});
        let validator = crate::options()
            .require_format_validation(true)
            .build(&schema)
            .expect("Invalid schema");
        assert!(validator.is_valid(&serde_json::json!("ab")));
        assert!(!validator.is_valid(&serde_json::json!("abc")));
    }

    #[test]
    fn format_is_annotation_only_by_default() {
        let schema = serde_json::json!({"format": "ipv4"});
        assert!(crate::is_valid(&schema, &serde_json::json!("not an ip")));
    }
}
