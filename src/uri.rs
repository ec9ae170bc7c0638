//! URI utilities for schema identification
//!
//! Thin helpers over the `url` crate: absolute/relative joining,
//! fragment splitting, canonical (fragmentless) form, and the folder
//! ("parent") of a URI. Schema URIs are kept as strings everywhere
//! else; this module is the only place that parses them.

use crate::error::{SchemaError, SchemaResult};
use url::Url;

/// Split a URI reference into its fragmentless part and optional fragment
pub fn split_fragment(uri: &str) -> (&str, Option<&str>) {
    match uri.find('#') {
        Some(pos) => (&uri[..pos], Some(&uri[pos + 1..])),
        None => (uri, None),
    }
}

/// Whether the reference parses as an absolute URI
pub fn is_absolute(uri: &str) -> bool {
    Url::parse(uri).is_ok()
}

/// Join a reference to an absolute base per RFC 3986
///
/// An absolute reference is returned as-is (canonicalized); a relative
/// reference resolves against the base's folder.
pub fn join(base: &str, reference: &str) -> SchemaResult<String> {
    if let Ok(url) = Url::parse(reference) {
        return Ok(strip_empty_fragment(url));
    }
    let base_url = Url::parse(base).map_err(|_| SchemaError::InvalidUri(base.to_string()))?;
    let joined = base_url
        .join(reference)
        .map_err(|_| SchemaError::InvalidUri(reference.to_string()))?;
    Ok(strip_empty_fragment(joined))
}

/// Canonical form: parsed, normalized, fragment dropped
pub fn canonical(uri: &str) -> SchemaResult<String> {
    let mut url = Url::parse(uri).map_err(|_| SchemaError::InvalidUri(uri.to_string()))?;
    url.set_fragment(None);
    Ok(url.to_string())
}

/// The folder of a URI: itself when the path ends in `/`, the parent otherwise
pub fn parent(uri: &str) -> SchemaResult<String> {
    let url = Url::parse(uri).map_err(|_| SchemaError::InvalidUri(uri.to_string()))?;
    if url.path().ends_with('/') {
        return Ok(strip_empty_fragment(url));
    }
    let folder = url
        .join("./")
        .map_err(|_| SchemaError::InvalidUri(uri.to_string()))?;
    Ok(strip_empty_fragment(folder))
}

/// Percent-decode a URI fragment so it can be parsed as a JSON Pointer
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                out.push(hi * 16 + lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn strip_empty_fragment(mut url: Url) -> String {
    if url.fragment() == Some("") {
        url.set_fragment(None);
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_fragment() {
        assert_eq!(
            split_fragment("https://a/b#/c"),
            ("https://a/b", Some("/c"))
        );
        assert_eq!(split_fragment("https://a/b"), ("https://a/b", None));
        assert_eq!(split_fragment("#anchor"), ("", Some("anchor")));
    }

    #[test]
    fn test_join_absolute_reference() {
        assert_eq!(
            join("https://example.com/a", "https://other.com/x").unwrap(),
            "https://other.com/x"
        );
    }

    #[test]
    fn test_join_relative_uses_folder() {
        assert_eq!(
            join("https://example.com/schemas/root.json", "item.json").unwrap(),
            "https://example.com/schemas/item.json"
        );
        assert_eq!(
            join("https://example.com/schemas/", "item.json").unwrap(),
            "https://example.com/schemas/item.json"
        );
        assert_eq!(
            join("https://example.com/schemas/root.json", "../other/x").unwrap(),
            "https://example.com/other/x"
        );
    }

    #[test]
    fn test_canonical_drops_fragment() {
        assert_eq!(
            canonical("https://example.com/a#frag").unwrap(),
            "https://example.com/a"
        );
    }

    #[test]
    fn test_parent() {
        assert_eq!(
            parent("https://example.com/a/b.json").unwrap(),
            "https://example.com/a/"
        );
        assert_eq!(
            parent("https://example.com/a/").unwrap(),
            "https://example.com/a/"
        );
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("%2Fa%2Fb"), "/a/b");
        assert_eq!(percent_decode("plain"), "plain");
        assert_eq!(percent_decode("a%2"), "a%2");
    }
}
