//! RFC 6901 JSON Pointers
//!
//! Parses `/a/0/b` form and the fragment form `#/a/0/b`, with the
//! standard `~0`/`~1` escapes. Pointers resolve against instance
//! values here; keyword-aware resolution against schemas lives in
//! [`crate::schema`].

use crate::error::{SchemaError, SchemaResult};
use serde_json::Value;
use std::fmt;

/// A parsed JSON Pointer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonPointer {
    tokens: Vec<String>,
}

impl JsonPointer {
    /// The root pointer (empty token list)
    pub fn root() -> Self {
        Self { tokens: Vec::new() }
    }

    /// Parse a pointer from `""`, `"/a/b"`, `"#"` or `"#/a/b"`
    pub fn parse(input: &str) -> SchemaResult<Self> {
        let body = input.strip_prefix('#').unwrap_or(input);
        if body.is_empty() {
            return Ok(Self::root());
        }
        if !body.starts_with('/') {
            return Err(SchemaError::InvalidPointer(input.to_string()));
        }
        let mut tokens = Vec::new();
        for raw in body[1..].split('/') {
            tokens.push(unescape_token(raw, input)?);
        }
        Ok(Self { tokens })
    }

    /// Append a token
    pub fn push(&mut self, token: impl Into<String>) {
        self.tokens.push(token.into());
    }

    /// The unescaped tokens
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Resolve this pointer against an instance value
    pub fn resolve<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        let mut current = value;
        for token in &self.tokens {
            match current {
                Value::Object(entries) => {
                    current = entries.get(token.as_str())?;
                }
                Value::Array(items) => {
                    let index = parse_array_index(token)?;
                    current = items.get(index)?;
                }
                _ => return None,
            }
        }
        Some(current)
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "/{}", token.replace('~', "~0").replace('/', "~1"))?;
        }
        Ok(())
    }
}

fn unescape_token(raw: &str, pointer: &str) -> SchemaResult<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return Err(SchemaError::InvalidPointer(pointer.to_string())),
            }
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

/// Array index tokens must be `0` or digits without a leading zero
pub(crate) fn parse_array_index(token: &str) -> Option<usize> {
    if token.len() > 1 && token.starts_with('0') {
        return None;
    }
    token.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_root_forms() {
        assert!(JsonPointer::parse("").unwrap().is_root());
        assert!(JsonPointer::parse("#").unwrap().is_root());
    }

    #[test]
    fn test_parse_and_display_round_trip() {
        let ptr = JsonPointer::parse("/a/0/b~1c/~0d").unwrap();
        assert_eq!(ptr.tokens(), &["a", "0", "b/c", "~d"]);
        assert_eq!(ptr.to_string(), "/a/0/b~1c/~0d");
    }

    #[test]
    fn test_parse_fragment_form() {
        let ptr = JsonPointer::parse("#/$defs/pos").unwrap();
        assert_eq!(ptr.tokens(), &["$defs", "pos"]);
    }

    #[test]
    fn test_parse_rejects_missing_slash() {
        assert!(JsonPointer::parse("a/b").is_err());
        assert!(JsonPointer::parse("#a").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_escape() {
        assert!(JsonPointer::parse("/a~2b").is_err());
        assert!(JsonPointer::parse("/a~").is_err());
    }

    #[test]
    fn test_resolve_against_instance() {
        let value = json!({"a": [{"b": 1}, {"b": 2}], "": 3});
        let ptr = JsonPointer::parse("/a/1/b").unwrap();
        assert_eq!(ptr.resolve(&value), Some(&json!(2)));

        // Empty token selects the empty key
        let ptr = JsonPointer::parse("/").unwrap();
        assert_eq!(ptr.resolve(&value), Some(&json!(3)));
    }

    #[test]
    fn test_resolve_rejects_leading_zero_index() {
        let value = json!([1, 2, 3]);
        assert_eq!(JsonPointer::parse("/01").unwrap().resolve(&value), None);
        assert_eq!(
            JsonPointer::parse("/0").unwrap().resolve(&value),
            Some(&json!(1))
        );
    }

    #[test]
    fn test_resolve_misses() {
        let value = json!({"a": 1});
        assert_eq!(JsonPointer::parse("/b").unwrap().resolve(&value), None);
        assert_eq!(JsonPointer::parse("/a/b").unwrap().resolve(&value), None);
    }
}
