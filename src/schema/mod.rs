//! The schema tree
//!
//! A schema node is either a boolean schema or an object schema made of
//! keyword nodes. Keyword nodes are sorted once at construction by
//! (priority, name), so iteration during evaluation is deterministic
//! without re-sorting. Schemas are immutable after load.

use crate::error::SchemaResult;
use crate::pointer::{parse_array_index, JsonPointer};
use serde_json::Value;

mod keyword;
mod parser;

pub use keyword::{
    keyword_info, CompiledPattern, Dependency, InstanceType, ItemsKeyword, Keyword, KeywordInfo,
    KEYWORD_INFO,
};
pub(crate) use parser::is_anchor_name;

use crate::draft::Draft;

/// A schema: boolean, or an ordered set of keyword nodes
#[derive(Debug, Clone)]
pub enum Schema {
    /// `true` accepts everything, `false` rejects everything
    Bool(bool),
    Object(Box<SchemaObject>),
}

/// An object schema
#[derive(Debug, Clone)]
pub struct SchemaObject {
    /// Absolute URI assigned by `$id`, filled in at registration
    pub base_uri: Option<String>,
    /// Name declared by `$anchor`
    pub anchor: Option<String>,
    /// Name declared by `$dynamicAnchor`
    pub dynamic_anchor: Option<String>,
    /// `$recursiveAnchor: true` (2019-09)
    pub recursive_anchor: bool,
    /// Keyword nodes, sorted by (priority, name)
    pub keywords: Vec<Keyword>,
    /// Whether any keyword here consumes sibling annotations; when set,
    /// the engine must not short-circuit the keyword loop
    pub needs_annotations: bool,
}

impl Schema {
    /// Parse a schema from a decoded JSON document
    ///
    /// `draft` governs payload-shape rules (e.g. the array form of
    /// `items` is a load error under 2020-12).
    pub fn from_value(value: &Value, draft: Draft) -> SchemaResult<Schema> {
        parser::parse_schema(value, draft)
    }

    pub fn as_object(&self) -> Option<&SchemaObject> {
        match self {
            Schema::Object(obj) => Some(obj),
            Schema::Bool(_) => None,
        }
    }

    /// Find a keyword node by name
    pub fn keyword(&self, name: &str) -> Option<&Keyword> {
        self.as_object()?.keyword(name)
    }

    /// Resolve a JSON Pointer through the schema tree
    ///
    /// Descent is keyword-aware: an integer segment into a schema list
    /// selects the n-th subschema, a string segment into a keyed
    /// mapping selects by key, and unary keywords are traversed by
    /// their name alone.
    pub fn resolve_pointer(&self, pointer: &JsonPointer) -> Option<&Schema> {
        let mut current = self;
        let mut tokens = pointer.tokens().iter();
        while let Some(token) = tokens.next() {
            let keyword = current.keyword(token)?;
            current = match keyword {
                // Unary keywords carry their subschema directly
                Keyword::Not(s)
                | Keyword::If(s)
                | Keyword::Then(s)
                | Keyword::Else(s)
                | Keyword::AdditionalProperties(s)
                | Keyword::UnevaluatedProperties(s)
                | Keyword::PropertyNames(s)
                | Keyword::AdditionalItems(s)
                | Keyword::UnevaluatedItems(s)
                | Keyword::Contains(s)
                | Keyword::ContentSchema(s) => s.as_ref(),
                Keyword::Items(ItemsKeyword::Single(s)) => s.as_ref(),
                // Schema lists take an index segment
                Keyword::AllOf(list)
                | Keyword::AnyOf(list)
                | Keyword::OneOf(list)
                | Keyword::PrefixItems(list) => {
                    let index = parse_array_index(tokens.next()?)?;
                    list.get(index)?
                }
                Keyword::Items(ItemsKeyword::Array(list)) => {
                    let index = parse_array_index(tokens.next()?)?;
                    list.get(index)?
                }
                // Keyed mappings take a key segment
                Keyword::Defs(map)
                | Keyword::Definitions(map)
                | Keyword::Properties(map)
                | Keyword::DependentSchemas(map) => map.get(tokens.next()?.as_str())?,
                Keyword::PatternProperties(entries) => {
                    let key = tokens.next()?;
                    let (_, schema) = entries
                        .iter()
                        .find(|(pattern, _)| pattern.source == *key)?;
                    schema
                }
                Keyword::Dependencies(map) => match map.get(tokens.next()?.as_str())? {
                    Dependency::Schema(s) => s,
                    Dependency::Keys(_) => return None,
                },
                _ => return None,
            };
        }
        Some(current)
    }
}

impl SchemaObject {
    /// Find a keyword node by name
    pub fn keyword(&self, name: &str) -> Option<&Keyword> {
        self.keywords.iter().find(|kw| kw.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Schema {
        Schema::from_value(&value, Draft::latest()).unwrap()
    }

    #[test]
    fn test_boolean_schemas() {
        assert!(matches!(parse(json!(true)), Schema::Bool(true)));
        assert!(matches!(parse(json!(false)), Schema::Bool(false)));
    }

    #[test]
    fn test_keywords_sorted_by_priority() {
        let schema = parse(json!({
            "unevaluatedProperties": false,
            "properties": {"a": true},
            "$ref": "#/$defs/x",
            "$defs": {"x": true}
        }));
        let names: Vec<&str> = schema
            .as_object()
            .unwrap()
            .keywords
            .iter()
            .map(|kw| kw.name())
            .collect();
        assert_eq!(
            names,
            vec!["$ref", "properties", "unevaluatedProperties", "$defs"]
        );
    }

    #[test]
    fn test_pointer_into_defs() {
        let schema = parse(json!({"$defs": {"pos": {"minimum": 1}}}));
        let ptr = JsonPointer::parse("/$defs/pos").unwrap();
        let target = schema.resolve_pointer(&ptr).unwrap();
        assert!(matches!(
            target.keyword("minimum"),
            Some(Keyword::Minimum(_))
        ));
    }

    #[test]
    fn test_pointer_into_schema_list() {
        let schema = parse(json!({"anyOf": [{"type": "string"}, {"type": "integer"}]}));
        let ptr = JsonPointer::parse("/anyOf/1").unwrap();
        let target = schema.resolve_pointer(&ptr).unwrap();
        assert!(matches!(target.keyword("type"), Some(Keyword::Type(_))));
        assert!(schema
            .resolve_pointer(&JsonPointer::parse("/anyOf/2").unwrap())
            .is_none());
    }

    #[test]
    fn test_pointer_through_unary_keyword() {
        let schema = parse(json!({"not": {"items": {"pattern": "^a"}}}));
        let ptr = JsonPointer::parse("/not/items").unwrap();
        let target = schema.resolve_pointer(&ptr).unwrap();
        assert!(matches!(
            target.keyword("pattern"),
            Some(Keyword::Pattern(_))
        ));
    }

    #[test]
    fn test_pointer_into_properties() {
        let schema = parse(json!({"properties": {"a": {"type": "string"}}}));
        let ptr = JsonPointer::parse("/properties/a").unwrap();
        assert!(schema.resolve_pointer(&ptr).is_some());
        assert!(schema
            .resolve_pointer(&JsonPointer::parse("/properties/b").unwrap())
            .is_none());
    }

    #[test]
    fn test_needs_annotations_flag() {
        let plain = parse(json!({"properties": {"a": true}}));
        assert!(!plain.as_object().unwrap().needs_annotations);

        let consuming = parse(json!({
            "properties": {"a": true},
            "unevaluatedProperties": false
        }));
        assert!(consuming.as_object().unwrap().needs_annotations);
    }
}
