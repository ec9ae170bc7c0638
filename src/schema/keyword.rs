//! The keyword catalogue
//!
//! One tagged variant per keyword, each carrying its own payload.
//! Keyword metadata (execution priority, applicable drafts, owning
//! vocabulary, applicator flag) lives in the const [`KEYWORD_INFO`]
//! table rather than on the nodes; the parser and the evaluation
//! engine both consult it by keyword name.
//!
//! `$id`, `$anchor`, `$dynamicAnchor`, `$recursiveAnchor`, `$schema`
//! and `$vocabulary` never become keyword nodes: they are absorbed into
//! [`super::SchemaObject`] fields and registry state at load time.

use crate::draft::{DraftSet, Vocabulary};
use hashlink::LinkedHashMap;
use regex::Regex;
use serde_json::{Number, Value};

use super::Schema;

/// A compiled regular expression that remembers its source
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub source: String,
    pub regex: Regex,
}

/// The instance types `type` can name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl InstanceType {
    pub fn from_name(name: &str) -> Option<InstanceType> {
        match name {
            "null" => Some(InstanceType::Null),
            "boolean" => Some(InstanceType::Boolean),
            "integer" => Some(InstanceType::Integer),
            "number" => Some(InstanceType::Number),
            "string" => Some(InstanceType::String),
            "array" => Some(InstanceType::Array),
            "object" => Some(InstanceType::Object),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            InstanceType::Null => "null",
            InstanceType::Boolean => "boolean",
            InstanceType::Integer => "integer",
            InstanceType::Number => "number",
            InstanceType::String => "string",
            InstanceType::Array => "array",
            InstanceType::Object => "object",
        }
    }
}

/// `items` carries a single schema on every draft, or a positional
/// array of schemas on drafts up to 2019-09
#[derive(Debug, Clone)]
pub enum ItemsKeyword {
    Single(Box<Schema>),
    Array(Vec<Schema>),
}

/// Draft ≤7 `dependencies`: per property either required keys or a schema
#[derive(Debug, Clone)]
pub enum Dependency {
    Keys(Vec<String>),
    Schema(Schema),
}

/// A keyword node: one variant per keyword, payload included
#[derive(Debug, Clone)]
pub enum Keyword {
    // Reference keywords
    Ref(String),
    DynamicRef(String),
    RecursiveRef(String),

    // Identity containers (navigable, never validated)
    Defs(LinkedHashMap<String, Schema>),
    Definitions(LinkedHashMap<String, Schema>),

    // Logical applicators
    AllOf(Vec<Schema>),
    AnyOf(Vec<Schema>),
    OneOf(Vec<Schema>),
    Not(Box<Schema>),
    If(Box<Schema>),
    Then(Box<Schema>),
    Else(Box<Schema>),

    // Object applicators
    Properties(LinkedHashMap<String, Schema>),
    PatternProperties(Vec<(CompiledPattern, Schema)>),
    AdditionalProperties(Box<Schema>),
    UnevaluatedProperties(Box<Schema>),
    PropertyNames(Box<Schema>),
    DependentSchemas(LinkedHashMap<String, Schema>),
    Dependencies(LinkedHashMap<String, Dependency>),

    // Array applicators
    PrefixItems(Vec<Schema>),
    Items(ItemsKeyword),
    AdditionalItems(Box<Schema>),
    UnevaluatedItems(Box<Schema>),
    Contains(Box<Schema>),

    // Validation keywords
    Type(Vec<InstanceType>),
    Enum(Vec<Value>),
    Const(Value),
    Minimum(Number),
    Maximum(Number),
    ExclusiveMinimum(Number),
    ExclusiveMaximum(Number),
    MultipleOf(Number),
    MinLength(u64),
    MaxLength(u64),
    Pattern(CompiledPattern),
    MinItems(u64),
    MaxItems(u64),
    UniqueItems(bool),
    MinContains(u64),
    MaxContains(u64),
    MinProperties(u64),
    MaxProperties(u64),
    Required(Vec<String>),
    DependentRequired(LinkedHashMap<String, Vec<String>>),
    Format(String),

    // Content keywords
    ContentEncoding(String),
    ContentMediaType(String),
    ContentSchema(Box<Schema>),

    // Metadata keywords (annotation-only)
    Title(String),
    Description(String),
    Default(Value),
    Examples(Vec<Value>),
    Deprecated(bool),
    ReadOnly(bool),
    WriteOnly(bool),
    Comment(String),

    // Unknown keywords pass through as annotations
    Unknown(String, Value),
}

impl Keyword {
    /// The keyword name as it appears in schema documents
    pub fn name(&self) -> &str {
        match self {
            Keyword::Ref(_) => "$ref",
            Keyword::DynamicRef(_) => "$dynamicRef",
            Keyword::RecursiveRef(_) => "$recursiveRef",
            Keyword::Defs(_) => "$defs",
            Keyword::Definitions(_) => "definitions",
            Keyword::AllOf(_) => "allOf",
            Keyword::AnyOf(_) => "anyOf",
            Keyword::OneOf(_) => "oneOf",
            Keyword::Not(_) => "not",
            Keyword::If(_) => "if",
            Keyword::Then(_) => "then",
            Keyword::Else(_) => "else",
            Keyword::Properties(_) => "properties",
            Keyword::PatternProperties(_) => "patternProperties",
            Keyword::AdditionalProperties(_) => "additionalProperties",
            Keyword::UnevaluatedProperties(_) => "unevaluatedProperties",
            Keyword::PropertyNames(_) => "propertyNames",
            Keyword::DependentSchemas(_) => "dependentSchemas",
            Keyword::Dependencies(_) => "dependencies",
            Keyword::PrefixItems(_) => "prefixItems",
            Keyword::Items(_) => "items",
            Keyword::AdditionalItems(_) => "additionalItems",
            Keyword::UnevaluatedItems(_) => "unevaluatedItems",
            Keyword::Contains(_) => "contains",
            Keyword::Type(_) => "type",
            Keyword::Enum(_) => "enum",
            Keyword::Const(_) => "const",
            Keyword::Minimum(_) => "minimum",
            Keyword::Maximum(_) => "maximum",
            Keyword::ExclusiveMinimum(_) => "exclusiveMinimum",
            Keyword::ExclusiveMaximum(_) => "exclusiveMaximum",
            Keyword::MultipleOf(_) => "multipleOf",
            Keyword::MinLength(_) => "minLength",
            Keyword::MaxLength(_) => "maxLength",
            Keyword::Pattern(_) => "pattern",
            Keyword::MinItems(_) => "minItems",
            Keyword::MaxItems(_) => "maxItems",
            Keyword::UniqueItems(_) => "uniqueItems",
            Keyword::MinContains(_) => "minContains",
            Keyword::MaxContains(_) => "maxContains",
            Keyword::MinProperties(_) => "minProperties",
            Keyword::MaxProperties(_) => "maxProperties",
            Keyword::Required(_) => "required",
            Keyword::DependentRequired(_) => "dependentRequired",
            Keyword::Format(_) => "format",
            Keyword::ContentEncoding(_) => "contentEncoding",
            Keyword::ContentMediaType(_) => "contentMediaType",
            Keyword::ContentSchema(_) => "contentSchema",
            Keyword::Title(_) => "title",
            Keyword::Description(_) => "description",
            Keyword::Default(_) => "default",
            Keyword::Examples(_) => "examples",
            Keyword::Deprecated(_) => "deprecated",
            Keyword::ReadOnly(_) => "readOnly",
            Keyword::WriteOnly(_) => "writeOnly",
            Keyword::Comment(_) => "$comment",
            Keyword::Unknown(name, _) => name,
        }
    }

    /// Execution priority; smaller runs first, ties break on name
    pub fn priority(&self) -> u32 {
        match keyword_info(self.name()) {
            Some(info) => info.priority,
            // Unknown keywords only emit their annotation
            None => PRIORITY_METADATA,
        }
    }

    /// All directly carried subschemas, each with the pointer tokens
    /// that reach it from the owning schema object
    pub fn subschemas(&self) -> Vec<(Vec<String>, &Schema)> {
        let name = self.name().to_string();
        match self {
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
            | Keyword::ContentSchema(s)
            | Keyword::Items(ItemsKeyword::Single(s)) => vec![(vec![name], s.as_ref())],
            Keyword::AllOf(list)
            | Keyword::AnyOf(list)
            | Keyword::OneOf(list)
            | Keyword::PrefixItems(list)
            | Keyword::Items(ItemsKeyword::Array(list)) => list
                .iter()
                .enumerate()
                .map(|(index, schema)| (vec![name.clone(), index.to_string()], schema))
                .collect(),
            Keyword::Defs(map)
            | Keyword::Definitions(map)
            | Keyword::Properties(map)
            | Keyword::DependentSchemas(map) => map
                .iter()
                .map(|(key, schema)| (vec![name.clone(), key.clone()], schema))
                .collect(),
            Keyword::PatternProperties(entries) => entries
                .iter()
                .map(|(pattern, schema)| (vec![name.clone(), pattern.source.clone()], schema))
                .collect(),
            Keyword::Dependencies(map) => map
                .iter()
                .filter_map(|(key, dependency)| match dependency {
                    Dependency::Schema(s) => Some((vec![name.clone(), key.clone()], s)),
                    Dependency::Keys(_) => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Mutable variant of [`Keyword::subschemas`]
    pub(crate) fn subschemas_mut(&mut self) -> Vec<&mut Schema> {
        match self {
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
            | Keyword::ContentSchema(s)
            | Keyword::Items(ItemsKeyword::Single(s)) => vec![s.as_mut()],
            Keyword::AllOf(list)
            | Keyword::AnyOf(list)
            | Keyword::OneOf(list)
            | Keyword::PrefixItems(list)
            | Keyword::Items(ItemsKeyword::Array(list)) => list.iter_mut().collect(),
            Keyword::Defs(map)
            | Keyword::Definitions(map)
            | Keyword::Properties(map)
            | Keyword::DependentSchemas(map) => map.values_mut().collect(),
            Keyword::PatternProperties(entries) => entries
                .iter_mut()
                .map(|(_, schema)| schema)
                .collect(),
            Keyword::Dependencies(map) => map
                .values_mut()
                .filter_map(|dependency| match dependency {
                    Dependency::Schema(s) => Some(s),
                    Dependency::Keys(_) => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Metadata for one catalogued keyword
#[derive(Debug, Clone, Copy)]
pub struct KeywordInfo {
    pub name: &'static str,
    pub priority: u32,
    pub drafts: DraftSet,
    pub vocabulary: Vocabulary,
    /// Recurses into subschemas and participates in annotation consolidation
    pub applicator: bool,
}

pub const PRIORITY_METADATA: u32 = 10;
pub const PRIORITY_CONTENT: u32 = 20;
pub const PRIORITY_REF: u32 = 100;
pub const PRIORITY_TYPE: u32 = 150;
pub const PRIORITY_ASSERTION: u32 = 200;
pub const PRIORITY_APPLICATOR: u32 = 300;
pub const PRIORITY_PRODUCER: u32 = 310;
pub const PRIORITY_ADDITIONAL: u32 = 330;
pub const PRIORITY_CONTAINS_BOUNDS: u32 = 340;
pub const PRIORITY_UNEVALUATED: u32 = 400;
pub const PRIORITY_IDENTITY: u32 = 500;

/// The keyword metadata table
pub const KEYWORD_INFO: &[KeywordInfo] = &[
    // References run before applicators so a sibling `$ref` extends the
    // dynamic scope seen by later keywords.
    KeywordInfo { name: "$ref", priority: PRIORITY_REF, drafts: DraftSet::ALL, vocabulary: Vocabulary::Core, applicator: true },
    KeywordInfo { name: "$dynamicRef", priority: PRIORITY_REF, drafts: DraftSet::ONLY_2020, vocabulary: Vocabulary::Core, applicator: true },
    KeywordInfo { name: "$recursiveRef", priority: PRIORITY_REF, drafts: DraftSet::ONLY_2019, vocabulary: Vocabulary::Core, applicator: true },
    KeywordInfo { name: "$defs", priority: PRIORITY_IDENTITY, drafts: DraftSet::ALL, vocabulary: Vocabulary::Core, applicator: false },
    KeywordInfo { name: "definitions", priority: PRIORITY_IDENTITY, drafts: DraftSet::ALL, vocabulary: Vocabulary::Core, applicator: false },
    KeywordInfo { name: "$comment", priority: PRIORITY_METADATA, drafts: DraftSet::FROM_7, vocabulary: Vocabulary::Core, applicator: false },
    // Logical and conditional applicators
    KeywordInfo { name: "allOf", priority: PRIORITY_APPLICATOR, drafts: DraftSet::ALL, vocabulary: Vocabulary::Applicator, applicator: true },
    KeywordInfo { name: "anyOf", priority: PRIORITY_APPLICATOR, drafts: DraftSet::ALL, vocabulary: Vocabulary::Applicator, applicator: true },
    KeywordInfo { name: "oneOf", priority: PRIORITY_APPLICATOR, drafts: DraftSet::ALL, vocabulary: Vocabulary::Applicator, applicator: true },
    KeywordInfo { name: "not", priority: PRIORITY_APPLICATOR, drafts: DraftSet::ALL, vocabulary: Vocabulary::Applicator, applicator: true },
    KeywordInfo { name: "if", priority: PRIORITY_APPLICATOR, drafts: DraftSet::FROM_7, vocabulary: Vocabulary::Applicator, applicator: true },
    KeywordInfo { name: "then", priority: PRIORITY_APPLICATOR + 1, drafts: DraftSet::FROM_7, vocabulary: Vocabulary::Applicator, applicator: true },
    KeywordInfo { name: "else", priority: PRIORITY_APPLICATOR + 2, drafts: DraftSet::FROM_7, vocabulary: Vocabulary::Applicator, applicator: true },
    // Object applicators; producers run before consumers
    KeywordInfo { name: "properties", priority: PRIORITY_PRODUCER, drafts: DraftSet::ALL, vocabulary: Vocabulary::Applicator, applicator: true },
    KeywordInfo { name: "patternProperties", priority: PRIORITY_PRODUCER + 1, drafts: DraftSet::ALL, vocabulary: Vocabulary::Applicator, applicator: true },
    KeywordInfo { name: "additionalProperties", priority: PRIORITY_ADDITIONAL, drafts: DraftSet::ALL, vocabulary: Vocabulary::Applicator, applicator: true },
    KeywordInfo { name: "unevaluatedProperties", priority: PRIORITY_UNEVALUATED, drafts: DraftSet::MODERN, vocabulary: Vocabulary::Unevaluated, applicator: true },
    KeywordInfo { name: "propertyNames", priority: PRIORITY_ADDITIONAL, drafts: DraftSet::ALL, vocabulary: Vocabulary::Applicator, applicator: true },
    KeywordInfo { name: "dependentSchemas", priority: PRIORITY_APPLICATOR, drafts: DraftSet::MODERN, vocabulary: Vocabulary::Applicator, applicator: true },
    KeywordInfo { name: "dependencies", priority: PRIORITY_APPLICATOR, drafts: DraftSet::CLASSIC, vocabulary: Vocabulary::Applicator, applicator: true },
    // Array applicators
    KeywordInfo { name: "prefixItems", priority: PRIORITY_PRODUCER, drafts: DraftSet::ONLY_2020, vocabulary: Vocabulary::Applicator, applicator: true },
    KeywordInfo { name: "items", priority: PRIORITY_PRODUCER + 5, drafts: DraftSet::ALL, vocabulary: Vocabulary::Applicator, applicator: true },
    KeywordInfo { name: "additionalItems", priority: PRIORITY_ADDITIONAL, drafts: DraftSet::UP_TO_2019, vocabulary: Vocabulary::Applicator, applicator: true },
    KeywordInfo { name: "unevaluatedItems", priority: PRIORITY_UNEVALUATED, drafts: DraftSet::MODERN, vocabulary: Vocabulary::Unevaluated, applicator: true },
    KeywordInfo { name: "contains", priority: PRIORITY_PRODUCER + 6, drafts: DraftSet::ALL, vocabulary: Vocabulary::Applicator, applicator: true },
    KeywordInfo { name: "minContains", priority: PRIORITY_CONTAINS_BOUNDS, drafts: DraftSet::MODERN, vocabulary: Vocabulary::Validation, applicator: false },
    KeywordInfo { name: "maxContains", priority: PRIORITY_CONTAINS_BOUNDS, drafts: DraftSet::MODERN, vocabulary: Vocabulary::Validation, applicator: false },
    // Validation keywords
    KeywordInfo { name: "type", priority: PRIORITY_TYPE, drafts: DraftSet::ALL, vocabulary: Vocabulary::Validation, applicator: false },
    KeywordInfo { name: "enum", priority: PRIORITY_ASSERTION, drafts: DraftSet::ALL, vocabulary: Vocabulary::Validation, applicator: false },
    KeywordInfo { name: "const", priority: PRIORITY_ASSERTION, drafts: DraftSet::ALL, vocabulary: Vocabulary::Validation, applicator: false },
    KeywordInfo { name: "minimum", priority: PRIORITY_ASSERTION, drafts: DraftSet::ALL, vocabulary: Vocabulary::Validation, applicator: false },
    KeywordInfo { name: "maximum", priority: PRIORITY_ASSERTION, drafts: DraftSet::ALL, vocabulary: Vocabulary::Validation, applicator: false },
    KeywordInfo { name: "exclusiveMinimum", priority: PRIORITY_ASSERTION, drafts: DraftSet::ALL, vocabulary: Vocabulary::Validation, applicator: false },
    KeywordInfo { name: "exclusiveMaximum", priority: PRIORITY_ASSERTION, drafts: DraftSet::ALL, vocabulary: Vocabulary::Validation, applicator: false },
    KeywordInfo { name: "multipleOf", priority: PRIORITY_ASSERTION, drafts: DraftSet::ALL, vocabulary: Vocabulary::Validation, applicator: false },
    KeywordInfo { name: "minLength", priority: PRIORITY_ASSERTION, drafts: DraftSet::ALL, vocabulary: Vocabulary::Validation, applicator: false },
    KeywordInfo { name: "maxLength", priority: PRIORITY_ASSERTION, drafts: DraftSet::ALL, vocabulary: Vocabulary::Validation, applicator: false },
    KeywordInfo { name: "pattern", priority: PRIORITY_ASSERTION, drafts: DraftSet::ALL, vocabulary: Vocabulary::Validation, applicator: false },
    KeywordInfo { name: "minItems", priority: PRIORITY_ASSERTION, drafts: DraftSet::ALL, vocabulary: Vocabulary::Validation, applicator: false },
    KeywordInfo { name: "maxItems", priority: PRIORITY_ASSERTION, drafts: DraftSet::ALL, vocabulary: Vocabulary::Validation, applicator: false },
    KeywordInfo { name: "uniqueItems", priority: PRIORITY_ASSERTION, drafts: DraftSet::ALL, vocabulary: Vocabulary::Validation, applicator: false },
    KeywordInfo { name: "minProperties", priority: PRIORITY_ASSERTION, drafts: DraftSet::ALL, vocabulary: Vocabulary::Validation, applicator: false },
    KeywordInfo { name: "maxProperties", priority: PRIORITY_ASSERTION, drafts: DraftSet::ALL, vocabulary: Vocabulary::Validation, applicator: false },
    KeywordInfo { name: "required", priority: PRIORITY_ASSERTION, drafts: DraftSet::ALL, vocabulary: Vocabulary::Validation, applicator: false },
    KeywordInfo { name: "dependentRequired", priority: PRIORITY_ASSERTION, drafts: DraftSet::MODERN, vocabulary: Vocabulary::Validation, applicator: false },
    KeywordInfo { name: "format", priority: PRIORITY_ASSERTION, drafts: DraftSet::ALL, vocabulary: Vocabulary::FormatAnnotation, applicator: false },
    // Content keywords
    KeywordInfo { name: "contentEncoding", priority: PRIORITY_METADATA, drafts: DraftSet::FROM_7, vocabulary: Vocabulary::Content, applicator: false },
    KeywordInfo { name: "contentMediaType", priority: PRIORITY_METADATA, drafts: DraftSet::FROM_7, vocabulary: Vocabulary::Content, applicator: false },
    KeywordInfo { name: "contentSchema", priority: PRIORITY_CONTENT, drafts: DraftSet::MODERN, vocabulary: Vocabulary::Content, applicator: true },
    // Metadata keywords
    KeywordInfo { name: "title", priority: PRIORITY_METADATA, drafts: DraftSet::ALL, vocabulary: Vocabulary::MetaData, applicator: false },
    KeywordInfo { name: "description", priority: PRIORITY_METADATA, drafts: DraftSet::ALL, vocabulary: Vocabulary::MetaData, applicator: false },
    KeywordInfo { name: "default", priority: PRIORITY_METADATA, drafts: DraftSet::ALL, vocabulary: Vocabulary::MetaData, applicator: false },
    KeywordInfo { name: "examples", priority: PRIORITY_METADATA, drafts: DraftSet::ALL, vocabulary: Vocabulary::MetaData, applicator: false },
    KeywordInfo { name: "deprecated", priority: PRIORITY_METADATA, drafts: DraftSet::MODERN, vocabulary: Vocabulary::MetaData, applicator: false },
    KeywordInfo { name: "readOnly", priority: PRIORITY_METADATA, drafts: DraftSet::FROM_7, vocabulary: Vocabulary::MetaData, applicator: false },
    KeywordInfo { name: "writeOnly", priority: PRIORITY_METADATA, drafts: DraftSet::FROM_7, vocabulary: Vocabulary::MetaData, applicator: false },
];

/// Look up metadata for a catalogued keyword name
pub fn keyword_info(name: &str) -> Option<&'static KeywordInfo> {
    KEYWORD_INFO.iter().find(|info| info.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::Draft;

    #[test]
    fn test_table_has_no_duplicate_names() {
        for (i, info) in KEYWORD_INFO.iter().enumerate() {
            for other in &KEYWORD_INFO[i + 1..] {
                assert_ne!(info.name, other.name, "duplicate entry {}", info.name);
            }
        }
    }

    #[test]
    fn test_reference_keywords_run_before_applicators() {
        let r = keyword_info("$ref").unwrap();
        let p = keyword_info("properties").unwrap();
        assert!(r.priority < p.priority);
    }

    #[test]
    fn test_producers_run_before_consumers() {
        let properties = keyword_info("properties").unwrap().priority;
        let additional = keyword_info("additionalProperties").unwrap().priority;
        let unevaluated = keyword_info("unevaluatedProperties").unwrap().priority;
        assert!(properties < additional);
        assert!(additional < unevaluated);

        let contains = keyword_info("contains").unwrap().priority;
        let min_contains = keyword_info("minContains").unwrap().priority;
        assert!(contains < min_contains);
    }

    #[test]
    fn test_draft_applicability() {
        assert!(keyword_info("prefixItems")
            .unwrap()
            .drafts
            .contains(Draft::Draft202012));
        assert!(!keyword_info("prefixItems")
            .unwrap()
            .drafts
            .contains(Draft::Draft7));
        assert!(!keyword_info("additionalItems")
            .unwrap()
            .drafts
            .contains(Draft::Draft202012));
        assert!(keyword_info("dependencies")
            .unwrap()
            .drafts
            .contains(Draft::Draft7));
        assert!(!keyword_info("dependencies")
            .unwrap()
            .drafts
            .contains(Draft::Draft201909));
    }
}
