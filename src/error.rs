// Error types for schema loading and instance validation

use std::fmt;
use thiserror::Error;

/// Errors that can occur while loading a schema document into a registry
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Schema document structure is invalid for the declared draft
    #[error("Malformed schema at {location}: {message}")]
    MalformedSchema {
        message: String,
        location: SchemaPath,
    },

    /// `$schema` names a meta-schema this engine does not know
    #[error("Unknown meta-schema '{0}'")]
    UnknownMetaSchema(String),

    /// `$id` is not a valid URI reference
    #[error("Invalid $id '{0}'")]
    InvalidId(String),

    /// `$anchor`/`$dynamicAnchor` name is not a valid anchor
    #[error("Invalid anchor name '{0}'")]
    InvalidAnchor(String),

    /// A second schema was registered under an already-taken URI
    #[error("Schema already registered under '{0}'")]
    DuplicateRegistration(String),

    /// Validation was requested against a URI the registry does not hold
    #[error("No schema registered under '{0}'")]
    UnknownSchema(String),

    /// A URI could not be parsed or joined
    #[error("Invalid URI '{0}'")]
    InvalidUri(String),

    /// A JSON Pointer could not be parsed
    #[error("Invalid JSON Pointer '{0}'")]
    InvalidPointer(String),

    /// A regular expression in `pattern`/`patternProperties` failed to compile
    #[error("Invalid regex pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Result type for schema loading operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Structured validation error kinds
///
/// Every kind carries the literal offending values so that the rendered
/// message is self-contained.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ValidationErrorKind {
    /// Instance kind is not among the allowed types
    TypeMismatch { expected: String, got: String },

    /// Value not in the `enum` list
    NotInEnum { value: String, allowed: Vec<String> },

    /// Value differs from `const`
    ConstMismatch { value: String, expected: String },

    /// Number violates a bound
    NumberOutOfRange {
        value: String,
        minimum: Option<String>,
        maximum: Option<String>,
        exclusive_minimum: Option<String>,
        exclusive_maximum: Option<String>,
    },

    /// Number is not a multiple of the given factor
    NotMultipleOf { value: String, multiple_of: String },

    /// String length outside bounds
    StringLengthInvalid {
        length: usize,
        min_length: Option<u64>,
        max_length: Option<u64>,
    },

    /// String does not match `pattern`
    PatternMismatch { value: String, pattern: String },

    /// Array length outside bounds
    ArrayLengthInvalid {
        length: usize,
        min_items: Option<u64>,
        max_items: Option<u64>,
    },

    /// Two array items compare equal under `uniqueItems`
    ItemsNotUnique { first: usize, second: usize },

    /// No array item matched `contains`
    ContainsMismatch,

    /// `contains` match count outside `minContains`/`maxContains`
    ContainsCountInvalid {
        count: usize,
        min_contains: Option<u64>,
        max_contains: Option<u64>,
    },

    /// Object property count outside bounds
    PropertyCountInvalid {
        count: usize,
        min_properties: Option<u64>,
        max_properties: Option<u64>,
    },

    /// A `required` property is absent
    MissingRequiredProperty { property: String },

    /// A property demanded by a dependency is absent
    MissingDependentProperty { property: String, dependency: String },

    /// Instance hit a `false` schema
    FalseSchema,

    /// The `not` subschema accepted the instance
    NotSatisfied,

    /// No `anyOf` member accepted the instance
    AnyOfNoneMatched,

    /// `oneOf` matched a number of members other than one
    OneOfCountInvalid { matched: usize },

    /// String does not conform to the named format
    FormatMismatch { value: String, format: String },

    /// The content decoder could not decode the string
    ContentDecodeFailed { media_type: String, encoding: String },

    /// Reference target URI is not registered
    UnresolvedReference { reference: String },

    /// Anchor name not defined in the target schema
    UnresolvedAnchor { anchor: String, uri: String },

    /// Reference fragment is not an anchor and not a parseable pointer
    BadPointerFragment { fragment: String },

    /// Reference revisited with the same instance (cycle)
    RecursiveReference { reference: String },

    /// Evaluation exceeded the configured depth bound
    DepthExceeded { depth: usize },

    /// Other validation error
    ///
    /// Last-resort variant; prefer adding a structured kind.
    Other { message: String },
}

impl ValidationErrorKind {
    /// Format a human-readable message from this error kind
    pub fn message(&self) -> String {
        match self {
            ValidationErrorKind::TypeMismatch { expected, got } => {
                format!("Expected {}, got {}", expected, got)
            }
            ValidationErrorKind::NotInEnum { value, allowed } => {
                format!(
                    "Value must be one of: {}, got {}",
                    allowed.join(", "),
                    value
                )
            }
            ValidationErrorKind::ConstMismatch { value, expected } => {
                format!("Value must be {}, got {}", expected, value)
            }
            ValidationErrorKind::NumberOutOfRange {
                value,
                minimum,
                maximum,
                exclusive_minimum,
                exclusive_maximum,
            } => {
                if let Some(min) = minimum {
                    format!("Number {} is less than minimum {}", value, min)
                } else if let Some(max) = maximum {
                    format!("Number {} is greater than maximum {}", value, max)
                } else if let Some(min) = exclusive_minimum {
                    format!("Number {} is not greater than {}", value, min)
                } else if let Some(max) = exclusive_maximum {
                    format!("Number {} is not less than {}", value, max)
                } else {
                    format!("Number {} is out of range", value)
                }
            }
            ValidationErrorKind::NotMultipleOf { value, multiple_of } => {
                format!("Number {} is not a multiple of {}", value, multiple_of)
            }
            ValidationErrorKind::StringLengthInvalid {
                length,
                min_length,
                max_length,
            } => {
                if let Some(min) = min_length {
                    format!("String length {} is less than minimum {}", length, min)
                } else if let Some(max) = max_length {
                    format!("String length {} is greater than maximum {}", length, max)
                } else {
                    format!("String length {} is invalid", length)
                }
            }
            ValidationErrorKind::PatternMismatch { value, pattern } => {
                format!("String {} does not match pattern '{}'", value, pattern)
            }
            ValidationErrorKind::ArrayLengthInvalid {
                length,
                min_items,
                max_items,
            } => {
                if let Some(min) = min_items {
                    format!("Array length {} is less than minimum {}", length, min)
                } else if let Some(max) = max_items {
                    format!("Array length {} is greater than maximum {}", length, max)
                } else {
                    format!("Array length {} is invalid", length)
                }
            }
            ValidationErrorKind::ItemsNotUnique { first, second } => {
                format!("Array items at indices ({}, {}) are equal", first, second)
            }
            ValidationErrorKind::ContainsMismatch => {
                "No array item matches the contains schema".to_string()
            }
            ValidationErrorKind::ContainsCountInvalid {
                count,
                min_contains,
                max_contains,
            } => {
                if let Some(min) = min_contains {
                    format!("{} array items match contains, fewer than {}", count, min)
                } else if let Some(max) = max_contains {
                    format!("{} array items match contains, more than {}", count, max)
                } else {
                    format!("{} array items match contains (invalid)", count)
                }
            }
            ValidationErrorKind::PropertyCountInvalid {
                count,
                min_properties,
                max_properties,
            } => {
                if let Some(min) = min_properties {
                    format!("Object has {} properties, less than minimum {}", count, min)
                } else if let Some(max) = max_properties {
                    format!(
                        "Object has {} properties, greater than maximum {}",
                        count, max
                    )
                } else {
                    format!("Object has {} properties (invalid)", count)
                }
            }
            ValidationErrorKind::MissingRequiredProperty { property } => {
                format!("Missing required property '{}'", property)
            }
            ValidationErrorKind::MissingDependentProperty {
                property,
                dependency,
            } => {
                format!(
                    "Property '{}' requires property '{}' to be present",
                    dependency, property
                )
            }
            ValidationErrorKind::FalseSchema => "Schema 'false' allows no value".to_string(),
            ValidationErrorKind::NotSatisfied => {
                "Value matches the schema it must not match".to_string()
            }
            ValidationErrorKind::AnyOfNoneMatched => {
                "Value matches none of the anyOf schemas".to_string()
            }
            ValidationErrorKind::OneOfCountInvalid { matched } => {
                format!("Value matches {} oneOf schemas, expected exactly 1", matched)
            }
            ValidationErrorKind::FormatMismatch { value, format } => {
                format!("String {} is not a valid '{}'", value, format)
            }
            ValidationErrorKind::ContentDecodeFailed {
                media_type,
                encoding,
            } => {
                format!(
                    "Content could not be decoded as {} ({})",
                    media_type,
                    if encoding.is_empty() {
                        "no encoding"
                    } else {
                        encoding
                    }
                )
            }
            ValidationErrorKind::UnresolvedReference { reference } => {
                format!("Unresolved schema reference '{}'", reference)
            }
            ValidationErrorKind::UnresolvedAnchor { anchor, uri } => {
                format!("Anchor '{}' is not defined in '{}'", anchor, uri)
            }
            ValidationErrorKind::BadPointerFragment { fragment } => {
                format!("Fragment '{}' is not a valid JSON Pointer", fragment)
            }
            ValidationErrorKind::RecursiveReference { reference } => {
                format!("Recursive reference to '{}'", reference)
            }
            ValidationErrorKind::DepthExceeded { depth } => {
                format!("Evaluation exceeded the maximum depth of {}", depth)
            }
            ValidationErrorKind::Other { message } => message.clone(),
        }
    }
}

/// Validation error with instance and schema locations
#[derive(Debug, Clone, Error)]
pub struct ValidationError {
    /// The structured error kind
    pub kind: ValidationErrorKind,
    /// Where in the instance the error occurred (e.g., `/items/0`)
    pub instance_path: InstancePath,
    /// Which keyword path failed (e.g., `/properties/a/type`)
    pub schema_path: SchemaPath,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = self.kind.message();
        if self.instance_path.is_empty() {
            write!(f, "Validation error at instance root: {}", message)
        } else {
            write!(f, "Validation error at {}: {}", self.instance_path, message)
        }
    }
}

impl ValidationError {
    /// Create a new validation error with a structured kind
    pub fn new(kind: ValidationErrorKind, instance_path: InstancePath) -> Self {
        Self {
            kind,
            instance_path,
            schema_path: SchemaPath::new(),
        }
    }

    /// Get the human-readable message for this error
    pub fn message(&self) -> String {
        self.kind.message()
    }

    /// Set the schema path for this error
    pub fn with_schema_path(mut self, schema_path: SchemaPath) -> Self {
        self.schema_path = schema_path;
        self
    }
}

/// A segment in an instance path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object key
    Key(String),
    /// Array index
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", escape_pointer_token(key)),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Instance path, displayed in RFC 6901 pointer form (root is the empty string)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstancePath {
    segments: Vec<PathSegment>,
}

impl InstancePath {
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    pub fn push_key(&mut self, key: impl Into<String>) {
        self.segments.push(PathSegment::Key(key.into()));
    }

    pub fn push_index(&mut self, index: usize) {
        self.segments.push(PathSegment::Index(index));
    }

    pub fn pop(&mut self) -> Option<PathSegment> {
        self.segments.pop()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for InstancePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

/// Schema (keyword) path, displayed in RFC 6901 pointer form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaPath {
    segments: Vec<String>,
}

impl SchemaPath {
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.segments.pop()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", escape_pointer_token(segment))?;
        }
        Ok(())
    }
}

fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}
