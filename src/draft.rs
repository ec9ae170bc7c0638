//! Draft and vocabulary enumeration
//!
//! A schema document declares its draft through `$schema`; validation
//! may override it with `ValidateOptions::validating_as`. Keyword
//! applicability is filtered per draft (a [`DraftSet`] mask in the
//! keyword metadata table) and per vocabulary (the active
//! [`VocabularySet`] of the registry entry).

use serde_json::Value;

/// The JSON Schema drafts this engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Draft {
    Draft6,
    Draft7,
    Draft201909,
    Draft202012,
}

impl Draft {
    /// Resolve a `$schema` URI to a draft
    pub fn from_meta_schema(uri: &str) -> Option<Draft> {
        // Trailing `#` and the http/https distinction are immaterial
        let trimmed = uri.trim_end_matches('#');
        let trimmed = trimmed
            .strip_prefix("http://")
            .or_else(|| trimmed.strip_prefix("https://"))
            .unwrap_or(trimmed);
        match trimmed {
            "json-schema.org/draft-06/schema" => Some(Draft::Draft6),
            "json-schema.org/draft-07/schema" => Some(Draft::Draft7),
            "json-schema.org/draft/2019-09/schema" => Some(Draft::Draft201909),
            "json-schema.org/draft/2020-12/schema" => Some(Draft::Draft202012),
            _ => None,
        }
    }

    /// The canonical meta-schema URI for this draft
    pub fn meta_schema(self) -> &'static str {
        match self {
            Draft::Draft6 => "http://json-schema.org/draft-06/schema#",
            Draft::Draft7 => "http://json-schema.org/draft-07/schema#",
            Draft::Draft201909 => "https://json-schema.org/draft/2019-09/schema",
            Draft::Draft202012 => "https://json-schema.org/draft/2020-12/schema",
        }
    }

    /// The draft assumed when a document carries no `$schema`
    pub const fn latest() -> Draft {
        Draft::Draft202012
    }

    const fn bit(self) -> u8 {
        match self {
            Draft::Draft6 => 1,
            Draft::Draft7 => 2,
            Draft::Draft201909 => 4,
            Draft::Draft202012 => 8,
        }
    }
}

/// A set of drafts, used by the keyword metadata table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftSet(u8);

impl DraftSet {
    pub const NONE: DraftSet = DraftSet(0);
    /// All supported drafts
    pub const ALL: DraftSet = DraftSet(1 | 2 | 4 | 8);
    /// Drafts 6 and 7
    pub const CLASSIC: DraftSet = DraftSet(1 | 2);
    /// Drafts 6, 7 and 2019-09 (pre-`prefixItems` array model)
    pub const UP_TO_2019: DraftSet = DraftSet(1 | 2 | 4);
    /// Draft 7 and later
    pub const FROM_7: DraftSet = DraftSet(2 | 4 | 8);
    /// 2019-09 and 2020-12
    pub const MODERN: DraftSet = DraftSet(4 | 8);
    /// 2019-09 only
    pub const ONLY_2019: DraftSet = DraftSet(4);
    /// 2020-12 only
    pub const ONLY_2020: DraftSet = DraftSet(8);

    pub const fn contains(self, draft: Draft) -> bool {
        self.0 & draft.bit() != 0
    }
}

/// Standard vocabularies (2019-09 and 2020-12 naming)
///
/// Drafts 6 and 7 have no vocabulary mechanism; their keywords map onto
/// these buckets so the evaluation filter stays uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vocabulary {
    Core,
    Applicator,
    Unevaluated,
    Validation,
    MetaData,
    FormatAnnotation,
    FormatAssertion,
    Content,
}

impl Vocabulary {
    const fn bit(self) -> u16 {
        match self {
            Vocabulary::Core => 1,
            Vocabulary::Applicator => 2,
            Vocabulary::Unevaluated => 4,
            Vocabulary::Validation => 8,
            Vocabulary::MetaData => 16,
            Vocabulary::FormatAnnotation => 32,
            Vocabulary::FormatAssertion => 64,
            Vocabulary::Content => 128,
        }
    }

    /// Map a `$vocabulary` URI to its vocabulary by final path segment
    pub fn from_uri(uri: &str) -> Option<Vocabulary> {
        let segment = uri.trim_end_matches('/').rsplit('/').next()?;
        match segment {
            "core" => Some(Vocabulary::Core),
            "applicator" => Some(Vocabulary::Applicator),
            "unevaluated" => Some(Vocabulary::Unevaluated),
            "validation" => Some(Vocabulary::Validation),
            "meta-data" => Some(Vocabulary::MetaData),
            "format-annotation" | "format" => Some(Vocabulary::FormatAnnotation),
            "format-assertion" => Some(Vocabulary::FormatAssertion),
            "content" => Some(Vocabulary::Content),
            _ => None,
        }
    }
}

/// The set of vocabularies active for a registry entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VocabularySet(u16);

impl VocabularySet {
    pub const fn empty() -> Self {
        VocabularySet(0)
    }

    /// Default set for a draft: everything except format assertion
    pub fn default_for(_draft: Draft) -> Self {
        VocabularySet(
            Vocabulary::Core.bit()
                | Vocabulary::Applicator.bit()
                | Vocabulary::Unevaluated.bit()
                | Vocabulary::Validation.bit()
                | Vocabulary::MetaData.bit()
                | Vocabulary::FormatAnnotation.bit()
                | Vocabulary::Content.bit(),
        )
    }

    /// Derive the set from a root `$vocabulary` object, if present
    ///
    /// URIs mapping to no known vocabulary are skipped; a `false` value
    /// disables optional use of that vocabulary. Core is always active.
    pub fn from_document(document: &Value, draft: Draft) -> Self {
        let Some(Value::Object(entries)) = document.get("$vocabulary") else {
            return Self::default_for(draft);
        };
        let mut set = VocabularySet(Vocabulary::Core.bit());
        for (uri, enabled) in entries {
            if enabled.as_bool() == Some(false) {
                continue;
            }
            if let Some(vocabulary) = Vocabulary::from_uri(uri) {
                set.insert(vocabulary);
            }
        }
        set
    }

    pub fn insert(&mut self, vocabulary: Vocabulary) {
        self.0 |= vocabulary.bit();
    }

    pub const fn contains(self, vocabulary: Vocabulary) -> bool {
        self.0 & vocabulary.bit() != 0
    }
}
