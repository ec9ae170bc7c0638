// Evaluation engine for JSON Schema instances

mod arrays;
mod assertions;
mod logic;
mod objects;

use crate::annotations::{AnnotationStore, AnnotationValue};
use crate::draft::{Draft, Vocabulary, VocabularySet};
use crate::error::{InstancePath, SchemaPath, ValidationError, ValidationErrorKind};
use crate::error::SchemaError;
use crate::output::{self, Output, OutputFormat, OutputRecord};
use crate::registry::{Registry, RegistryEntry};
use crate::resolver;
use crate::schema::{keyword_info, Keyword, Schema, SchemaObject};
use crate::uri;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Decodes `(media_type, encoding, data)` into a value for `contentSchema`
pub type ContentDecoder = Arc<dyn Fn(&str, &str, &str) -> Option<Value> + Send + Sync>;

/// Options for a top-level validation call
#[derive(Clone)]
pub struct ValidateOptions {
    /// Output shape; only `flag` permits short-circuiting
    pub output_format: OutputFormat,
    /// Override the draft the schema declared; `None` follows the document
    pub validating_as: Option<Draft>,
    /// Base indentation for trace logging
    pub log_indent_level: usize,
    /// Treat `format` as an assertion even without the assertion vocabulary
    pub require_format_validation: bool,
    /// Base URI for inline validation
    pub default_base_uri: Option<String>,
    /// Recursion bound; exceeding it fails validation
    pub max_depth: usize,
    /// Optional content decoder enabling `contentSchema` validation
    pub content_decoder: Option<ContentDecoder>,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Flag,
            validating_as: None,
            log_indent_level: 0,
            require_format_validation: false,
            default_base_uri: None,
            max_depth: 512,
            content_decoder: None,
        }
    }
}

impl fmt::Debug for ValidateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidateOptions")
            .field("output_format", &self.output_format)
            .field("validating_as", &self.validating_as)
            .field("log_indent_level", &self.log_indent_level)
            .field("require_format_validation", &self.require_format_validation)
            .field("default_base_uri", &self.default_base_uri)
            .field("max_depth", &self.max_depth)
            .field("content_decoder", &self.content_decoder.is_some())
            .finish()
    }
}

const INLINE_BASE_URI: &str = "json-schema:///inline";

/// Validate an instance against a registered schema
pub fn validate(
    instance: &Value,
    uri: &str,
    registry: &Registry,
    options: &ValidateOptions,
) -> Result<Output, SchemaError> {
    let canonical = uri::canonical(uri)?;
    let entry = registry
        .get(&canonical)
        .ok_or_else(|| SchemaError::UnknownSchema(canonical.clone()))?;
    let mut ctx = ValidationContext::new(registry, options, canonical.clone(), entry);
    let (outcome, _) = evaluate(instance, &entry.schema, &mut ctx);
    tracing::debug!(
        uri = %canonical,
        valid = outcome.valid,
        errors = outcome.errors.len(),
        "Validation finished"
    );
    let first_error = outcome.errors.first().map(|error| error.message());
    Ok(output::render(
        outcome.valid,
        first_error,
        ctx.records,
        options.output_format,
    ))
}

/// Validate an instance against an inline schema document
///
/// The document is registered under `default_base_uri` (or a fixed
/// synthetic URI) in a private registry.
pub fn validate_inline(
    schema: &Value,
    instance: &Value,
    options: &ValidateOptions,
) -> Result<Output, SchemaError> {
    let mut registry = Registry::new();
    let base = options
        .default_base_uri
        .clone()
        .unwrap_or_else(|| INLINE_BASE_URI.to_string());
    let uri = registry.register(schema, &base)?;
    validate(instance, &uri, &registry, options)
}

/// The mergeable result of evaluating a schema or keyword
#[derive(Debug, Clone, Default)]
pub(crate) struct Outcome {
    pub valid: bool,
    /// The keyword did not apply to this instance kind
    pub ignored: bool,
    pub errors: Vec<ValidationError>,
}

impl Outcome {
    pub fn success() -> Self {
        Self {
            valid: true,
            ignored: false,
            errors: Vec::new(),
        }
    }

    /// Success because the keyword does not apply to this instance kind
    pub fn pass_ignored() -> Self {
        Self {
            valid: true,
            ignored: true,
            errors: Vec::new(),
        }
    }

    pub fn failure(error: ValidationError) -> Self {
        Self {
            valid: false,
            ignored: false,
            errors: vec![error],
        }
    }

    /// AND merge: both must hold; errors accumulate
    pub fn and(mut self, other: Outcome) -> Outcome {
        self.valid = self.valid && other.valid;
        self.ignored = self.ignored && other.ignored;
        self.errors.extend(other.errors);
        self
    }

    /// OR merge: one suffices; errors survive only while invalid
    pub fn or(mut self, other: Outcome) -> Outcome {
        if self.valid || other.valid {
            return Outcome {
                valid: true,
                ignored: self.ignored && other.ignored,
                errors: Vec::new(),
            };
        }
        self.errors.extend(other.errors);
        self
    }
}

/// Mutable state threaded along the active evaluation call stack
pub struct ValidationContext<'a> {
    pub(crate) registry: &'a Registry,
    pub(crate) options: &'a ValidateOptions,
    /// Current lexical base URI
    pub(crate) base_uri: String,
    /// Draft keyword applicability is filtered against
    pub(crate) draft: Draft,
    pub(crate) vocabularies: VocabularySet,
    /// URIs entered via reference traversal, outermost first
    pub(crate) dynamic_scope: Vec<String>,
    /// (absolute reference, instance fingerprint) pairs on the stack
    pub(crate) visited: HashSet<(String, u64)>,
    pub(crate) instance_path: InstancePath,
    pub(crate) schema_path: SchemaPath,
    pub(crate) depth: usize,
    pub(crate) records: Vec<OutputRecord>,
    /// Whether the schema currently being evaluated may stop early:
    /// flag output, and no sibling keyword consumes annotations
    pub(crate) short_circuit: bool,
}

impl<'a> ValidationContext<'a> {
    pub(crate) fn new(
        registry: &'a Registry,
        options: &'a ValidateOptions,
        uri: String,
        entry: &RegistryEntry,
    ) -> Self {
        Self {
            registry,
            options,
            base_uri: uri.clone(),
            draft: options.validating_as.unwrap_or(entry.draft),
            vocabularies: entry.vocabularies,
            dynamic_scope: vec![uri],
            visited: HashSet::new(),
            instance_path: InstancePath::new(),
            schema_path: SchemaPath::new(),
            depth: 0,
            records: Vec::new(),
            short_circuit: false,
        }
    }

    /// Build a validation error at the current location
    pub(crate) fn error(&self, kind: ValidationErrorKind) -> ValidationError {
        ValidationError::new(kind, self.instance_path.clone())
            .with_schema_path(self.schema_path.clone())
    }

    /// Fail at the current location
    pub(crate) fn fail(&self, kind: ValidationErrorKind) -> Outcome {
        Outcome::failure(self.error(kind))
    }

    pub(crate) fn with_instance_key<F, R>(&mut self, key: &str, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.instance_path.push_key(key);
        let result = f(self);
        self.instance_path.pop();
        result
    }

    pub(crate) fn with_instance_index<F, R>(&mut self, index: usize, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.instance_path.push_index(index);
        let result = f(self);
        self.instance_path.pop();
        result
    }

    pub(crate) fn with_schema_segment<F, R>(&mut self, segment: &str, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.schema_path.push(segment);
        let result = f(self);
        self.schema_path.pop();
        result
    }

    /// Rebind the lexical base URI for the duration of `f`
    pub(crate) fn with_base_uri<F, R>(&mut self, uri: String, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        let saved = std::mem::replace(&mut self.base_uri, uri);
        let result = f(self);
        self.base_uri = saved;
        result
    }

    /// Rebind base URI, draft and vocabularies while evaluating a
    /// reference target in another resource
    pub(crate) fn with_resource<F, R>(&mut self, uri: String, entry: &RegistryEntry, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        let saved_uri = std::mem::replace(&mut self.base_uri, uri);
        let saved_draft = self.draft;
        let saved_vocabularies = self.vocabularies;
        if self.options.validating_as.is_none() {
            self.draft = entry.draft;
        }
        self.vocabularies = entry.vocabularies;
        let result = f(self);
        self.base_uri = saved_uri;
        self.draft = saved_draft;
        self.vocabularies = saved_vocabularies;
        result
    }

    /// Extend the dynamic scope with a URI entered via a reference
    ///
    /// Scope entries persist for the rest of the top-level call: the
    /// scope is the chain of URIs encountered, not a nesting stack.
    pub(crate) fn enter_dynamic_scope(&mut self, uri: &str) {
        if !self.dynamic_scope.iter().any(|entry| entry == uri) {
            self.dynamic_scope.push(uri.to_string());
        }
    }

    fn keyword_applicable(&self, keyword: &Keyword) -> bool {
        let Some(info) = keyword_info(keyword.name()) else {
            // Unknown keywords always emit their pass-through annotation
            return true;
        };
        if !info.drafts.contains(self.draft) {
            return false;
        }
        if info.vocabulary == Vocabulary::FormatAnnotation {
            return self.vocabularies.contains(Vocabulary::FormatAnnotation)
                || self.vocabularies.contains(Vocabulary::FormatAssertion)
                || self.options.require_format_validation;
        }
        self.vocabularies.contains(info.vocabulary)
    }

    /// Whether `format` must assert rather than annotate
    pub(crate) fn format_asserts(&self) -> bool {
        self.vocabularies.contains(Vocabulary::FormatAssertion)
            || self.options.require_format_validation
    }

    fn record_keyword(&mut self, keyword: &Keyword, outcome: &Outcome) {
        if self.options.output_format == OutputFormat::Flag {
            return;
        }
        // Successful units are recorded too: detailed rendering prunes
        // whole valid subtrees, so a failed branch inside a succeeded
        // anyOf disappears with its parent instead of dangling.
        // Identity containers never execute; skip their noise.
        if matches!(keyword, Keyword::Defs(_) | Keyword::Definitions(_)) {
            return;
        }
        self.records.push(OutputRecord {
            valid: outcome.valid,
            keyword_location: self.schema_path.to_string(),
            instance_location: self.instance_path.to_string(),
            error: outcome.errors.first().map(|error| error.message()),
        });
    }
}

/// Evaluate a schema against an instance
///
/// Returns the outcome together with the annotation scope the schema
/// produced; callers (applicators) consolidate that scope into their
/// own when the result is valid.
pub(crate) fn evaluate(
    instance: &Value,
    schema: &Schema,
    ctx: &mut ValidationContext,
) -> (Outcome, AnnotationStore) {
    match schema {
        Schema::Bool(true) => (Outcome::success(), AnnotationStore::new()),
        Schema::Bool(false) => (
            ctx.fail(ValidationErrorKind::FalseSchema),
            AnnotationStore::new(),
        ),
        Schema::Object(obj) => {
            if ctx.depth >= ctx.options.max_depth {
                return (
                    ctx.fail(ValidationErrorKind::DepthExceeded {
                        depth: ctx.options.max_depth,
                    }),
                    AnnotationStore::new(),
                );
            }
            ctx.depth += 1;
            let result = match &obj.base_uri {
                Some(base) if *base != ctx.base_uri => {
                    ctx.with_base_uri(base.clone(), |ctx| evaluate_object(instance, obj, ctx))
                }
                _ => evaluate_object(instance, obj, ctx),
            };
            ctx.depth -= 1;
            result
        }
    }
}

fn evaluate_object(
    instance: &Value,
    obj: &SchemaObject,
    ctx: &mut ValidationContext,
) -> (Outcome, AnnotationStore) {
    let mut store = AnnotationStore::new();
    let mut aggregate = Outcome::success();
    // Short-circuiting is allowed only under the flag format, and never
    // past keywords whose annotations a later keyword consumes. The
    // flag extends into nested applicators (anyOf stopping at its first
    // success), which must also run to completion when a sibling
    // consumer needs their annotations.
    let saved_short_circuit = ctx.short_circuit;
    ctx.short_circuit =
        ctx.options.output_format == OutputFormat::Flag && !obj.needs_annotations;

    for keyword in &obj.keywords {
        if !ctx.keyword_applicable(keyword) {
            continue;
        }
        if ctx.short_circuit && !aggregate.valid {
            break;
        }
        tracing::trace!(
            indent = ctx.options.log_indent_level + ctx.depth,
            keyword = keyword.name(),
            at = %ctx.instance_path,
            "Applying keyword"
        );
        let name = keyword.name().to_string();
        let outcome = ctx.with_schema_segment(&name, |ctx| {
            let outcome = apply_keyword(keyword, obj, instance, ctx, &mut store);
            ctx.record_keyword(keyword, &outcome);
            outcome
        });
        aggregate = aggregate.and(outcome);
    }
    ctx.short_circuit = saved_short_circuit;
    (aggregate, store)
}

fn apply_keyword(
    keyword: &Keyword,
    obj: &SchemaObject,
    instance: &Value,
    ctx: &mut ValidationContext,
    store: &mut AnnotationStore,
) -> Outcome {
    match keyword {
        Keyword::Ref(reference) => {
            resolver::apply_reference(reference, resolver::RefStyle::Static, instance, ctx, store)
        }
        Keyword::DynamicRef(reference) => {
            resolver::apply_reference(reference, resolver::RefStyle::Dynamic, instance, ctx, store)
        }
        Keyword::RecursiveRef(reference) => resolver::apply_reference(
            reference,
            resolver::RefStyle::Recursive,
            instance,
            ctx,
            store,
        ),

        Keyword::Defs(_) | Keyword::Definitions(_) => Outcome::success(),

        Keyword::AllOf(schemas) => logic::apply_all_of(schemas, instance, ctx, store),
        Keyword::AnyOf(schemas) => logic::apply_any_of(schemas, instance, ctx, store),
        Keyword::OneOf(schemas) => logic::apply_one_of(schemas, instance, ctx, store),
        Keyword::Not(schema) => logic::apply_not(schema, instance, ctx),
        Keyword::If(schema) => logic::apply_if(schema, obj, instance, ctx, store),
        // `then`/`else` are driven from `if`; standing alone they hold
        Keyword::Then(_) | Keyword::Else(_) => Outcome::success(),

        Keyword::Properties(map) => objects::apply_properties(map, instance, ctx, store),
        Keyword::PatternProperties(patterns) => {
            objects::apply_pattern_properties(patterns, instance, ctx, store)
        }
        Keyword::AdditionalProperties(schema) => {
            objects::apply_additional_properties(schema, instance, ctx, store)
        }
        Keyword::UnevaluatedProperties(schema) => {
            objects::apply_unevaluated_properties(schema, instance, ctx, store)
        }
        Keyword::PropertyNames(schema) => objects::apply_property_names(schema, instance, ctx),
        Keyword::DependentSchemas(map) => {
            objects::apply_dependent_schemas(map, instance, ctx, store)
        }
        Keyword::Dependencies(map) => objects::apply_dependencies(map, instance, ctx, store),

        Keyword::PrefixItems(schemas) => {
            arrays::apply_prefix_items(schemas, instance, ctx, store)
        }
        Keyword::Items(items) => arrays::apply_items(items, obj, instance, ctx, store),
        Keyword::AdditionalItems(schema) => {
            arrays::apply_additional_items(schema, obj, instance, ctx, store)
        }
        Keyword::UnevaluatedItems(schema) => {
            arrays::apply_unevaluated_items(schema, instance, ctx, store)
        }
        Keyword::Contains(schema) => arrays::apply_contains(schema, obj, instance, ctx, store),
        Keyword::MinContains(bound) => arrays::apply_min_contains(*bound, obj, instance, ctx, store),
        Keyword::MaxContains(bound) => arrays::apply_max_contains(*bound, obj, instance, ctx, store),

        Keyword::Type(types) => assertions::apply_type(types, instance, ctx),
        Keyword::Enum(values) => assertions::apply_enum(values, instance, ctx),
        Keyword::Const(expected) => assertions::apply_const(expected, instance, ctx),
        Keyword::Minimum(bound) => assertions::apply_minimum(bound, instance, ctx),
        Keyword::Maximum(bound) => assertions::apply_maximum(bound, instance, ctx),
        Keyword::ExclusiveMinimum(bound) => {
            assertions::apply_exclusive_minimum(bound, instance, ctx)
        }
        Keyword::ExclusiveMaximum(bound) => {
            assertions::apply_exclusive_maximum(bound, instance, ctx)
        }
        Keyword::MultipleOf(factor) => assertions::apply_multiple_of(factor, instance, ctx),
        Keyword::MinLength(bound) => assertions::apply_min_length(*bound, instance, ctx),
        Keyword::MaxLength(bound) => assertions::apply_max_length(*bound, instance, ctx),
        Keyword::Pattern(pattern) => assertions::apply_pattern(pattern, instance, ctx),
        Keyword::MinItems(bound) => assertions::apply_min_items(*bound, instance, ctx),
        Keyword::MaxItems(bound) => assertions::apply_max_items(*bound, instance, ctx),
        Keyword::UniqueItems(unique) => assertions::apply_unique_items(*unique, instance, ctx),
        Keyword::MinProperties(bound) => assertions::apply_min_properties(*bound, instance, ctx),
        Keyword::MaxProperties(bound) => assertions::apply_max_properties(*bound, instance, ctx),
        Keyword::Required(properties) => assertions::apply_required(properties, instance, ctx),
        Keyword::DependentRequired(map) => {
            assertions::apply_dependent_required(map, instance, ctx)
        }
        Keyword::Format(name) => assertions::apply_format(name, instance, ctx, store),

        Keyword::ContentEncoding(encoding) => {
            store.insert("contentEncoding", AnnotationValue::Json(Value::String(encoding.clone())));
            Outcome::success()
        }
        Keyword::ContentMediaType(media_type) => {
            store.insert(
                "contentMediaType",
                AnnotationValue::Json(Value::String(media_type.clone())),
            );
            Outcome::success()
        }
        Keyword::ContentSchema(schema) => {
            objects::apply_content_schema(schema, obj, instance, ctx)
        }

        Keyword::Title(text) => annotate(store, "title", Value::String(text.clone())),
        Keyword::Description(text) => annotate(store, "description", Value::String(text.clone())),
        Keyword::Default(value) => annotate(store, "default", value.clone()),
        Keyword::Examples(values) => {
            annotate(store, "examples", Value::Array(values.clone()))
        }
        Keyword::Deprecated(flag) => annotate(store, "deprecated", Value::Bool(*flag)),
        Keyword::ReadOnly(flag) => annotate(store, "readOnly", Value::Bool(*flag)),
        Keyword::WriteOnly(flag) => annotate(store, "writeOnly", Value::Bool(*flag)),
        Keyword::Comment(_) => Outcome::success(),

        Keyword::Unknown(name, value) => {
            store.insert(name, AnnotationValue::Json(value.clone()));
            Outcome::success()
        }
    }
}

fn annotate(store: &mut AnnotationStore, keyword: &str, value: Value) -> Outcome {
    store.insert(keyword, AnnotationValue::Json(value));
    Outcome::success()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn error(kind: ValidationErrorKind) -> ValidationError {
        ValidationError::new(kind, InstancePath::new())
    }

    #[test]
    fn test_outcome_and_merge() {
        let merged = Outcome::success().and(Outcome::failure(error(
            ValidationErrorKind::FalseSchema,
        )));
        assert!(!merged.valid);
        assert_eq!(merged.errors.len(), 1);

        let merged = Outcome::success().and(Outcome::pass_ignored());
        assert!(merged.valid);
        assert!(!merged.ignored);
    }

    #[test]
    fn test_outcome_or_merge() {
        let merged = Outcome::failure(error(ValidationErrorKind::FalseSchema))
            .or(Outcome::success());
        assert!(merged.valid);
        assert!(merged.errors.is_empty());

        let merged = Outcome::failure(error(ValidationErrorKind::FalseSchema)).or(
            Outcome::failure(error(ValidationErrorKind::NotSatisfied)),
        );
        assert!(!merged.valid);
        assert_eq!(merged.errors.len(), 2);
    }

    #[test]
    fn test_inline_validation_round_trip() {
        let schema = json!({"type": "string"});
        assert!(validate_inline(&schema, &json!("x"), &ValidateOptions::default())
            .unwrap()
            .valid());
        assert!(!validate_inline(&schema, &json!(1), &ValidateOptions::default())
            .unwrap()
            .valid());
    }

    #[test]
    fn test_inline_respects_default_base_uri() {
        let schema = json!({
            "$defs": {"leaf": {"$id": "leaf.json", "type": "integer"}},
            "$ref": "leaf.json"
        });
        let options = ValidateOptions {
            default_base_uri: Some("https://example.com/root.json".to_string()),
            ..Default::default()
        };
        assert!(validate_inline(&schema, &json!(3), &options).unwrap().valid());
        assert!(!validate_inline(&schema, &json!("x"), &options).unwrap().valid());
    }

    #[test]
    fn test_unknown_uri_is_a_schema_error() {
        let registry = Registry::new();
        let result = validate(
            &json!(1),
            "https://example.com/missing",
            &registry,
            &ValidateOptions::default(),
        );
        assert!(matches!(result, Err(SchemaError::UnknownSchema(_))));
    }

    #[test]
    fn test_metadata_keywords_never_fail() {
        let schema = json!({
            "title": "A number",
            "description": "Any number at all",
            "default": 0,
            "examples": [1, 2],
            "deprecated": true,
            "readOnly": false,
            "$comment": "metadata only",
            "x-internal": {"tag": 7}
        });
        assert!(validate_inline(&schema, &json!("anything"), &ValidateOptions::default())
            .unwrap()
            .valid());
    }
}
