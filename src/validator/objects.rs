//! Object applicators
//!
//! `properties`, `patternProperties` and `additionalProperties` each
//! publish the set of property names they evaluated; the
//! `additionalProperties` and `unevaluatedProperties` contracts consume
//! those annotations from the shared scope, which by keyword priority
//! is already populated when they run.

use crate::annotations::{AnnotationStore, AnnotationValue};
use crate::error::ValidationErrorKind;
use crate::schema::{CompiledPattern, Dependency, Keyword, Schema, SchemaObject};
use hashlink::LinkedHashMap;
use serde_json::{Map, Value};
use std::collections::HashSet;

use super::{evaluate, Outcome, ValidationContext};

pub(super) fn apply_properties(
    map: &LinkedHashMap<String, Schema>,
    instance: &Value,
    ctx: &mut ValidationContext,
    store: &mut AnnotationStore,
) -> Outcome {
    let Value::Object(entries) = instance else {
        return Outcome::pass_ignored();
    };
    let mut aggregate = Outcome::success();
    let mut matched = HashSet::new();
    for (name, subschema) in map {
        let Some(value) = entries.get(name.as_str()) else {
            continue;
        };
        matched.insert(name.clone());
        let (outcome, _) = ctx.with_schema_segment(name, |ctx| {
            ctx.with_instance_key(name, |ctx| evaluate(value, subschema, ctx))
        });
        aggregate = aggregate.and(outcome);
    }
    if aggregate.valid {
        store.insert("properties", AnnotationValue::Properties(matched));
    }
    aggregate
}

pub(super) fn apply_pattern_properties(
    patterns: &[(CompiledPattern, Schema)],
    instance: &Value,
    ctx: &mut ValidationContext,
    store: &mut AnnotationStore,
) -> Outcome {
    let Value::Object(entries) = instance else {
        return Outcome::pass_ignored();
    };
    let mut aggregate = Outcome::success();
    let mut matched = HashSet::new();
    for (pattern, subschema) in patterns {
        for (name, value) in entries {
            if !pattern.regex.is_match(name) {
                continue;
            }
            matched.insert(name.clone());
            let (outcome, _) = ctx.with_schema_segment(&pattern.source, |ctx| {
                ctx.with_instance_key(name, |ctx| evaluate(value, subschema, ctx))
            });
            aggregate = aggregate.and(outcome);
        }
    }
    if aggregate.valid {
        store.insert("patternProperties", AnnotationValue::Properties(matched));
    }
    aggregate
}

/// Properties not covered by `properties`/`patternProperties` in the
/// same schema, read from their annotations
pub(super) fn apply_additional_properties(
    schema: &Schema,
    instance: &Value,
    ctx: &mut ValidationContext,
    store: &mut AnnotationStore,
) -> Outcome {
    let Value::Object(entries) = instance else {
        return Outcome::pass_ignored();
    };
    let mut covered: HashSet<&str> = HashSet::new();
    if let Some(names) = store.properties_of("properties") {
        covered.extend(names.iter().map(String::as_str));
    }
    if let Some(names) = store.properties_of("patternProperties") {
        covered.extend(names.iter().map(String::as_str));
    }
    let extra: Vec<&String> = entries
        .keys()
        .filter(|name| !covered.contains(name.as_str()))
        .collect();

    validate_property_set(schema, &extra, entries, "additionalProperties", ctx, store)
}

/// Properties not evaluated by this schema or anything consolidated
/// into it
pub(super) fn apply_unevaluated_properties(
    schema: &Schema,
    instance: &Value,
    ctx: &mut ValidationContext,
    store: &mut AnnotationStore,
) -> Outcome {
    let Value::Object(entries) = instance else {
        return Outcome::pass_ignored();
    };
    let covered = store.evaluated_properties();
    let extra: Vec<&String> = entries
        .keys()
        .filter(|name| !covered.contains(name.as_str()))
        .collect();

    validate_property_set(schema, &extra, entries, "unevaluatedProperties", ctx, store)
}

fn validate_property_set(
    schema: &Schema,
    names: &[&String],
    entries: &Map<String, Value>,
    keyword: &str,
    ctx: &mut ValidationContext,
    store: &mut AnnotationStore,
) -> Outcome {
    let mut aggregate = Outcome::success();
    let mut evaluated = HashSet::new();
    for name in names {
        let Some(value) = entries.get(name.as_str()) else {
            continue;
        };
        evaluated.insert((*name).clone());
        let (outcome, _) =
            ctx.with_instance_key(name, |ctx| evaluate(value, schema, ctx));
        aggregate = aggregate.and(outcome);
    }
    if aggregate.valid {
        store.insert(keyword, AnnotationValue::Properties(evaluated));
    }
    aggregate
}

/// Each property name validates as a JSON string
pub(super) fn apply_property_names(
    schema: &Schema,
    instance: &Value,
    ctx: &mut ValidationContext,
) -> Outcome {
    let Value::Object(entries) = instance else {
        return Outcome::pass_ignored();
    };
    let mut aggregate = Outcome::success();
    for name in entries.keys() {
        let name_value = Value::String(name.clone());
        let (outcome, _) =
            ctx.with_instance_key(name, |ctx| evaluate(&name_value, schema, ctx));
        aggregate = aggregate.and(outcome);
    }
    aggregate
}

pub(super) fn apply_dependent_schemas(
    map: &LinkedHashMap<String, Schema>,
    instance: &Value,
    ctx: &mut ValidationContext,
    store: &mut AnnotationStore,
) -> Outcome {
    let Value::Object(entries) = instance else {
        return Outcome::pass_ignored();
    };
    let mut aggregate = Outcome::success();
    for (trigger, schema) in map {
        if !entries.contains_key(trigger.as_str()) {
            continue;
        }
        let (outcome, child_store) =
            ctx.with_schema_segment(trigger, |ctx| evaluate(instance, schema, ctx));
        // Applied in place: annotations consolidate
        if outcome.valid {
            store.merge_from(child_store);
        }
        aggregate = aggregate.and(outcome);
    }
    aggregate
}

/// Draft ≤7 `dependencies`: required keys or an in-place schema
pub(super) fn apply_dependencies(
    map: &LinkedHashMap<String, Dependency>,
    instance: &Value,
    ctx: &mut ValidationContext,
    store: &mut AnnotationStore,
) -> Outcome {
    let Value::Object(entries) = instance else {
        return Outcome::pass_ignored();
    };
    let mut aggregate = Outcome::success();
    for (trigger, dependency) in map {
        if !entries.contains_key(trigger.as_str()) {
            continue;
        }
        match dependency {
            Dependency::Keys(required) => {
                for property in required {
                    if !entries.contains_key(property.as_str()) {
                        aggregate = aggregate.and(ctx.fail(
                            ValidationErrorKind::MissingDependentProperty {
                                property: property.clone(),
                                dependency: trigger.clone(),
                            },
                        ));
                    }
                }
            }
            Dependency::Schema(schema) => {
                let (outcome, child_store) =
                    ctx.with_schema_segment(trigger, |ctx| evaluate(instance, schema, ctx));
                if outcome.valid {
                    store.merge_from(child_store);
                }
                aggregate = aggregate.and(outcome);
            }
        }
    }
    aggregate
}

/// `contentSchema` validates the decoded content when the host supplied
/// a decoder; without one the content keywords stay annotation-only
pub(super) fn apply_content_schema(
    schema: &Schema,
    obj: &SchemaObject,
    instance: &Value,
    ctx: &mut ValidationContext,
) -> Outcome {
    let Value::String(data) = instance else {
        return Outcome::pass_ignored();
    };
    let Some(decoder) = ctx.options.content_decoder.clone() else {
        return Outcome::success();
    };
    let media_type = match obj.keyword("contentMediaType") {
        Some(Keyword::ContentMediaType(media_type)) => media_type.clone(),
        _ => String::new(),
    };
    let encoding = match obj.keyword("contentEncoding") {
        Some(Keyword::ContentEncoding(encoding)) => encoding.clone(),
        _ => String::new(),
    };
    let Some(decoded) = decoder(&media_type, &encoding, data) else {
        return ctx.fail(ValidationErrorKind::ContentDecodeFailed {
            media_type,
            encoding,
        });
    };
    let (outcome, _discarded) = evaluate(&decoded, schema, ctx);
    outcome
}
