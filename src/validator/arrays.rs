//! Array applicators
//!
//! Item coverage is threaded through annotations: `prefixItems`/`items`
//! publish how far they reached, `contains` publishes the matched
//! indices, and `unevaluatedItems` consumes the consolidated coverage.
//! The positional keywords find their starting offset from their
//! sibling payloads (lexically), not from annotations, so a failing
//! prefix does not shift what `items` applies to.

use crate::annotations::{AnnotationStore, AnnotationValue, ItemCoverage};
use crate::draft::Draft;
use crate::error::ValidationErrorKind;
use crate::schema::{ItemsKeyword, Keyword, Schema, SchemaObject};
use serde_json::Value;
use std::collections::BTreeSet;

use super::{evaluate, Outcome, ValidationContext};

pub(super) fn apply_prefix_items(
    schemas: &[Schema],
    instance: &Value,
    ctx: &mut ValidationContext,
    store: &mut AnnotationStore,
) -> Outcome {
    let Value::Array(items) = instance else {
        return Outcome::pass_ignored();
    };
    let mut aggregate = Outcome::success();
    for (index, schema) in schemas.iter().enumerate() {
        let Some(item) = items.get(index) else {
            break;
        };
        let (outcome, _) = ctx.with_schema_segment(&index.to_string(), |ctx| {
            ctx.with_instance_index(index, |ctx| evaluate(item, schema, ctx))
        });
        aggregate = aggregate.and(outcome);
    }
    if aggregate.valid {
        let coverage = if schemas.len() >= items.len() {
            ItemCoverage::All
        } else {
            ItemCoverage::UpTo(schemas.len())
        };
        store.insert("prefixItems", AnnotationValue::Items(coverage));
    }
    aggregate
}

pub(super) fn apply_items(
    payload: &ItemsKeyword,
    obj: &SchemaObject,
    instance: &Value,
    ctx: &mut ValidationContext,
    store: &mut AnnotationStore,
) -> Outcome {
    let Value::Array(items) = instance else {
        return Outcome::pass_ignored();
    };
    match payload {
        ItemsKeyword::Single(schema) => {
            // Under 2020-12, items picks up where prefixItems leaves off
            let start = match obj.keyword("prefixItems") {
                Some(Keyword::PrefixItems(prefix)) if ctx.draft == Draft::Draft202012 => {
                    prefix.len()
                }
                _ => 0,
            };
            let mut aggregate = Outcome::success();
            for (index, item) in items.iter().enumerate().skip(start) {
                let (outcome, _) =
                    ctx.with_instance_index(index, |ctx| evaluate(item, schema, ctx));
                aggregate = aggregate.and(outcome);
            }
            if aggregate.valid {
                store.insert("items", AnnotationValue::Items(ItemCoverage::All));
            }
            aggregate
        }
        ItemsKeyword::Array(schemas) => {
            let mut aggregate = Outcome::success();
            for (index, schema) in schemas.iter().enumerate() {
                let Some(item) = items.get(index) else {
                    break;
                };
                let (outcome, _) = ctx.with_schema_segment(&index.to_string(), |ctx| {
                    ctx.with_instance_index(index, |ctx| evaluate(item, schema, ctx))
                });
                aggregate = aggregate.and(outcome);
            }
            if aggregate.valid {
                let coverage = if schemas.len() >= items.len() {
                    ItemCoverage::All
                } else {
                    ItemCoverage::UpTo(schemas.len())
                };
                store.insert("items", AnnotationValue::Items(coverage));
            }
            aggregate
        }
    }
}

/// Items past the positional `items` array; inert when `items` carries
/// a single schema
pub(super) fn apply_additional_items(
    schema: &Schema,
    obj: &SchemaObject,
    instance: &Value,
    ctx: &mut ValidationContext,
    store: &mut AnnotationStore,
) -> Outcome {
    let Value::Array(items) = instance else {
        return Outcome::pass_ignored();
    };
    let start = match obj.keyword("items") {
        Some(Keyword::Items(ItemsKeyword::Array(schemas))) => schemas.len(),
        _ => return Outcome::success(),
    };
    let mut aggregate = Outcome::success();
    for (index, item) in items.iter().enumerate().skip(start) {
        let (outcome, _) = ctx.with_instance_index(index, |ctx| evaluate(item, schema, ctx));
        aggregate = aggregate.and(outcome);
    }
    if aggregate.valid {
        store.insert("additionalItems", AnnotationValue::Items(ItemCoverage::All));
    }
    aggregate
}

/// Items not covered by the positional keywords or matched by
/// `contains`, consolidated across this schema's scope
pub(super) fn apply_unevaluated_items(
    schema: &Schema,
    instance: &Value,
    ctx: &mut ValidationContext,
    store: &mut AnnotationStore,
) -> Outcome {
    let Value::Array(items) = instance else {
        return Outcome::pass_ignored();
    };
    let covered = store.evaluated_items();
    let mut aggregate = Outcome::success();
    for (index, item) in items.iter().enumerate() {
        if covered.covers(index) {
            continue;
        }
        let (outcome, _) = ctx.with_instance_index(index, |ctx| evaluate(item, schema, ctx));
        aggregate = aggregate.and(outcome);
    }
    if aggregate.valid {
        store.insert("unevaluatedItems", AnnotationValue::Items(ItemCoverage::All));
    }
    aggregate
}

/// `contains` collects the matching indices as its annotation;
/// `minContains: 0` in the same schema forces success
pub(super) fn apply_contains(
    schema: &Schema,
    obj: &SchemaObject,
    instance: &Value,
    ctx: &mut ValidationContext,
    store: &mut AnnotationStore,
) -> Outcome {
    let Value::Array(items) = instance else {
        return Outcome::pass_ignored();
    };
    let mut matched = BTreeSet::new();
    for (index, item) in items.iter().enumerate() {
        let (outcome, _) = ctx.with_instance_index(index, |ctx| evaluate(item, schema, ctx));
        if outcome.valid {
            matched.insert(index);
        }
    }
    let min_is_zero = matches!(obj.keyword("minContains"), Some(Keyword::MinContains(0)));
    if matched.is_empty() && !min_is_zero {
        return ctx.fail(ValidationErrorKind::ContainsMismatch);
    }
    store.insert("contains", AnnotationValue::Indices(matched));
    Outcome::success()
}

/// Count from the `contains` annotation in the same scope
pub(super) fn apply_min_contains(
    bound: u64,
    obj: &SchemaObject,
    instance: &Value,
    ctx: &mut ValidationContext,
    store: &mut AnnotationStore,
) -> Outcome {
    if !matches!(instance, Value::Array(_)) {
        return Outcome::pass_ignored();
    }
    if obj.keyword("contains").is_none() {
        return Outcome::success();
    }
    let count = store.contains_count().unwrap_or(0);
    if count as u64 >= bound {
        return Outcome::success();
    }
    ctx.fail(ValidationErrorKind::ContainsCountInvalid {
        count,
        min_contains: Some(bound),
        max_contains: None,
    })
}

pub(super) fn apply_max_contains(
    bound: u64,
    obj: &SchemaObject,
    instance: &Value,
    ctx: &mut ValidationContext,
    store: &mut AnnotationStore,
) -> Outcome {
    if !matches!(instance, Value::Array(_)) {
        return Outcome::pass_ignored();
    }
    if obj.keyword("contains").is_none() {
        return Outcome::success();
    }
    let count = store.contains_count().unwrap_or(0);
    if count as u64 <= bound {
        return Outcome::success();
    }
    ctx.fail(ValidationErrorKind::ContainsCountInvalid {
        count,
        min_contains: None,
        max_contains: Some(bound),
    })
}
