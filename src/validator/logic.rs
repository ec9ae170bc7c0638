//! Logical and conditional applicators

use crate::annotations::AnnotationStore;
use crate::error::ValidationErrorKind;
use crate::schema::{Keyword, Schema, SchemaObject};
use serde_json::Value;

use super::{evaluate, Outcome, ValidationContext};

/// `allOf`: every member must accept (AND)
pub(super) fn apply_all_of(
    schemas: &[Schema],
    instance: &Value,
    ctx: &mut ValidationContext,
    store: &mut AnnotationStore,
) -> Outcome {
    let mut aggregate = Outcome::success();
    for (index, schema) in schemas.iter().enumerate() {
        if ctx.short_circuit && !aggregate.valid {
            break;
        }
        let (outcome, child_store) = ctx.with_schema_segment(&index.to_string(), |ctx| {
            evaluate(instance, schema, ctx)
        });
        if outcome.valid {
            store.merge_from(child_store);
        }
        aggregate = aggregate.and(outcome);
    }
    aggregate
}

/// `anyOf`: at least one member must accept (OR); members evaluate in
/// author-declared order, stopping at the first success only under the
/// flag output format
pub(super) fn apply_any_of(
    schemas: &[Schema],
    instance: &Value,
    ctx: &mut ValidationContext,
    store: &mut AnnotationStore,
) -> Outcome {
    let mut aggregate = ctx.fail(ValidationErrorKind::AnyOfNoneMatched);
    let mut any_valid = false;
    for (index, schema) in schemas.iter().enumerate() {
        let (outcome, child_store) = ctx.with_schema_segment(&index.to_string(), |ctx| {
            evaluate(instance, schema, ctx)
        });
        if outcome.valid {
            any_valid = true;
            store.merge_from(child_store);
            if ctx.short_circuit {
                return Outcome::success();
            }
        }
        aggregate = aggregate.or(outcome);
    }
    if any_valid {
        Outcome::success()
    } else {
        aggregate
    }
}

/// `oneOf`: exactly one member must accept; ties fail
pub(super) fn apply_one_of(
    schemas: &[Schema],
    instance: &Value,
    ctx: &mut ValidationContext,
    store: &mut AnnotationStore,
) -> Outcome {
    let mut matched = 0usize;
    let mut winner: Option<AnnotationStore> = None;
    let mut failures = Vec::new();
    for (index, schema) in schemas.iter().enumerate() {
        let (outcome, child_store) = ctx.with_schema_segment(&index.to_string(), |ctx| {
            evaluate(instance, schema, ctx)
        });
        if outcome.valid {
            matched += 1;
            winner = Some(child_store);
            // Two matches decide the outcome; flag output may stop here
            if matched > 1 && ctx.short_circuit {
                break;
            }
        } else {
            failures.extend(outcome.errors);
        }
    }
    if matched == 1 {
        if let Some(child_store) = winner {
            store.merge_from(child_store);
        }
        return Outcome::success();
    }
    let mut outcome = ctx.fail(ValidationErrorKind::OneOfCountInvalid { matched });
    if matched == 0 {
        outcome.errors.extend(failures);
    }
    outcome
}

/// `not`: inverts its subschema; annotations never leak out
pub(super) fn apply_not(
    schema: &Schema,
    instance: &Value,
    ctx: &mut ValidationContext,
) -> Outcome {
    let (outcome, _discarded) = evaluate(instance, schema, ctx);
    if outcome.valid {
        ctx.fail(ValidationErrorKind::NotSatisfied)
    } else {
        Outcome::success()
    }
}

/// `if`/`then`/`else`: the condition is checked for validity only (its
/// annotations are discarded); the triggered branch validates normally
/// and its absence is success
pub(super) fn apply_if(
    condition: &Schema,
    obj: &SchemaObject,
    instance: &Value,
    ctx: &mut ValidationContext,
    store: &mut AnnotationStore,
) -> Outcome {
    let (checked, _discarded) = evaluate(instance, condition, ctx);
    let branch = if checked.valid {
        match obj.keyword("then") {
            Some(Keyword::Then(schema)) => Some(("then", schema.as_ref())),
            _ => None,
        }
    } else {
        match obj.keyword("else") {
            Some(Keyword::Else(schema)) => Some(("else", schema.as_ref())),
            _ => None,
        }
    };
    let Some((name, branch_schema)) = branch else {
        return Outcome::success();
    };
    // The branch lives beside `if` in the schema, not under it
    let popped = ctx.schema_path.pop();
    let (outcome, child_store) =
        ctx.with_schema_segment(name, |ctx| evaluate(instance, branch_schema, ctx));
    if let Some(segment) = popped {
        ctx.schema_path.push(segment);
    }
    if outcome.valid {
        store.merge_from(child_store);
    }
    outcome
}
