//! Non-applicator validation keywords
//!
//! Each contract receives the instance and returns an [`Outcome`]. A
//! keyword applied to an instance kind it does not cover reports
//! success with the ignored note; applicability is decided by the
//! other keywords of the schema (usually `type`).

use crate::annotations::{AnnotationStore, AnnotationValue};
use crate::error::ValidationErrorKind;
use crate::format;
use crate::schema::{CompiledPattern, InstanceType};
use crate::value;
use hashlink::LinkedHashMap;
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::collections::HashMap;

use super::{Outcome, ValidationContext};

pub(super) fn apply_type(
    types: &[InstanceType],
    instance: &Value,
    ctx: &ValidationContext,
) -> Outcome {
    let matched = types.iter().any(|t| type_matches(*t, instance));
    if matched {
        return Outcome::success();
    }
    let expected = types
        .iter()
        .map(|t| t.name().to_string())
        .collect::<Vec<_>>()
        .join(" or ");
    ctx.fail(ValidationErrorKind::TypeMismatch {
        expected,
        got: value::kind_name(instance).to_string(),
    })
}

fn type_matches(expected: InstanceType, instance: &Value) -> bool {
    match (expected, instance) {
        (InstanceType::Null, Value::Null) => true,
        (InstanceType::Boolean, Value::Bool(_)) => true,
        (InstanceType::Number, Value::Number(_)) => true,
        (InstanceType::Integer, Value::Number(n)) => value::is_integer_number(n),
        (InstanceType::String, Value::String(_)) => true,
        (InstanceType::Array, Value::Array(_)) => true,
        (InstanceType::Object, Value::Object(_)) => true,
        _ => false,
    }
}

pub(super) fn apply_enum(values: &[Value], instance: &Value, ctx: &ValidationContext) -> Outcome {
    if values.iter().any(|allowed| value::json_equal(instance, allowed)) {
        return Outcome::success();
    }
    ctx.fail(ValidationErrorKind::NotInEnum {
        value: instance.to_string(),
        allowed: values.iter().map(|v| v.to_string()).collect(),
    })
}

pub(super) fn apply_const(
    expected: &Value,
    instance: &Value,
    ctx: &ValidationContext,
) -> Outcome {
    if value::json_equal(instance, expected) {
        return Outcome::success();
    }
    ctx.fail(ValidationErrorKind::ConstMismatch {
        value: instance.to_string(),
        expected: expected.to_string(),
    })
}

pub(super) fn apply_minimum(bound: &Number, instance: &Value, ctx: &ValidationContext) -> Outcome {
    let Value::Number(number) = instance else {
        return Outcome::pass_ignored();
    };
    if matches!(
        value::number_cmp(number, bound),
        Some(Ordering::Greater | Ordering::Equal)
    ) {
        return Outcome::success();
    }
    ctx.fail(ValidationErrorKind::NumberOutOfRange {
        value: number.to_string(),
        minimum: Some(bound.to_string()),
        maximum: None,
        exclusive_minimum: None,
        exclusive_maximum: None,
    })
}

pub(super) fn apply_maximum(bound: &Number, instance: &Value, ctx: &ValidationContext) -> Outcome {
    let Value::Number(number) = instance else {
        return Outcome::pass_ignored();
    };
    if matches!(
        value::number_cmp(number, bound),
        Some(Ordering::Less | Ordering::Equal)
    ) {
        return Outcome::success();
    }
    ctx.fail(ValidationErrorKind::NumberOutOfRange {
        value: number.to_string(),
        minimum: None,
        maximum: Some(bound.to_string()),
        exclusive_minimum: None,
        exclusive_maximum: None,
    })
}

pub(super) fn apply_exclusive_minimum(
    bound: &Number,
    instance: &Value,
    ctx: &ValidationContext,
) -> Outcome {
    let Value::Number(number) = instance else {
        return Outcome::pass_ignored();
    };
    if matches!(value::number_cmp(number, bound), Some(Ordering::Greater)) {
        return Outcome::success();
    }
    ctx.fail(ValidationErrorKind::NumberOutOfRange {
        value: number.to_string(),
        minimum: None,
        maximum: None,
        exclusive_minimum: Some(bound.to_string()),
        exclusive_maximum: None,
    })
}

pub(super) fn apply_exclusive_maximum(
    bound: &Number,
    instance: &Value,
    ctx: &ValidationContext,
) -> Outcome {
    let Value::Number(number) = instance else {
        return Outcome::pass_ignored();
    };
    if matches!(value::number_cmp(number, bound), Some(Ordering::Less)) {
        return Outcome::success();
    }
    ctx.fail(ValidationErrorKind::NumberOutOfRange {
        value: number.to_string(),
        minimum: None,
        maximum: None,
        exclusive_minimum: None,
        exclusive_maximum: Some(bound.to_string()),
    })
}

pub(super) fn apply_multiple_of(
    factor: &Number,
    instance: &Value,
    ctx: &ValidationContext,
) -> Outcome {
    let Value::Number(number) = instance else {
        return Outcome::pass_ignored();
    };
    if is_multiple_of(number, factor) {
        return Outcome::success();
    }
    ctx.fail(ValidationErrorKind::NotMultipleOf {
        value: number.to_string(),
        multiple_of: factor.to_string(),
    })
}

fn is_multiple_of(number: &Number, factor: &Number) -> bool {
    if let (Some(n), Some(f)) = (number.as_i64(), factor.as_i64()) {
        return f != 0 && n % f == 0;
    }
    let (Some(n), Some(f)) = (number.as_f64(), factor.as_f64()) else {
        return false;
    };
    if f == 0.0 {
        return false;
    }
    let quotient = n / f;
    (quotient - quotient.round()).abs() <= f64::EPSILON * quotient.abs().max(1.0)
}

pub(super) fn apply_min_length(bound: u64, instance: &Value, ctx: &ValidationContext) -> Outcome {
    let Value::String(text) = instance else {
        return Outcome::pass_ignored();
    };
    let length = text.chars().count();
    if length as u64 >= bound {
        return Outcome::success();
    }
    ctx.fail(ValidationErrorKind::StringLengthInvalid {
        length,
        min_length: Some(bound),
        max_length: None,
    })
}

pub(super) fn apply_max_length(bound: u64, instance: &Value, ctx: &ValidationContext) -> Outcome {
    let Value::String(text) = instance else {
        return Outcome::pass_ignored();
    };
    let length = text.chars().count();
    if length as u64 <= bound {
        return Outcome::success();
    }
    ctx.fail(ValidationErrorKind::StringLengthInvalid {
        length,
        min_length: None,
        max_length: Some(bound),
    })
}

pub(super) fn apply_pattern(
    pattern: &CompiledPattern,
    instance: &Value,
    ctx: &ValidationContext,
) -> Outcome {
    let Value::String(text) = instance else {
        return Outcome::pass_ignored();
    };
    if pattern.regex.is_match(text) {
        return Outcome::success();
    }
    ctx.fail(ValidationErrorKind::PatternMismatch {
        value: instance.to_string(),
        pattern: pattern.source.clone(),
    })
}

pub(super) fn apply_min_items(bound: u64, instance: &Value, ctx: &ValidationContext) -> Outcome {
    let Value::Array(items) = instance else {
        return Outcome::pass_ignored();
    };
    if items.len() as u64 >= bound {
        return Outcome::success();
    }
    ctx.fail(ValidationErrorKind::ArrayLengthInvalid {
        length: items.len(),
        min_items: Some(bound),
        max_items: None,
    })
}

pub(super) fn apply_max_items(bound: u64, instance: &Value, ctx: &ValidationContext) -> Outcome {
    let Value::Array(items) = instance else {
        return Outcome::pass_ignored();
    };
    if items.len() as u64 <= bound {
        return Outcome::success();
    }
    ctx.fail(ValidationErrorKind::ArrayLengthInvalid {
        length: items.len(),
        min_items: None,
        max_items: Some(bound),
    })
}

pub(super) fn apply_unique_items(
    unique: bool,
    instance: &Value,
    ctx: &ValidationContext,
) -> Outcome {
    if !unique {
        return Outcome::success();
    }
    let Value::Array(items) = instance else {
        return Outcome::pass_ignored();
    };
    // Bucket by fingerprint, confirm with real equality; numeric
    // equality makes [1, 1.0] a duplicate pair.
    let mut seen: HashMap<u64, Vec<usize>> = HashMap::new();
    for (index, item) in items.iter().enumerate() {
        let bucket = seen.entry(value::fingerprint(item)).or_default();
        for &earlier in bucket.iter() {
            if value::json_equal(&items[earlier], item) {
                return ctx.fail(ValidationErrorKind::ItemsNotUnique {
                    first: earlier,
                    second: index,
                });
            }
        }
        bucket.push(index);
    }
    Outcome::success()
}

pub(super) fn apply_min_properties(
    bound: u64,
    instance: &Value,
    ctx: &ValidationContext,
) -> Outcome {
    let Value::Object(entries) = instance else {
        return Outcome::pass_ignored();
    };
    if entries.len() as u64 >= bound {
        return Outcome::success();
    }
    ctx.fail(ValidationErrorKind::PropertyCountInvalid {
        count: entries.len(),
        min_properties: Some(bound),
        max_properties: None,
    })
}

pub(super) fn apply_max_properties(
    bound: u64,
    instance: &Value,
    ctx: &ValidationContext,
) -> Outcome {
    let Value::Object(entries) = instance else {
        return Outcome::pass_ignored();
    };
    if entries.len() as u64 <= bound {
        return Outcome::success();
    }
    ctx.fail(ValidationErrorKind::PropertyCountInvalid {
        count: entries.len(),
        min_properties: None,
        max_properties: Some(bound),
    })
}

pub(super) fn apply_required(
    properties: &[String],
    instance: &Value,
    ctx: &ValidationContext,
) -> Outcome {
    let Value::Object(entries) = instance else {
        return Outcome::pass_ignored();
    };
    let mut outcome = Outcome::success();
    for property in properties {
        if !entries.contains_key(property.as_str()) {
            outcome = outcome.and(ctx.fail(ValidationErrorKind::MissingRequiredProperty {
                property: property.clone(),
            }));
        }
    }
    outcome
}

pub(super) fn apply_dependent_required(
    map: &LinkedHashMap<String, Vec<String>>,
    instance: &Value,
    ctx: &ValidationContext,
) -> Outcome {
    let Value::Object(entries) = instance else {
        return Outcome::pass_ignored();
    };
    let mut outcome = Outcome::success();
    for (trigger, required) in map {
        if !entries.contains_key(trigger.as_str()) {
            continue;
        }
        for property in required {
            if !entries.contains_key(property.as_str()) {
                outcome = outcome.and(ctx.fail(ValidationErrorKind::MissingDependentProperty {
                    property: property.clone(),
                    dependency: trigger.clone(),
                }));
            }
        }
    }
    outcome
}

pub(super) fn apply_format(
    name: &str,
    instance: &Value,
    ctx: &ValidationContext,
    store: &mut AnnotationStore,
) -> Outcome {
    store.insert("format", AnnotationValue::Json(Value::String(name.to_string())));
    let Value::String(text) = instance else {
        return Outcome::pass_ignored();
    };
    if !ctx.format_asserts() {
        return Outcome::success();
    }
    match format::check_format(name, text) {
        Some(true) | None => Outcome::success(),
        Some(false) => ctx.fail(ValidationErrorKind::FormatMismatch {
            value: instance.to_string(),
            format: name.to_string(),
        }),
    }
}
