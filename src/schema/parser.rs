//! Schema construction from decoded JSON
//!
//! Boolean JSON values are boolean schemas; objects parse known
//! keywords into their variants and preserve unknown keywords verbatim
//! as pass-through annotations. Payload-shape rules that differ between
//! drafts (the array form of `items`, `prefixItems`) are enforced here
//! against the draft the document was loaded as.

use crate::draft::Draft;
use crate::error::{SchemaError, SchemaPath, SchemaResult};
use hashlink::LinkedHashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Number, Value};

use super::keyword::{
    CompiledPattern, Dependency, InstanceType, ItemsKeyword, Keyword,
};
use super::{Schema, SchemaObject};

/// Anchor names: a letter or underscore, then letters, digits, `-`, `_`, `.`
static ANCHOR_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[A-Za-z_][-A-Za-z0-9._]*$").expect("anchor name regex"));

/// Whether a fragment is an anchor name rather than a JSON Pointer
pub(crate) fn is_anchor_name(fragment: &str) -> bool {
    ANCHOR_NAME.is_match(fragment)
}

pub(crate) fn parse_schema(value: &Value, draft: Draft) -> SchemaResult<Schema> {
    let mut path = SchemaPath::new();
    parse_at(value, draft, &mut path)
}

fn parse_at(value: &Value, draft: Draft, path: &mut SchemaPath) -> SchemaResult<Schema> {
    match value {
        Value::Bool(b) => Ok(Schema::Bool(*b)),
        Value::Object(entries) => parse_object(entries, draft, path),
        other => Err(malformed(
            format!(
                "Schema must be a boolean or an object, got {}",
                crate::value::kind_name(other)
            ),
            path,
        )),
    }
}

fn parse_object(
    entries: &Map<String, Value>,
    draft: Draft,
    path: &mut SchemaPath,
) -> SchemaResult<Schema> {
    let mut object = SchemaObject {
        base_uri: None,
        anchor: None,
        dynamic_anchor: None,
        recursive_anchor: false,
        keywords: Vec::with_capacity(entries.len()),
        needs_annotations: false,
    };

    for (name, payload) in entries {
        path.push(name.clone());
        let parsed = parse_entry(&mut object, name, payload, draft, path);
        path.pop();
        parsed?;
    }

    object.needs_annotations = object.keywords.iter().any(|kw| {
        matches!(
            kw.name(),
            "additionalProperties"
                | "additionalItems"
                | "unevaluatedProperties"
                | "unevaluatedItems"
                | "minContains"
                | "maxContains"
        )
    });

    object
        .keywords
        .sort_by(|a, b| (a.priority(), a.name()).cmp(&(b.priority(), b.name())));

    Ok(Schema::Object(Box::new(object)))
}

fn parse_entry(
    object: &mut SchemaObject,
    name: &str,
    payload: &Value,
    draft: Draft,
    path: &mut SchemaPath,
) -> SchemaResult<()> {
    // Identity keywords become node/registry state, not keyword nodes
    match name {
        // `$schema` is honored at the document root by the registry;
        // nested occurrences carry no meaning here. `$vocabulary` is
        // likewise read off the document root.
        "$schema" | "$vocabulary" => return Ok(()),
        "$id" => {
            let id = expect_string(name, payload, path)?;
            if id.is_empty() {
                return Err(SchemaError::InvalidId(id));
            }
            // Drafts 6/7 declare anchors as `$id: "#name"`
            if let Some(fragment) = id.strip_prefix('#') {
                if matches!(draft, Draft::Draft6 | Draft::Draft7) {
                    if !is_anchor_name(fragment) {
                        return Err(SchemaError::InvalidAnchor(fragment.to_string()));
                    }
                    object.anchor = Some(fragment.to_string());
                    return Ok(());
                }
                return Err(SchemaError::InvalidId(id));
            }
            object.base_uri = Some(id);
            return Ok(());
        }
        "$anchor" => {
            let anchor = expect_string(name, payload, path)?;
            if !is_anchor_name(&anchor) {
                return Err(SchemaError::InvalidAnchor(anchor));
            }
            object.anchor = Some(anchor);
            return Ok(());
        }
        "$dynamicAnchor" => {
            let anchor = expect_string(name, payload, path)?;
            if !is_anchor_name(&anchor) {
                return Err(SchemaError::InvalidAnchor(anchor));
            }
            object.dynamic_anchor = Some(anchor);
            return Ok(());
        }
        "$recursiveAnchor" => {
            object.recursive_anchor = expect_bool(name, payload, path)?;
            return Ok(());
        }
        _ => {}
    }

    let keyword = match name {
        "$ref" => Keyword::Ref(expect_string(name, payload, path)?),
        "$dynamicRef" => Keyword::DynamicRef(expect_string(name, payload, path)?),
        "$recursiveRef" => {
            let target = expect_string(name, payload, path)?;
            if target != "#" {
                return Err(malformed(
                    format!("'$recursiveRef' only supports '#', got '{}'", target),
                    path,
                ));
            }
            Keyword::RecursiveRef(target)
        }
        "$defs" => Keyword::Defs(schema_map(payload, draft, path)?),
        "definitions" => Keyword::Definitions(schema_map(payload, draft, path)?),
        "allOf" => Keyword::AllOf(schema_list(name, payload, draft, path)?),
        "anyOf" => Keyword::AnyOf(schema_list(name, payload, draft, path)?),
        "oneOf" => Keyword::OneOf(schema_list(name, payload, draft, path)?),
        "not" => Keyword::Not(Box::new(parse_at(payload, draft, path)?)),
        "if" => Keyword::If(Box::new(parse_at(payload, draft, path)?)),
        "then" => Keyword::Then(Box::new(parse_at(payload, draft, path)?)),
        "else" => Keyword::Else(Box::new(parse_at(payload, draft, path)?)),
        "properties" => Keyword::Properties(schema_map(payload, draft, path)?),
        "patternProperties" => {
            let entries = expect_object(name, payload, path)?;
            let mut patterns = Vec::with_capacity(entries.len());
            for (pattern, subschema) in entries {
                path.push(pattern.clone());
                let compiled = compile_pattern(pattern)?;
                let schema = parse_at(subschema, draft, path)?;
                path.pop();
                patterns.push((compiled, schema));
            }
            Keyword::PatternProperties(patterns)
        }
        "additionalProperties" => {
            Keyword::AdditionalProperties(Box::new(parse_at(payload, draft, path)?))
        }
        "unevaluatedProperties" => {
            Keyword::UnevaluatedProperties(Box::new(parse_at(payload, draft, path)?))
        }
        "propertyNames" => Keyword::PropertyNames(Box::new(parse_at(payload, draft, path)?)),
        "dependentSchemas" => Keyword::DependentSchemas(schema_map(payload, draft, path)?),
        "dependencies" => {
            let entries = expect_object(name, payload, path)?;
            let mut dependencies = LinkedHashMap::with_capacity(entries.len());
            for (property, dependency) in entries {
                path.push(property.clone());
                let parsed = match dependency {
                    Value::Array(_) => Dependency::Keys(string_list(name, dependency, path)?),
                    _ => Dependency::Schema(parse_at(dependency, draft, path)?),
                };
                path.pop();
                dependencies.insert(property.clone(), parsed);
            }
            Keyword::Dependencies(dependencies)
        }
        "prefixItems" => {
            if draft != Draft::Draft202012 {
                return Err(malformed(
                    "'prefixItems' requires draft 2020-12".to_string(),
                    path,
                ));
            }
            Keyword::PrefixItems(schema_list(name, payload, draft, path)?)
        }
        "items" => match payload {
            Value::Array(_) => {
                if draft == Draft::Draft202012 {
                    return Err(malformed(
                        "The array form of 'items' is not allowed in draft 2020-12; use 'prefixItems'"
                            .to_string(),
                        path,
                    ));
                }
                Keyword::Items(ItemsKeyword::Array(schema_list(name, payload, draft, path)?))
            }
            _ => Keyword::Items(ItemsKeyword::Single(Box::new(parse_at(
                payload, draft, path,
            )?))),
        },
        "additionalItems" => Keyword::AdditionalItems(Box::new(parse_at(payload, draft, path)?)),
        "unevaluatedItems" => Keyword::UnevaluatedItems(Box::new(parse_at(payload, draft, path)?)),
        "contains" => Keyword::Contains(Box::new(parse_at(payload, draft, path)?)),
        "type" => Keyword::Type(type_list(payload, path)?),
        "enum" => {
            let values = expect_array(name, payload, path)?;
            if values.is_empty() {
                return Err(malformed("'enum' must not be empty".to_string(), path));
            }
            Keyword::Enum(values.to_vec())
        }
        "const" => Keyword::Const(payload.clone()),
        "minimum" => Keyword::Minimum(expect_number(name, payload, path)?),
        "maximum" => Keyword::Maximum(expect_number(name, payload, path)?),
        "exclusiveMinimum" => Keyword::ExclusiveMinimum(expect_number(name, payload, path)?),
        "exclusiveMaximum" => Keyword::ExclusiveMaximum(expect_number(name, payload, path)?),
        "multipleOf" => {
            let factor = expect_number(name, payload, path)?;
            if factor.as_f64().map_or(true, |f| f <= 0.0) {
                return Err(malformed(
                    format!("'multipleOf' must be a positive number, got {}", factor),
                    path,
                ));
            }
            Keyword::MultipleOf(factor)
        }
        "minLength" => Keyword::MinLength(expect_count(name, payload, path)?),
        "maxLength" => Keyword::MaxLength(expect_count(name, payload, path)?),
        "pattern" => Keyword::Pattern(compile_pattern(&expect_string(name, payload, path)?)?),
        "minItems" => Keyword::MinItems(expect_count(name, payload, path)?),
        "maxItems" => Keyword::MaxItems(expect_count(name, payload, path)?),
        "uniqueItems" => Keyword::UniqueItems(expect_bool(name, payload, path)?),
        "minContains" => Keyword::MinContains(expect_count(name, payload, path)?),
        "maxContains" => Keyword::MaxContains(expect_count(name, payload, path)?),
        "minProperties" => Keyword::MinProperties(expect_count(name, payload, path)?),
        "maxProperties" => Keyword::MaxProperties(expect_count(name, payload, path)?),
        "required" => Keyword::Required(string_list(name, payload, path)?),
        "dependentRequired" => {
            let entries = expect_object(name, payload, path)?;
            let mut map = LinkedHashMap::with_capacity(entries.len());
            for (property, keys) in entries {
                path.push(property.clone());
                let keys = string_list(name, keys, path)?;
                path.pop();
                map.insert(property.clone(), keys);
            }
            Keyword::DependentRequired(map)
        }
        "format" => Keyword::Format(expect_string(name, payload, path)?),
        "contentEncoding" => Keyword::ContentEncoding(expect_string(name, payload, path)?),
        "contentMediaType" => Keyword::ContentMediaType(expect_string(name, payload, path)?),
        "contentSchema" => Keyword::ContentSchema(Box::new(parse_at(payload, draft, path)?)),
        "title" => Keyword::Title(expect_string(name, payload, path)?),
        "description" => Keyword::Description(expect_string(name, payload, path)?),
        "default" => Keyword::Default(payload.clone()),
        "examples" => Keyword::Examples(expect_array(name, payload, path)?.to_vec()),
        "deprecated" => Keyword::Deprecated(expect_bool(name, payload, path)?),
        "readOnly" => Keyword::ReadOnly(expect_bool(name, payload, path)?),
        "writeOnly" => Keyword::WriteOnly(expect_bool(name, payload, path)?),
        "$comment" => Keyword::Comment(expect_string(name, payload, path)?),
        _ => Keyword::Unknown(name.to_string(), payload.clone()),
    };
    object.keywords.push(keyword);
    Ok(())
}

fn schema_list(
    name: &str,
    payload: &Value,
    draft: Draft,
    path: &mut SchemaPath,
) -> SchemaResult<Vec<Schema>> {
    let items = expect_array(name, payload, path)?;
    if items.is_empty() {
        return Err(malformed(format!("'{}' must not be empty", name), path));
    }
    let mut schemas = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        path.push(index.to_string());
        let schema = parse_at(item, draft, path);
        path.pop();
        schemas.push(schema?);
    }
    Ok(schemas)
}

fn schema_map(
    payload: &Value,
    draft: Draft,
    path: &mut SchemaPath,
) -> SchemaResult<LinkedHashMap<String, Schema>> {
    let entries = expect_object("schema map", payload, path)?;
    let mut map = LinkedHashMap::with_capacity(entries.len());
    for (key, subschema) in entries {
        path.push(key.clone());
        let schema = parse_at(subschema, draft, path);
        path.pop();
        map.insert(key.clone(), schema?);
    }
    Ok(map)
}

fn type_list(payload: &Value, path: &SchemaPath) -> SchemaResult<Vec<InstanceType>> {
    let names: Vec<&str> = match payload {
        Value::String(name) => vec![name.as_str()],
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().ok_or_else(|| {
                    malformed("'type' entries must be strings".to_string(), path)
                })
            })
            .collect::<SchemaResult<_>>()?,
        _ => {
            return Err(malformed(
                "'type' must be a string or an array of strings".to_string(),
                path,
            ))
        }
    };
    let mut types = Vec::with_capacity(names.len());
    for name in names {
        let parsed = InstanceType::from_name(name)
            .ok_or_else(|| malformed(format!("Unknown type name '{}'", name), path))?;
        if !types.contains(&parsed) {
            types.push(parsed);
        }
    }
    Ok(types)
}

fn compile_pattern(pattern: &str) -> SchemaResult<CompiledPattern> {
    let regex = Regex::new(pattern).map_err(|e| SchemaError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;
    Ok(CompiledPattern {
        source: pattern.to_string(),
        regex,
    })
}

fn expect_string(name: &str, payload: &Value, path: &SchemaPath) -> SchemaResult<String> {
    payload
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| malformed(format!("'{}' must be a string", name), path))
}

fn expect_bool(name: &str, payload: &Value, path: &SchemaPath) -> SchemaResult<bool> {
    payload
        .as_bool()
        .ok_or_else(|| malformed(format!("'{}' must be a boolean", name), path))
}

fn expect_number(name: &str, payload: &Value, path: &SchemaPath) -> SchemaResult<Number> {
    match payload {
        Value::Number(n) => Ok(n.clone()),
        _ => Err(malformed(format!("'{}' must be a number", name), path)),
    }
}

fn expect_count(name: &str, payload: &Value, path: &SchemaPath) -> SchemaResult<u64> {
    if let Some(count) = payload.as_u64() {
        return Ok(count);
    }
    // Tolerate integer-valued floats such as 3.0
    if let Some(f) = payload.as_f64() {
        if f.fract() == 0.0 && f >= 0.0 {
            return Ok(f as u64);
        }
    }
    Err(malformed(
        format!("'{}' must be a non-negative integer", name),
        path,
    ))
}

fn expect_array<'a>(
    name: &str,
    payload: &'a Value,
    path: &SchemaPath,
) -> SchemaResult<&'a Vec<Value>> {
    payload
        .as_array()
        .ok_or_else(|| malformed(format!("'{}' must be an array", name), path))
}

fn expect_object<'a>(
    name: &str,
    payload: &'a Value,
    path: &SchemaPath,
) -> SchemaResult<&'a Map<String, Value>> {
    payload
        .as_object()
        .ok_or_else(|| malformed(format!("'{}' must be an object", name), path))
}

fn string_list(name: &str, payload: &Value, path: &SchemaPath) -> SchemaResult<Vec<String>> {
    expect_array(name, payload, path)?
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| malformed(format!("'{}' entries must be strings", name), path))
        })
        .collect()
}

fn malformed(message: String, path: &SchemaPath) -> SchemaError {
    SchemaError::MalformedSchema {
        message,
        location: path.clone(),
    }
}
