use json_schema_validation::{
    validate_inline, Draft, Registry, SchemaError, ValidateOptions,
};
use serde_json::{json, Value};

const DRAFT7: &str = "http://json-schema.org/draft-07/schema#";
const DRAFT6: &str = "http://json-schema.org/draft-06/schema#";

fn check(schema: &Value, instance: &Value) -> bool {
    validate_inline(schema, instance, &ValidateOptions::default())
        .unwrap()
        .valid()
}

#[test]
fn test_array_items_draft_switch() {
    // Array-form items with additionalItems is the draft ≤2019 model
    let legacy = json!({
        "$schema": DRAFT7,
        "items": [{"type": "integer"}],
        "additionalItems": false
    });
    assert!(check(&legacy, &json!([1])));
    assert!(!check(&legacy, &json!([1, 2])));

    // The same shape without $schema loads as 2020-12 and is malformed
    let modern = json!({
        "items": [{"type": "integer"}],
        "additionalItems": false
    });
    let result = validate_inline(&modern, &json!([1, 2]), &ValidateOptions::default());
    assert!(matches!(result, Err(SchemaError::MalformedSchema { .. })));
}

#[test]
fn test_prefix_items_with_items() {
    let schema = json!({
        "prefixItems": [{"type": "integer"}],
        "items": {"type": "string"}
    });
    assert!(check(&schema, &json!([1, "a", "b"])));
    assert!(!check(&schema, &json!([1, 2])));
    assert!(!check(&schema, &json!(["a"])));
    // Items beyond the prefix only
    assert!(check(&schema, &json!([7])));
}

#[test]
fn test_single_items_applies_to_all() {
    let schema = json!({"$schema": DRAFT7, "items": {"type": "integer"}});
    assert!(check(&schema, &json!([1, 2, 3])));
    assert!(!check(&schema, &json!([1, "x"])));
}

#[test]
fn test_validating_as_rebinds_applicability() {
    // prefixItems is a 2020-12 keyword; under draft 7 it is filtered out
    let schema = json!({"prefixItems": [{"type": "integer"}]});
    assert!(!check(&schema, &json!(["x"])));

    let as_draft7 = ValidateOptions {
        validating_as: Some(Draft::Draft7),
        ..Default::default()
    };
    let output = validate_inline(&schema, &json!(["x"]), &as_draft7).unwrap();
    assert!(output.valid());
}

#[test]
fn test_dependencies_draft7() {
    let schema = json!({
        "$schema": DRAFT7,
        "dependencies": {
            "a": ["b"],
            "c": {"required": ["d"]}
        }
    });
    assert!(check(&schema, &json!({})));
    assert!(check(&schema, &json!({"a": 1, "b": 2})));
    assert!(!check(&schema, &json!({"a": 1})));
    assert!(check(&schema, &json!({"c": 1, "d": 2})));
    assert!(!check(&schema, &json!({"c": 1})));

    // dependencies is not a 2019-09 keyword
    let modern = json!({
        "$schema": "https://json-schema.org/draft/2019-09/schema",
        "dependencies": {"a": ["b"]}
    });
    assert!(check(&modern, &json!({"a": 1})));
}

#[test]
fn test_dependent_keywords_modern() {
    let schema = json!({
        "dependentRequired": {"a": ["b"]},
        "dependentSchemas": {"c": {"minProperties": 2}}
    });
    assert!(check(&schema, &json!({})));
    assert!(!check(&schema, &json!({"a": 1})));
    assert!(check(&schema, &json!({"a": 1, "b": 2})));
    assert!(!check(&schema, &json!({"c": 1})));
    assert!(check(&schema, &json!({"c": 1, "x": 2})));
}

#[test]
fn test_legacy_id_anchor() {
    // Drafts 6/7 declare anchors through $id fragments
    let schema = json!({
        "$schema": DRAFT6,
        "definitions": {"s": {"$id": "#str", "type": "string"}},
        "$ref": "#str"
    });
    assert!(check(&schema, &json!("x")));
    assert!(!check(&schema, &json!(1)));
}

#[test]
fn test_definitions_navigable_on_all_drafts() {
    let schema = json!({
        "definitions": {"pos": {"type": "integer", "minimum": 1}},
        "$ref": "#/definitions/pos"
    });
    assert!(check(&schema, &json!(2)));
    assert!(!check(&schema, &json!(0)));
}

#[test]
fn test_unevaluated_keywords_not_in_draft7() {
    let schema = json!({
        "$schema": DRAFT7,
        "properties": {"a": true},
        "unevaluatedProperties": false
    });
    // Draft 7 has no unevaluatedProperties; the extra property passes
    assert!(check(&schema, &json!({"a": 1, "b": 2})));

    let modern = json!({
        "properties": {"a": true},
        "unevaluatedProperties": false
    });
    assert!(!check(&modern, &json!({"a": 1, "b": 2})));
}

#[test]
fn test_recursive_ref_payload_shape() {
    // $recursiveRef only supports "#"
    let mut registry = Registry::new();
    let result = registry.register(
        &json!({
            "$schema": "https://json-schema.org/draft/2019-09/schema",
            "$recursiveRef": "#/definitions/x"
        }),
        "https://example.com/s",
    );
    assert!(result.is_err());

    // Outside 2019-09 the keyword parses but is filtered at evaluation
    let schema = json!({"$schema": DRAFT7, "$recursiveRef": "#", "type": "integer"});
    assert!(check(&schema, &json!(3)));
}

#[test]
fn test_duplicate_registration_is_consistent() {
    let mut registry = Registry::new();
    let document = json!({"type": "string"});
    registry.register(&document, "https://example.com/s").unwrap();
    for _ in 0..2 {
        let result = registry.register(&document, "https://example.com/s");
        assert!(matches!(
            result,
            Err(SchemaError::DuplicateRegistration(_))
        ));
    }
}
