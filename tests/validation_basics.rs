use json_schema_validation::{validate_inline, OutputFormat, ValidateOptions};
use serde_json::{json, Value};

fn check(schema: &Value, instance: &Value) -> bool {
    validate_inline(schema, instance, &ValidateOptions::default())
        .unwrap()
        .valid()
}

fn first_error(schema: &Value, instance: &Value) -> String {
    let options = ValidateOptions {
        output_format: OutputFormat::Basic,
        ..Default::default()
    };
    let output = validate_inline(schema, instance, &options).unwrap();
    assert!(!output.valid(), "expected an invalid result");
    output.first_error().expect("invalid result has an error").to_string()
}

#[test]
fn test_integer_with_minimum() {
    let schema = json!({"type": "integer", "minimum": 0});
    assert!(check(&schema, &json!(3)));
    assert!(!check(&schema, &json!(-1)));

    let error = first_error(&schema, &json!(-1));
    assert!(error.contains("-1"), "error should mention -1: {}", error);
    assert!(error.contains('0'), "error should mention the bound: {}", error);
}

#[test]
fn test_required_property() {
    let schema = json!({"properties": {"a": {"type": "string"}}, "required": ["a"]});
    assert!(check(&schema, &json!({"a": "x"})));
    assert!(!check(&schema, &json!({})));

    let error = first_error(&schema, &json!({}));
    assert!(error.contains('a'), "error should mention 'a': {}", error);
}

#[test]
fn test_any_of() {
    let schema = json!({"anyOf": [{"type": "string"}, {"type": "integer"}]});
    assert!(check(&schema, &json!("x")));
    assert!(check(&schema, &json!(1)));
    assert!(!check(&schema, &json!(true)));
}

#[test]
fn test_one_of_exactly_one() {
    let schema = json!({"oneOf": [
        {"type": "integer"},
        {"type": "number", "minimum": 10}
    ]});
    // An integer below 10 matches only the first member
    assert!(check(&schema, &json!(3)));
    // 12 matches both members
    assert!(!check(&schema, &json!(12)));
    // A string matches neither
    assert!(!check(&schema, &json!("x")));
}

#[test]
fn test_not_inverts() {
    let schema = json!({"not": {"type": "string"}});
    assert!(check(&schema, &json!(1)));
    assert!(!check(&schema, &json!("x")));
}

#[test]
fn test_boolean_schemas() {
    for instance in [json!(null), json!(0), json!("x"), json!([1]), json!({"a": 1})] {
        assert!(check(&json!(true), &instance));
        assert!(!check(&json!(false), &instance));
    }
}

#[test]
fn test_unique_items_numeric_equality() {
    let schema = json!({"type": "array", "items": {"type": "integer"}, "uniqueItems": true});
    assert!(check(&schema, &json!([1, 2, 3])));
    assert!(!check(&schema, &json!([1, 1.0, 2])));

    let error = first_error(&schema, &json!([1, 1.0, 2]));
    assert!(error.contains("(0, 1)"), "error should report the pair: {}", error);
}

#[test]
fn test_wrong_kind_keywords_are_ignored() {
    // Bounds of other instance kinds do not constrain a boolean
    let schema = json!({"minimum": 10, "minLength": 5, "minItems": 2, "required": ["a"]});
    assert!(check(&schema, &json!(true)));
    // The same keyword asserts once the kind matches
    assert!(!check(&json!({"minLength": 5}), &json!("hi")));
    assert!(!check(&json!({"minItems": 2}), &json!([1])));
}

#[test]
fn test_enum_and_const() {
    let schema = json!({"enum": ["red", 1, [2]]});
    assert!(check(&schema, &json!("red")));
    assert!(check(&schema, &json!(1.0)));
    assert!(check(&schema, &json!([2.0])));
    assert!(!check(&schema, &json!("blue")));

    let schema = json!({"const": {"a": 1}});
    assert!(check(&schema, &json!({"a": 1.0})));
    assert!(!check(&schema, &json!({"a": 2})));
}

#[test]
fn test_string_bounds_and_pattern() {
    let schema = json!({"minLength": 2, "maxLength": 4, "pattern": "^[a-z]+$"});
    assert!(check(&schema, &json!("abc")));
    assert!(!check(&schema, &json!("a")));
    assert!(!check(&schema, &json!("abcde")));
    assert!(!check(&schema, &json!("Abc")));
}

#[test]
fn test_exclusive_bounds_and_multiple_of() {
    let schema = json!({"exclusiveMinimum": 0, "exclusiveMaximum": 10, "multipleOf": 2.5});
    assert!(check(&schema, &json!(5)));
    assert!(check(&schema, &json!(7.5)));
    assert!(!check(&schema, &json!(0)));
    assert!(!check(&schema, &json!(10)));
    assert!(!check(&schema, &json!(3)));
}

#[test]
fn test_object_counts() {
    let schema = json!({"minProperties": 1, "maxProperties": 2});
    assert!(!check(&schema, &json!({})));
    assert!(check(&schema, &json!({"a": 1})));
    assert!(!check(&schema, &json!({"a": 1, "b": 2, "c": 3})));
}

#[test]
fn test_property_names() {
    let schema = json!({"propertyNames": {"pattern": "^[a-z]+$"}});
    assert!(check(&schema, &json!({"abc": 1})));
    assert!(!check(&schema, &json!({"Not": 1})));
}

#[test]
fn test_nested_paths_in_errors() {
    let schema = json!({
        "properties": {
            "items": {"type": "array", "items": {"type": "integer"}}
        }
    });
    let options = ValidateOptions {
        output_format: OutputFormat::Basic,
        ..Default::default()
    };
    let output = validate_inline(&schema, &json!({"items": [1, "x"]}), &options).unwrap();
    assert!(!output.valid());
    match output {
        json_schema_validation::Output::Basic { errors, .. } => {
            let unit = errors
                .iter()
                .find(|unit| unit.error.is_some())
                .expect("an error unit");
            assert_eq!(unit.instance_location, "/items/1");
            assert_eq!(unit.keyword_location, "/properties/items/items/type");
        }
        other => panic!("Expected basic output, got {:?}", other),
    }
}
