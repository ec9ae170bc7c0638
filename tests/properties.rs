// Algebraic properties of the evaluation engine

use json_schema_validation::{validate_inline, OutputFormat, ValidateOptions};
use proptest::prelude::*;
use serde_json::{json, Value};

fn check(schema: &Value, instance: &Value) -> bool {
    validate_inline(schema, instance, &ValidateOptions::default())
        .unwrap()
        .valid()
}

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        proptest::string::string_regex("[a-z]{0,8}")
            .unwrap()
            .prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            proptest::collection::btree_map(
                proptest::string::string_regex("[a-z]{1,4}").unwrap(),
                inner,
                0..4
            )
            .prop_map(|entries| Value::Object(entries.into_iter().collect())),
        ]
    })
}

/// A small pool of schemas exercising assertions and applicators
fn schema_pool() -> Vec<Value> {
    vec![
        json!({"type": "integer", "minimum": 0}),
        json!({"type": "string", "minLength": 2}),
        json!({"type": "array", "items": {"type": "integer"}}),
        json!({"properties": {"a": {"type": "integer"}}, "required": ["a"]}),
        json!({"anyOf": [{"type": "string"}, {"type": "boolean"}]}),
        json!({"enum": [null, 1, "x"]}),
    ]
}

proptest! {
    #[test]
    fn boolean_schemas_accept_and_reject_everything(instance in arb_json()) {
        prop_assert!(check(&json!(true), &instance));
        prop_assert!(!check(&json!(false), &instance));
    }

    #[test]
    fn results_are_deterministic(instance in arb_json()) {
        let schema = json!({
            "anyOf": [{"type": "object"}, {"type": "array"}, {"type": "string"}],
            "properties": {"a": {"enum": [1, 2]}},
            "unevaluatedProperties": {"type": "string"}
        });
        let options = ValidateOptions {
            output_format: OutputFormat::Verbose,
            ..Default::default()
        };
        let first = validate_inline(&schema, &instance, &options).unwrap();
        let second = validate_inline(&schema, &instance, &options).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn double_negation_preserves_validity(instance in arb_json()) {
        for schema in schema_pool() {
            let doubled = json!({"not": {"not": schema.clone()}});
            prop_assert_eq!(check(&schema, &instance), check(&doubled, &instance));
        }
    }

    #[test]
    fn all_of_is_commutative(instance in arb_json()) {
        let pool = schema_pool();
        let forward = json!({"allOf": [pool[0].clone(), pool[3].clone(), pool[5].clone()]});
        let backward = json!({"allOf": [pool[5].clone(), pool[0].clone(), pool[3].clone()]});
        prop_assert_eq!(check(&forward, &instance), check(&backward, &instance));
    }

    #[test]
    fn any_of_accepts_iff_some_member_accepts(instance in arb_json()) {
        let pool = schema_pool();
        let expected = pool.iter().any(|schema| check(schema, &instance));
        let combined = json!({"anyOf": pool});
        prop_assert_eq!(check(&combined, &instance), expected);
    }

    #[test]
    fn one_of_accepts_iff_exactly_one_member_accepts(instance in arb_json()) {
        let pool = vec![
            json!({"type": "integer"}),
            json!({"type": "string"}),
            json!({"type": "array"}),
        ];
        let matching = pool.iter().filter(|schema| check(schema, &instance)).count();
        let combined = json!({"oneOf": pool});
        prop_assert_eq!(check(&combined, &instance), matching == 1);
    }

    #[test]
    fn numerically_equal_items_are_duplicates(n in -1000i32..1000) {
        let schema = json!({"uniqueItems": true});
        let instance = json!([n, f64::from(n)]);
        prop_assert!(!check(&schema, &instance));

        let distinct = json!([n, f64::from(n) + 0.5]);
        prop_assert!(check(&schema, &distinct));
    }
}
