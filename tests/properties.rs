//! Cross-cutting behavioural guarantees of the engine.
use serde_json::json;

#[test]
fn identical_inputs_give_identical_results() {
    let schema = json!({
        "allOf": [
            {"properties": {"a": {"type": "integer"}}},
            {"patternProperties": {"^b": {"minimum": 0}}}
        ],
        "unevaluatedProperties": false
    });
    let instances = [
        json!({"a": 1, "b1": 2}),
        json!({"a": "x"}),
        json!({"c": true}),
    ];
    let validator = conforma::options()
        .output_format(conforma::OutputFormat::Verbose)
        .build(&schema)
        .expect("Invalid schema");
    for instance in &instances {
        let first = validator.evaluate(instance);
        for _ in 0..5 {
            assert_eq!(validator.evaluate(instance), first);
        }
    }
}

#[test]
fn duplicate_registration_is_rejected_consistently() {
    for _ in 0..3 {
        let mut registry = conforma::Registry::new();
        let schema = json!({"$id": "https://example.com/s", "type": "integer"});
        registry.register(&schema, None).expect("First load");
        assert!(registry.register(&schema, None).is_err());
    }
}

#[test]
fn boolean_schemas_accept_and_reject_everything() {
    for instance in [json!(null), json!(false), json!(0), json!(""), json!([]), json!({})] {
        assert!(conforma::is_valid(&json!(true), &instance));
        assert!(!conforma::is_valid(&json!(false), &instance));
    }
}

#[test]
fn negation_is_an_involution_for_validity() {
    let inner = json!({"properties": {"a": {"minimum": 3}}, "required": ["a"]});
    let doubled = json!({"not": {"not": inner.clone()}});
    for instance in [
        json!({"a": 5}),
        json!({"a": 1}),
        json!({}),
        json!(17),
    ] {
        assert_eq!(
            conforma::is_valid(&doubled, &instance),
            conforma::is_valid(&inner, &instance),
        );
    }
}

#[test]
fn all_of_is_order_insensitive() {
    let first = json!({"allOf": [{"minimum": 0}, {"maximum": 10}, {"multipleOf": 2}]});
    let second = json!({"allOf": [{"multipleOf": 2}, {"maximum": 10}, {"minimum": 0}]});
    for instance in [json!(4), json!(3), json!(-2), json!(12), json!("x")] {
        assert_eq!(
            conforma::is_valid(&first, &instance),
            conforma::is_valid(&second, &instance),
        );
    }
}

#[test]
fn one_of_counts_exact_matches_and_any_of_at_least_one() {
    let members = json!([{"type": "integer"}, {"minimum": 5}, {"maximum": 0}]);
    let any_of = json!({"anyOf": members});
    let one_of = json!({"oneOf": members});
    let cases = [
        (json!(7), 2),
        (json!(3), 1),
        (json!(-1.5), 1),
        (json!(2.5), 0),
        (json!(0), 2),
    ];
    for (instance, matching) in cases {
        assert_eq!(conforma::is_valid(&any_of, &instance), matching >= 1);
        assert_eq!(conforma::is_valid(&one_of, &instance), matching == 1);
    }
}

#[test]
fn annotation_flow_gates_extra_properties() {
    let schemas = [
        json!({"properties": {"a": {}}, "unevaluatedProperties": false}),
        json!({"properties": {"a": {}}, "additionalProperties": false}),
    ];
    for schema in &schemas {
        assert!(conforma::is_valid(schema, &json!({"a": 1})));
        assert!(!conforma::is_valid(schema, &json!({"a": 1, "b": 2})));
        assert!(conforma::is_valid(schema, &json!({})));
    }
}

#[test]
fn reference_cycles_fail_without_overflowing() {
    let schema = json!({
        "$defs": {"x": {"$ref": "#/$defs/x"}},
        "$ref": "#/$defs/x"
    });
    let validator = conforma::validator_for(&schema).expect("Invalid schema");
    for instance in [json!(null), json!({"deep": [1, 2]}), json!("x")] {
        assert!(!validator.is_valid(&instance));
        let errors = validator.iter_errors(&instance).collect::<Vec<_>>();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().starts_with("Recursive reference"));
    }
}

#[test]
fn mutual_references_terminate_on_finite_instances() {
    let schema = json!({
        "$defs": {
            "a": {"properties": {"b": {"$ref": "#/$defs/b"}}},
            "b": {"properties": {"a": {"$ref": "#/$defs/a"}}}
        },
        "$ref": "#/$defs/a"
    });
    let validator = conforma::validator_for(&schema).expect("Invalid schema");
    assert!(validator.is_valid(&json!({"b": {"a": {"b": {}}}})));
}

#[test]
fn numeric_equality_drives_unique_items() {
    assert!(!conforma::is_valid(&json!({"uniqueItems": true}), &json!([1, 1.0])));
    assert!(conforma::is_valid(&json!({"uniqueItems": true}), &json!([1, 1.5])));
}

#[test]
fn load_rejects_array_items_only_in_2020_12() {
    let schema = json!({"items": [{"type": "integer"}], "additionalItems": false});
    for draft in [conforma::Draft::Draft6, conforma::Draft::Draft7, conforma::Draft::Draft201909] {
        assert!(
            conforma::options().with_draft(draft).build(&schema).is_ok(),
            "array items must load under {draft:?}"
        );
    }
    assert!(conforma::options()
        .with_draft(conforma::Draft::Draft202012)
        .build(&schema)
        .is_err());
}

#[test]
fn validations_share_a_registry_across_threads() {
    let mut registry = conforma::Registry::new();
    registry
        .register(
            &json!({
                "$id": "https://example.com/point",
                "type": "object",
                "properties": {"x": {"type": "number"}, "y": {"type": "number"}},
                "required": ["x", "y"]
            }),
            None,
        )
        .expect("Invalid schema");
    let validator = std::sync::Arc::new(
        conforma::Validator::from_registry(
            registry,
            "https://example.com/point",
            conforma::ValidationOptions::default(),
        )
        .expect("Unknown URI"),
    );
    let handles: Vec<_> = (0..4)
        .map(|thread| {
            let validator = std::sync::Arc::clone(&validator);
            std::thread::spawn(move || {
                for idx in 0..50 {
                    let valid = validator.is_valid(&json!({"x": thread, "y": idx}));
                    assert!(valid);
                    assert!(!validator.is_valid(&json!({"x": thread})));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Validation thread panicked");
    }
}
