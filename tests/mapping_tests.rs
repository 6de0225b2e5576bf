//! Mapping configurations as they arrive on the wire, applied to observations.

mod common;

use common::*;
use serde_json::{json, Value};

use batch_action_core::mapping::{
    apply_full_mapping, suggest_json_paths, DatasetMappingConfig, MappingErrorType, PathEvaluator,
    PathMatch, TargetField,
};

fn mapping(raw: Value) -> DatasetMappingConfig {
    serde_json::from_value(raw).expect("mapping config should deserialize")
}

#[test]
fn test_wire_config_maps_a_chat_observation() {
    let record = observation(
        "obs-1",
        json!({"messages": [{"role": "user", "content": "Capital of France?"}]}),
        json!({"choices": [{"message": {"content": "Paris"}}]}),
        json!({"user": {"id": "u-9"}, "env": "prod"}),
    );
    let config = mapping(json!({
        "input": {
            "mode": "custom",
            "custom": {"type": "root", "rootConfig": {"sourceField": "input", "jsonPath": "$.messages[0].content"}}
        },
        "expectedOutput": {
            "mode": "custom",
            "custom": {"type": "root", "rootConfig": {"sourceField": "output", "jsonPath": "$.choices[0].message.content"}}
        },
        "metadata": {
            "mode": "custom",
            "custom": {"type": "keyValueMap", "keyValueMapConfig": {"entries": [
                {"key": "context.user_id", "sourceField": "metadata", "value": "$.user.id"},
                {"key": "context.source", "sourceField": "metadata", "value": "123"},
                {"key": "note", "sourceField": "metadata", "value": ""}
            ]}}
        }
    }));

    let mapped = apply_full_mapping(&record, &config);
    assert!(mapped.errors.is_empty(), "{:?}", mapped.errors);
    assert_eq!(mapped.input, Some(json!("Capital of France?")));
    assert_eq!(mapped.expected_output, Some(json!("Paris")));
    assert_eq!(
        mapped.metadata,
        Some(json!({"context": {"user_id": "u-9", "source": "123"}, "note": ""}))
    );
}

#[test]
fn test_json_encoded_string_slots_are_decoded() {
    let record = observation(
        "obs-2",
        json!(r#"{"prompt": "hi"}"#),
        json!("plain text answer"),
        json!(null),
    );
    let config = mapping(json!({
        "input": {
            "mode": "custom",
            "custom": {"type": "root", "rootConfig": {"sourceField": "input", "jsonPath": "$.prompt"}}
        },
        "expectedOutput": {
            "mode": "custom",
            "custom": {"type": "root", "rootConfig": {"sourceField": "output", "jsonPath": "$"}}
        }
    }));

    let mapped = apply_full_mapping(&record, &config);
    assert_eq!(mapped.input, Some(json!("hi")));
    assert_eq!(mapped.expected_output, Some(json!("plain text answer")));
    assert_eq!(mapped.metadata, Some(Value::Null));
}

#[test]
fn test_one_bad_expression_leaves_other_fields_intact() {
    let record = observation("obs-3", json!({"a": 1}), json!({"b": 2}), json!({"c": 3}));
    let config = mapping(json!({
        "input": {
            "mode": "custom",
            "custom": {"type": "root", "rootConfig": {"sourceField": "input", "jsonPath": "$["}}
        },
        "expectedOutput": {
            "mode": "custom",
            "custom": {"type": "root", "rootConfig": {"sourceField": "output", "jsonPath": "$.missing"}}
        },
        "metadata": {"mode": "full"}
    }));

    let mapped = apply_full_mapping(&record, &config);
    assert_eq!(mapped.input, None);
    assert_eq!(mapped.expected_output, None);
    assert_eq!(mapped.metadata, Some(json!({"c": 3})));

    let kinds: Vec<(TargetField, MappingErrorType)> = mapped
        .errors
        .iter()
        .map(|e| (e.target_field, e.error_type))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (TargetField::Input, MappingErrorType::JsonPathError),
            (TargetField::ExpectedOutput, MappingErrorType::JsonPathMiss),
        ]
    );
}

#[test]
fn test_prototype_keys_never_reach_the_item() {
    let record = observation("obs-4", json!({}), json!({}), json!({"x": 1}));
    let config = mapping(json!({
        "metadata": {
            "mode": "custom",
            "custom": {"type": "keyValueMap", "keyValueMapConfig": {"entries": [
                {"key": "__proto__.polluted", "sourceField": "metadata", "value": "yes"},
                {"key": "constructor", "sourceField": "metadata", "value": "$.x"},
                {"key": "safe", "sourceField": "metadata", "value": "$.x"}
            ]}}
        }
    }));

    let mapped = apply_full_mapping(&record, &config);
    assert_eq!(mapped.metadata, Some(json!({"safe": 1})));
    assert!(mapped.errors.is_empty());
}

#[test]
fn test_every_suggestion_is_a_matching_expression() {
    let sample = json!({
        "messages": [{"role": "user", "content": "hi"}],
        "user id": "u-1",
        "settings": {"temperature": 0.2, "stop": ["\n"]}
    });

    let suggestions = suggest_json_paths(&sample);
    assert!(suggestions.contains(&"$.settings.temperature".to_string()));
    for path in &suggestions {
        assert!(PathEvaluator::test(path, &sample).success, "{path} should parse");
        assert!(
            matches!(PathEvaluator::evaluate(&sample, path), Ok(PathMatch::Found(_))),
            "{path} should match the sample it came from"
        );
    }
}

#[test]
fn test_quoted_key_suggestions_evaluate_to_their_values() {
    let sample = json!({
        "it's": {"owner's note": "kept"},
        "a.b": 1,
        "say \"hi\"": true,
        "tags": []
    });

    let suggestions = suggest_json_paths(&sample);
    for path in &suggestions {
        let result = PathEvaluator::test(path, &sample);
        assert!(result.success, "{path} should parse: {:?}", result.error);
    }

    let cases = [
        ("$[\"it's\"][\"owner's note\"]", json!("kept")),
        ("$['a.b']", json!(1)),
        ("$['say \"hi\"']", json!(true)),
    ];
    for (path, expected) in cases {
        assert!(suggestions.contains(&path.to_string()), "missing {path}");
        assert_eq!(
            PathEvaluator::evaluate(&sample, path).unwrap(),
            PathMatch::Found(expected),
            "{path}"
        );
    }
}

#[test]
fn test_path_test_reports_malformed_expressions() {
    let result = PathEvaluator::test("$[", &json!({"a": 1}));
    assert!(!result.success);
    assert!(result.error.is_some());
}
