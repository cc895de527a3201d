//! Integration tests for schema normalization.

use serde_json::{json, Value};
use stackql_docgen::{
    canonicalize, normalize, strip_read_only, Normalizer, COMPOSITION_KEYWORDS, MAX_SCHEMA_DEPTH,
};

/// True if any object in the tree carries one of `keys`.
fn contains_key(value: &Value, keys: &[&str]) -> bool {
    match value {
        Value::Object(map) => {
            keys.iter().any(|k| map.contains_key(*k))
                || map.values().any(|v| contains_key(v, keys))
        }
        Value::Array(items) => items.iter().any(|v| contains_key(v, keys)),
        _ => false,
    }
}

fn sample_schemas() -> Vec<Value> {
    vec![
        json!({ "type": "object" }),
        json!({
            "allOf": [
                { "properties": { "a": { "type": "string" } }, "required": ["a"] },
                { "properties": { "b": { "allOf": [{ "type": "integer" }] } }, "required": ["b", "a"] }
            ]
        }),
        json!({
            "properties": {
                "choice": { "oneOf": [{ "type": "string" }, { "type": "integer" }] },
                "list": { "type": "array", "items": { "anyOf": [{ "type": "object", "properties": { "x": {} } }] } }
            }
        }),
        json!({
            "properties": {
                "id": { "type": "string", "readOnly": true },
                "spec": {
                    "type": "object",
                    "properties": { "status": { "readOnly": true }, "size": {} },
                    "required": ["status", "size"]
                }
            },
            "required": ["id"]
        }),
        json!({ "anyOf": [] }),
        json!([1, 2, 3]),
        json!("not a schema"),
    ]
}

// === Idempotence ===

mod idempotence {
    use super::*;

    #[test]
    fn normalize_twice_is_normalize_once() {
        for schema in sample_schemas() {
            let once = normalize(&schema);
            assert_eq!(normalize(&once), once, "schema: {schema}");
        }
    }

    #[test]
    fn canonicalize_twice_is_canonicalize_once() {
        for schema in sample_schemas() {
            let once = canonicalize(&schema);
            assert_eq!(canonicalize(&once), once, "schema: {schema}");
        }
    }

    #[test]
    fn no_composition_keywords_remain() {
        for schema in sample_schemas() {
            assert!(
                !contains_key(&normalize(&schema), COMPOSITION_KEYWORDS),
                "schema: {schema}"
            );
        }
    }

    #[test]
    fn input_is_not_modified() {
        let schema = sample_schemas().remove(1);
        let before = schema.clone();
        let _ = canonicalize(&schema);
        assert_eq!(schema, before);
    }
}

// === Cycle Safety ===

mod cycles {
    use super::*;

    #[test]
    fn self_referencing_property_terminates() {
        let doc = json!({
            "components": {
                "schemas": {
                    "Node": {
                        "type": "object",
                        "properties": {
                            "value": { "type": "string" },
                            "next": { "$ref": "#/components/schemas/Node" }
                        }
                    }
                }
            }
        });
        let schema = json!({ "$ref": "#/components/schemas/Node" });
        let result = Normalizer::with_document(&doc).normalize(&schema);

        assert_eq!(result["properties"]["value"]["type"], "string");
        // The back edge stays a pointer.
        assert_eq!(
            result["properties"]["next"],
            json!({ "$ref": "#/components/schemas/Node" })
        );
    }

    #[test]
    fn cycle_through_all_of_terminates() {
        let doc = json!({
            "components": {
                "schemas": {
                    "Base": {
                        "allOf": [
                            { "$ref": "#/components/schemas/Derived" },
                            { "properties": { "base": { "type": "string" } } }
                        ]
                    },
                    "Derived": {
                        "allOf": [
                            { "$ref": "#/components/schemas/Base" },
                            { "properties": { "derived": { "type": "integer" } } }
                        ]
                    }
                }
            }
        });
        let schema = json!({ "$ref": "#/components/schemas/Base" });
        let result = Normalizer::with_document(&doc).canonicalize(&schema);

        assert_eq!(result["properties"]["base"]["type"], "string");
        assert_eq!(result["properties"]["derived"]["type"], "integer");
        assert!(!contains_key(&result, COMPOSITION_KEYWORDS));
    }

    #[test]
    fn shared_schema_is_expanded_each_time() {
        let doc = json!({
            "components": {
                "schemas": {
                    "Address": { "type": "object", "properties": { "city": { "type": "string" } } }
                }
            }
        });
        let schema = json!({
            "properties": {
                "home": { "$ref": "#/components/schemas/Address" },
                "work": { "$ref": "#/components/schemas/Address" }
            }
        });
        let result = Normalizer::with_document(&doc).normalize(&schema);
        assert_eq!(result["properties"]["home"], result["properties"]["work"]);
        assert_eq!(result["properties"]["work"]["properties"]["city"]["type"], "string");
    }

    #[test]
    fn depth_is_capped() {
        let mut schema = json!({ "type": "string" });
        for _ in 0..(MAX_SCHEMA_DEPTH * 3) {
            schema = json!({ "allOf": [schema] });
        }
        // Terminates; the deepest levels are returned as they were.
        let result = normalize(&schema);
        assert!(result.is_object());
    }
}

// === Read-only Exclusion ===

mod read_only {
    use super::*;

    #[test]
    fn nested_read_only_removed_from_properties_and_required() {
        let schema = sample_schemas().remove(3);
        let result = strip_read_only(&schema);

        assert!(result["properties"].get("id").is_none());
        assert_eq!(result["required"], json!([]));
        assert!(result["properties"]["spec"]["properties"].get("status").is_none());
        assert_eq!(result["properties"]["spec"]["required"], json!(["size"]));
        assert!(!contains_key(&result, &["readOnly"]));
    }

    #[test]
    fn read_only_false_is_kept() {
        let schema = json!({ "properties": { "name": { "readOnly": false } } });
        let result = strip_read_only(&schema);
        assert!(result["properties"].get("name").is_some());
    }

    #[test]
    fn read_only_behind_ref_is_removed() {
        let doc = json!({
            "components": {
                "schemas": {
                    "Timestamp": { "type": "string", "readOnly": true }
                }
            }
        });
        let schema = json!({
            "properties": {
                "created": { "$ref": "#/components/schemas/Timestamp" },
                "name": { "type": "string" }
            }
        });
        let result = Normalizer::with_document(&doc).strip_read_only(&schema);
        assert!(result["properties"].get("created").is_none());
        assert!(result["properties"].get("name").is_some());
    }
}

// === Union Determinism ===

mod unions {
    use super::*;

    #[test]
    fn first_branch_wins() {
        let schema = json!({ "oneOf": [{ "type": "string" }, { "type": "integer" }] });
        assert_eq!(normalize(&schema), json!({ "type": "string" }));
    }

    #[test]
    fn any_of_checked_before_one_of() {
        let schema = json!({
            "oneOf": [{ "type": "integer" }],
            "anyOf": [{ "type": "boolean" }]
        });
        assert_eq!(normalize(&schema), json!({ "type": "boolean" }));
    }

    #[test]
    fn first_branch_is_normalized() {
        let schema = json!({
            "anyOf": [{ "allOf": [{ "properties": { "a": {} } }, { "properties": { "b": {} } }] }]
        });
        let result = normalize(&schema);
        let keys: Vec<&String> = result["properties"].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn empty_union_is_dropped() {
        let schema = json!({ "type": "object", "oneOf": [] });
        assert_eq!(normalize(&schema), json!({ "type": "object" }));
    }
}

// === allOf Merging ===

mod all_of {
    use super::*;

    #[test]
    fn properties_merged_and_required_deduplicated() {
        let result = normalize(&sample_schemas().remove(1));
        assert_eq!(result["properties"]["a"], json!({ "type": "string" }));
        assert_eq!(result["properties"]["b"], json!({ "type": "integer" }));
        assert_eq!(result["required"], json!(["a", "b"]));
    }

    #[test]
    fn merged_keys_replace_own_keys() {
        let schema = json!({
            "type": "object",
            "properties": { "own": { "type": "string" } },
            "required": ["own"],
            "allOf": [{ "properties": { "inherited": { "type": "string" } }, "required": ["inherited"] }]
        });
        let result = normalize(&schema);
        assert_eq!(
            result,
            json!({
                "type": "object",
                "properties": { "inherited": { "type": "string" } },
                "required": ["inherited"]
            })
        );
    }

    #[test]
    fn unresolvable_branch_ref_survives() {
        let schema = json!({
            "allOf": [
                { "$ref": "#/components/schemas/X" },
                { "properties": { "a": {} } }
            ]
        });
        let result = normalize(&schema);
        assert_eq!(result["$ref"], "#/components/schemas/X");
        assert_eq!(result["properties"], json!({ "a": {} }));
        assert_eq!(normalize(&result), result);
    }
}
