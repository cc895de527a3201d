//! Field manifests - the template input file offered next to INSERT examples.
//!
//! A manifest lists every insertable field of a resource as a tree:
//!
//! ```yaml
//! - name: instances
//!   props:
//!   - name: project
//!     value: string
//!   - name: disks
//!     props:
//!     - name: sizeGb
//!       value: integer
//!     value: array
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SynthesisError;
use crate::normalizer::merge_schema_into;

/// One property in a field manifest.
///
/// Scalars carry a `value` type tag; nested objects carry `props`; arrays of
/// objects carry both (`value: array`). Fields are declared in the order they
/// are serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldManifestEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Vec<FieldManifestEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl FieldManifestEntry {
    /// A scalar leaf.
    pub fn leaf(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            props: None,
            value: Some(value.into()),
        }
    }

    /// A nested object.
    pub fn nested(name: impl Into<String>, props: Vec<FieldManifestEntry>) -> Self {
        Self {
            name: name.into(),
            props: Some(props),
            value: None,
        }
    }

    /// An array whose items are objects.
    pub fn array_of(name: impl Into<String>, props: Vec<FieldManifestEntry>) -> Self {
        Self {
            name: name.into(),
            props: Some(props),
            value: Some("array".to_string()),
        }
    }
}

/// Build the manifest for a resource.
///
/// Required params come first as `string` leaves, followed by the properties
/// of the (already normalized) request body. The whole list is wrapped in a
/// single entry named after the resource.
pub fn build_manifest(
    resource_name: &str,
    required_params: &[String],
    request_body: Option<&Value>,
) -> Vec<FieldManifestEntry> {
    let mut props: Vec<FieldManifestEntry> = required_params
        .iter()
        .map(|param| FieldManifestEntry::leaf(param.as_str(), "string"))
        .collect();

    if let Some(Value::Object(body_props)) = request_body.and_then(|b| b.get("properties")) {
        props.extend(manifest_properties(body_props));
    }

    vec![FieldManifestEntry::nested(resource_name, props)]
}

/// Build the manifest and serialize it as YAML.
///
/// # Errors
///
/// Returns `SynthesisError::Manifest` if YAML serialization fails.
pub fn manifest_yaml(
    resource_name: &str,
    required_params: &[String],
    request_body: Option<&Value>,
) -> Result<String, SynthesisError> {
    let manifest = build_manifest(resource_name, required_params, request_body);
    serde_yaml::to_string(&manifest).map_err(|source| SynthesisError::Manifest { source })
}

fn manifest_properties(properties: &Map<String, Value>) -> Vec<FieldManifestEntry> {
    let mut entries = Vec::new();

    for (name, prop) in properties {
        let Value::Object(prop) = prop else {
            entries.push(FieldManifestEntry::leaf(name.as_str(), "string"));
            continue;
        };

        // allOf left inline on a property is merged on the spot
        let merged;
        let prop = match prop.get("allOf") {
            Some(Value::Array(branches)) => {
                let mut acc = Map::new();
                for branch in branches.iter().filter_map(Value::as_object) {
                    merge_schema_into(&mut acc, branch);
                }
                merged = acc;
                &merged
            }
            _ => prop,
        };

        if prop.get("readOnly").and_then(Value::as_bool) == Some(true) {
            continue;
        }

        let prop_type = declared_type(prop);
        let nested = prop.get("properties").and_then(Value::as_object);
        let item_props = prop
            .get("items")
            .filter(|items| items.get("type").and_then(Value::as_str) == Some("object"))
            .and_then(|items| items.get("properties"))
            .and_then(Value::as_object);

        let entry = match (prop_type, nested, item_props) {
            ("object", Some(nested), _) => {
                FieldManifestEntry::nested(name.as_str(), manifest_properties(nested))
            }
            ("array", _, Some(item_props)) => {
                FieldManifestEntry::array_of(name.as_str(), manifest_properties(item_props))
            }
            (other, _, _) => FieldManifestEntry::leaf(name.as_str(), other),
        };
        entries.push(entry);
    }

    entries
}

/// The declared `type` of a schema, `string` when absent.
///
/// OpenAPI 3.1 allows `type: [string, "null"]`; the first non-null entry wins.
pub(crate) fn declared_type(schema: &Map<String, Value>) -> &str {
    match schema.get("type") {
        Some(Value::String(t)) => t.as_str(),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null")
            .unwrap_or("string"),
        _ => "string",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn required_params_come_first() {
        let body = json!({ "properties": { "name": { "type": "string" } } });
        let manifest = build_manifest("widgets", &params(&["project", "zone"]), Some(&body));

        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest[0].name, "widgets");
        let props = manifest[0].props.as_ref().unwrap();
        let names: Vec<&str> = props.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["project", "zone", "name"]);
        assert_eq!(props[0], FieldManifestEntry::leaf("project", "string"));
    }

    #[test]
    fn nested_objects_and_arrays() {
        let body = json!({
            "properties": {
                "labels": {
                    "type": "object",
                    "properties": { "env": { "type": "string" } }
                },
                "disks": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": { "sizeGb": { "type": "integer" } }
                    }
                },
                "tags": { "type": "array", "items": { "type": "string" } },
                "free": { "type": "object" }
            }
        });
        let manifest = build_manifest("instances", &[], Some(&body));
        let props = manifest[0].props.as_ref().unwrap();

        assert_eq!(
            props[0],
            FieldManifestEntry::nested("labels", vec![FieldManifestEntry::leaf("env", "string")])
        );
        assert_eq!(
            props[1],
            FieldManifestEntry::array_of(
                "disks",
                vec![FieldManifestEntry::leaf("sizeGb", "integer")]
            )
        );
        assert_eq!(props[2], FieldManifestEntry::leaf("tags", "array"));
        assert_eq!(props[3], FieldManifestEntry::leaf("free", "object"));
    }

    #[test]
    fn read_only_and_untyped_properties() {
        let body = json!({
            "properties": {
                "id": { "type": "string", "readOnly": true },
                "anything": {},
                "maybe": { "type": ["null", "boolean"] }
            }
        });
        let manifest = build_manifest("things", &[], Some(&body));
        let props = manifest[0].props.as_ref().unwrap();

        assert_eq!(
            props,
            &vec![
                FieldManifestEntry::leaf("anything", "string"),
                FieldManifestEntry::leaf("maybe", "boolean"),
            ]
        );
    }

    #[test]
    fn inline_all_of_is_merged() {
        let body = json!({
            "properties": {
                "spec": {
                    "allOf": [
                        { "type": "object" },
                        { "properties": { "replicas": { "type": "integer" } } }
                    ]
                }
            }
        });
        let manifest = build_manifest("deployments", &[], Some(&body));
        let props = manifest[0].props.as_ref().unwrap();
        assert_eq!(
            props[0],
            FieldManifestEntry::nested(
                "spec",
                vec![FieldManifestEntry::leaf("replicas", "integer")]
            )
        );
    }

    #[test]
    fn missing_body_yields_params_only() {
        let manifest = build_manifest("buckets", &params(&["project"]), None);
        assert_eq!(
            manifest,
            vec![FieldManifestEntry::nested(
                "buckets",
                vec![FieldManifestEntry::leaf("project", "string")]
            )]
        );
    }

    #[test]
    fn yaml_key_order() {
        let body = json!({
            "properties": {
                "disks": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": { "sizeGb": { "type": "integer" } }
                    }
                }
            }
        });
        let yaml = manifest_yaml("instances", &params(&["project"]), Some(&body)).unwrap();

        assert!(yaml.starts_with("- name: instances\n"));
        let disks_at = yaml.find("name: disks").unwrap();
        let props_at = disks_at + yaml[disks_at..].find("props:").unwrap();
        let value_at = yaml.find("value: array").unwrap();
        assert!(props_at < value_at);

        let parsed: Vec<FieldManifestEntry> = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, build_manifest("instances", &params(&["project"]), Some(&body)));
    }
}
