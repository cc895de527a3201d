//! Document loading from files and strings.
//!
//! Service documents are usually YAML, request body fragments often JSON.
//! Both parse into a `serde_json::Value` with key order preserved.

use std::path::Path;

use serde_json::Value;

use crate::error::LoadError;

/// Load a JSON or YAML document from a file path.
///
/// Files ending in `.yaml`/`.yml` are parsed as YAML, everything else as JSON.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist, or a parse
/// error if the content is malformed.
pub fn load_document(path: &Path) -> Result<Value, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    if is_yaml_path(path) {
        load_yaml_str(&content)
    } else {
        load_json_str(&content)
    }
}

/// Load a document from a JSON string.
pub fn load_json_str(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

/// Load a document from a YAML string.
pub fn load_yaml_str(content: &str) -> Result<Value, LoadError> {
    serde_yaml::from_str(content).map_err(|source| LoadError::InvalidYaml { source })
}

fn is_yaml_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Check if a `$ref` points into the current document (`#/...`).
pub fn is_local_ref(reference: &str) -> bool {
    reference.starts_with("#/")
}

/// Navigate a JSON Pointer fragment (e.g. `#/paths/~1v1~1things/post`).
///
/// Returns a borrow of the value at the given pointer within `document`.
/// `~1` and `~0` escapes are honoured per RFC 6901.
pub fn navigate_fragment<'a>(document: &'a Value, fragment: &str) -> Result<&'a Value, LoadError> {
    let pointer = fragment.trim_start_matches('#');
    if pointer.is_empty() {
        return Ok(document);
    }

    document
        .pointer(pointer)
        .ok_or_else(|| LoadError::FragmentNotFound {
            fragment: fragment.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn navigate_fragment_unescapes_paths() {
        let doc = json!({
            "paths": {
                "/v1/things": {
                    "post": { "operationId": "createThing" }
                }
            }
        });
        let op = navigate_fragment(&doc, "#/paths/~1v1~1things/post").unwrap();
        assert_eq!(op["operationId"], "createThing");
    }

    #[test]
    fn navigate_fragment_root() {
        let doc = json!({ "a": 1 });
        assert_eq!(navigate_fragment(&doc, "#").unwrap(), &doc);
    }

    #[test]
    fn navigate_fragment_missing() {
        let doc = json!({ "a": 1 });
        let err = navigate_fragment(&doc, "#/b").unwrap_err();
        assert!(matches!(err, LoadError::FragmentNotFound { .. }));
    }

    #[test]
    fn yaml_preserves_key_order() {
        let doc = load_yaml_str("properties:\n  zeta: {type: string}\n  alpha: {type: string}\n")
            .unwrap();
        let keys: Vec<&String> = doc["properties"].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["zeta", "alpha"]);
    }

    #[test]
    fn load_document_picks_parser_by_extension() {
        let dir = TempDir::new().unwrap();
        let yaml = dir.path().join("service.yaml");
        fs::write(&yaml, "openapi: 3.0.0\n").unwrap();
        assert_eq!(load_document(&yaml).unwrap()["openapi"], "3.0.0");

        let json_path = dir.path().join("schema.json");
        fs::write(&json_path, r#"{"type":"object"}"#).unwrap();
        assert_eq!(load_document(&json_path).unwrap()["type"], "object");
    }

    #[test]
    fn load_document_missing_file() {
        let err = load_document(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn load_json_invalid() {
        let err = load_json_str("{not json").unwrap_err();
        assert!(matches!(err, LoadError::InvalidJson { .. }));
    }
}
