//! Schema normalization - flattens composition keywords and read-only fields.
//!
//! Request body schemas from cloud provider specs are rarely flat. They mix
//! `allOf` inheritance, `anyOf`/`oneOf` unions, `readOnly` server-populated
//! fields and `$ref` pointers that may loop back on themselves. Examples need
//! a single concrete shape, so normalization applies three rules:
//!
//! | Keyword | Rule |
//! |---------|------|
//! | `allOf` | Merge every branch (`properties` deep-merged, `required` concatenated and deduplicated), then overwrite the node's own keys with the result |
//! | `anyOf` / `oneOf` | Replace the node with its first branch (`anyOf` checked first) |
//! | `readOnly: true` | Drop the property (and its `required` entry) |
//!
//! The `anyOf`/`oneOf` rule is lossy on purpose: generated docs have always
//! shown the first union member and must stay stable.
//!
//! # Cycles
//!
//! Local `$ref` pointers are followed against the document handed to
//! [`Normalizer::with_document`]. Each pointer being expanded sits in a
//! visited set for the duration of its branch; meeting it again returns the
//! `$ref` node unexpanded. Depth is also capped at [`MAX_SCHEMA_DEPTH`].
//! Neither guard is an error.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::loader::{is_local_ref, navigate_fragment};
use crate::types::MAX_SCHEMA_DEPTH;

/// Normalize a standalone schema fragment.
///
/// `$ref` pointers are left as opaque leaves since there is no document to
/// resolve them against.
pub fn normalize(schema: &Value) -> Value {
    Normalizer::new().normalize(schema)
}

/// Remove read-only properties from a standalone schema fragment.
pub fn strip_read_only(schema: &Value) -> Value {
    Normalizer::new().strip_read_only(schema)
}

/// [`normalize`] followed by [`strip_read_only`].
pub fn canonicalize(schema: &Value) -> Value {
    Normalizer::new().canonicalize(schema)
}

/// Schema normalizer, optionally bound to the document its `$ref`s point into.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer<'a> {
    document: Option<&'a Value>,
}

impl<'a> Normalizer<'a> {
    /// Normalizer without a document; `$ref`s are not followed.
    pub fn new() -> Self {
        Self { document: None }
    }

    /// Normalizer that follows `#/...` pointers into `document`.
    pub fn with_document(document: &'a Value) -> Self {
        Self {
            document: Some(document),
        }
    }

    /// Resolve `allOf`, `anyOf` and `oneOf` recursively.
    ///
    /// Returns a new value; the input is not modified.
    pub fn normalize(&self, schema: &Value) -> Value {
        let mut visited = HashSet::new();
        self.normalize_node(schema, &mut visited, 0)
    }

    /// Remove every property whose schema is `readOnly: true`.
    pub fn strip_read_only(&self, schema: &Value) -> Value {
        strip_node(schema, self, 0)
    }

    /// Full request-body pipeline: normalize, then strip read-only fields.
    pub fn canonicalize(&self, schema: &Value) -> Value {
        let normalized = self.normalize(schema);
        self.strip_read_only(&normalized)
    }

    fn normalize_node(&self, value: &Value, visited: &mut HashSet<String>, depth: usize) -> Value {
        let Value::Object(map) = value else {
            return value.clone();
        };
        if depth > MAX_SCHEMA_DEPTH {
            return value.clone();
        }

        if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
            if let Some(expanded) = self.normalize_ref(value, map, reference, visited, depth) {
                return expanded;
            }
        }

        let mut node = map.clone();

        if let Some(all_of) = node.shift_remove("allOf") {
            let mut merged = Map::new();
            if let Value::Array(entries) = &all_of {
                for entry in entries {
                    let back_edge = self.is_back_edge(entry, visited);
                    let resolved = self.normalize_node(entry, visited, depth + 1);
                    if let Value::Object(mut resolved) = resolved {
                        if back_edge {
                            resolved.shift_remove("$ref");
                        }
                        merge_schema_into(&mut merged, &resolved);
                    }
                }
            }
            // The accumulator replaces the node's own keys wholesale.
            for (key, value) in merged {
                node.insert(key, value);
            }
            dedupe_required(&mut node);
        }

        for key in ["anyOf", "oneOf"] {
            let Some(branches) = node.shift_remove(key) else {
                continue;
            };
            if let Some(first) = branches.as_array().and_then(|b| b.first()) {
                return self.normalize_node(first, visited, depth + 1);
            }
        }

        if let Some(Value::Object(props)) = node.get_mut("properties") {
            for prop in props.values_mut() {
                let normalized = self.normalize_node(prop, visited, depth + 1);
                *prop = normalized;
            }
        }

        match node.get_mut("items") {
            Some(Value::Array(items)) => {
                for item in items.iter_mut() {
                    let normalized = self.normalize_node(item, visited, depth + 1);
                    *item = normalized;
                }
            }
            Some(items @ Value::Object(_)) => {
                let normalized = self.normalize_node(items, visited, depth + 1);
                *items = normalized;
            }
            _ => {}
        }

        Value::Object(node)
    }

    /// Expand a `$ref` node. `None` means the ref cannot be resolved and the
    /// node is normalized as an ordinary object with `$ref` kept opaque.
    fn normalize_ref(
        &self,
        value: &Value,
        map: &Map<String, Value>,
        reference: &str,
        visited: &mut HashSet<String>,
        depth: usize,
    ) -> Option<Value> {
        let (pointer, target) = self.resolve_ref(reference)?;
        // Re-entering a pointer that is still being expanded: leave the cycle open.
        if visited.contains(&pointer) {
            return Some(value.clone());
        }

        let inlined = inline_ref(map, target);
        visited.insert(pointer.clone());
        let result = self.normalize_node(&inlined, visited, depth + 1);
        visited.remove(&pointer);
        Some(result)
    }

    /// True if `entry` is a `$ref` back to a pointer still being expanded.
    fn is_back_edge(&self, entry: &Value, visited: &HashSet<String>) -> bool {
        entry
            .get("$ref")
            .and_then(Value::as_str)
            .and_then(|reference| self.resolve_ref(reference))
            .is_some_and(|(pointer, _)| visited.contains(&pointer))
    }

    /// Look up a local `$ref`, returning its pointer and target object.
    fn resolve_ref(&self, reference: &str) -> Option<(String, &'a Map<String, Value>)> {
        let document = self.document?;
        if !is_local_ref(reference) {
            return None;
        }
        let target = navigate_fragment(document, reference).ok()?.as_object()?;
        Some((reference.to_string(), target))
    }

    /// Follow a chain of `$ref`s to decide whether a property is read-only.
    fn is_read_only(&self, prop: &Value) -> bool {
        let Some(mut current) = prop.as_object() else {
            return false;
        };
        let mut seen = HashSet::new();
        loop {
            if let Some(flag) = current.get("readOnly").and_then(Value::as_bool) {
                return flag;
            }
            let Some(reference) = current.get("$ref").and_then(Value::as_str) else {
                return false;
            };
            let Some((pointer, target)) = self.resolve_ref(reference) else {
                return false;
            };
            if !seen.insert(pointer) || seen.len() > MAX_SCHEMA_DEPTH {
                return false;
            }
            current = target;
        }
    }
}

/// Read-only stripping walks the owned tree; `$ref` leaves are only peeked
/// through to read their `readOnly` flag, never expanded into the output.
fn strip_node(value: &Value, normalizer: &Normalizer<'_>, depth: usize) -> Value {
    let Value::Object(map) = value else {
        return value.clone();
    };
    if depth > MAX_SCHEMA_DEPTH {
        return value.clone();
    }

    let mut node = map.clone();

    let mut removed = Vec::new();
    if let Some(Value::Object(props)) = node.get_mut("properties") {
        let mut kept = Map::new();
        for (name, prop) in props.iter() {
            if normalizer.is_read_only(prop) {
                removed.push(name.clone());
            } else {
                kept.insert(name.clone(), strip_node(prop, normalizer, depth + 1));
            }
        }
        *props = kept;
    }
    if !removed.is_empty() {
        if let Some(Value::Array(required)) = node.get_mut("required") {
            required.retain(|r| !r.as_str().is_some_and(|r| removed.iter().any(|n| n == r)));
        }
    }

    match node.get_mut("items") {
        Some(Value::Array(items)) => {
            for item in items.iter_mut() {
                let stripped = strip_node(item, normalizer, depth + 1);
                *item = stripped;
            }
        }
        Some(items @ Value::Object(_)) => {
            let stripped = strip_node(items, normalizer, depth + 1);
            *items = stripped;
        }
        _ => {}
    }

    Value::Object(node)
}

/// Replace a `$ref` node with its target; sibling keys of the `$ref` win.
fn inline_ref(node: &Map<String, Value>, target: &Map<String, Value>) -> Value {
    let mut inlined = node.clone();
    inlined.shift_remove("$ref");
    for (k, v) in target {
        inlined.entry(k.clone()).or_insert_with(|| v.clone());
    }
    Value::Object(inlined)
}

/// Merge one schema object into another, `allOf` style.
///
/// `properties` are merged key by key and `required` lists concatenated;
/// every other key, an opaque `$ref` included, is overwritten by `entry`.
pub(crate) fn merge_schema_into(acc: &mut Map<String, Value>, entry: &Map<String, Value>) {
    for (key, value) in entry {
        match (key.as_str(), acc.get_mut(key), value) {
            ("properties", Some(Value::Object(existing)), Value::Object(incoming)) => {
                for (name, prop) in incoming {
                    existing.insert(name.clone(), prop.clone());
                }
            }
            ("required", Some(Value::Array(existing)), Value::Array(incoming)) => {
                existing.extend(incoming.iter().cloned());
            }
            _ => {
                acc.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Deduplicate the `required` list, keeping first occurrences.
fn dedupe_required(node: &mut Map<String, Value>) {
    if let Some(Value::Array(required)) = node.get_mut("required") {
        let mut seen = HashSet::new();
        required.retain(|r| seen.insert(r.to_string()));
    }
}
