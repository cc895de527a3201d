//! Column and value lists for INSERT examples.
//!
//! Request body fields become `data__`-prefixed columns whose placeholders
//! reference the bare field name; required path/query params are columns as
//! they are. Two views are derived:
//!
//! - **all**: every body property, then every required param
//! - **required**: the body's `required` names, then every required param
//!
//! Each view is built as a list of (column, value) pairs deduplicated by
//! column, so column *i* and value *i* always describe the same field.

use std::collections::HashSet;

use serde_json::Value;

use crate::error::SynthesisError;
use crate::types::{json_type_name, placeholder, strip_data_prefix, DATA_FIELD_PREFIX};

/// Column/value lists for the "all" and "required" INSERT examples.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSets {
    pub required_columns: Vec<String>,
    pub all_columns: Vec<String>,
    pub required_values: Vec<String>,
    pub all_values: Vec<String>,
}

impl FieldSets {
    /// True when a separate "required" example adds something over "all".
    pub fn has_distinct_required(&self) -> bool {
        !self.required_columns.is_empty() && self.required_columns.len() < self.all_columns.len()
    }

    /// (column, value) pairs of the "all" view.
    pub fn all_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.all_columns
            .iter()
            .map(String::as_str)
            .zip(self.all_values.iter().map(String::as_str))
    }

    /// (column, value) pairs of the "required" view.
    pub fn required_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.required_columns
            .iter()
            .map(String::as_str)
            .zip(self.required_values.iter().map(String::as_str))
    }
}

/// Ordered, column-deduplicated (column, value) list.
#[derive(Default)]
struct Slots {
    columns: Vec<String>,
    values: Vec<String>,
    seen: HashSet<String>,
}

impl Slots {
    fn push(&mut self, column: String) {
        if self.seen.contains(&column) {
            return;
        }
        self.values.push(placeholder(strip_data_prefix(&column)));
        self.seen.insert(column.clone());
        self.columns.push(column);
    }
}

/// Derive INSERT column/value lists from a normalized request body.
///
/// `request_body` of `None` or `null` contributes no body fields. `required`
/// names without a matching property are ignored, which keeps the required
/// columns a subset of all columns.
///
/// # Errors
///
/// Returns `SynthesisError` if the body, its `properties` or its `required`
/// list has the wrong JSON type.
pub fn derive_field_sets(
    required_params: &[String],
    request_body: Option<&Value>,
) -> Result<FieldSets, SynthesisError> {
    let (property_names, required_names) = match request_body {
        None | Some(Value::Null) => (Vec::new(), Vec::new()),
        Some(Value::Object(body)) => {
            let properties: Vec<&str> = match body.get("properties") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Object(props)) => props.keys().map(String::as_str).collect(),
                Some(other) => {
                    return Err(SynthesisError::PropertiesNotObject {
                        actual: json_type_name(other).to_string(),
                    })
                }
            };
            let required: Vec<&str> = match body.get("required") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(names)) => names
                    .iter()
                    .map(|n| {
                        n.as_str().ok_or_else(|| SynthesisError::RequiredNotArray {
                            actual: format!("array containing {}", json_type_name(n)),
                        })
                    })
                    .collect::<Result<_, _>>()?,
                Some(other) => {
                    return Err(SynthesisError::RequiredNotArray {
                        actual: json_type_name(other).to_string(),
                    })
                }
            };
            let required = required
                .into_iter()
                .filter(|name| properties.contains(name))
                .collect();
            (properties, required)
        }
        Some(other) => {
            return Err(SynthesisError::RequestBodyNotObject {
                actual: json_type_name(other).to_string(),
            })
        }
    };

    let mut all = Slots::default();
    for name in &property_names {
        all.push(format!("{DATA_FIELD_PREFIX}{name}"));
    }
    for param in required_params {
        all.push(param.clone());
    }

    let mut required = Slots::default();
    for name in &required_names {
        required.push(format!("{DATA_FIELD_PREFIX}{name}"));
    }
    for param in required_params {
        required.push(param.clone());
    }

    Ok(FieldSets {
        required_columns: required.columns,
        all_columns: all.columns,
        required_values: required.values,
        all_values: all.values,
    })
}
