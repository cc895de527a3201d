//! Core types shared by normalization, synthesis and page assembly.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Recursion cap for schema walks, independent of cycle detection.
pub const MAX_SCHEMA_DEPTH: usize = 20;

/// Prefix StackQL puts on columns that map to request body fields.
pub const DATA_FIELD_PREFIX: &str = "data__";

/// Prefix of the read-optimized view sibling of a resource.
pub const VIEW_PREFIX: &str = "vw_";

/// Composition keywords that never survive normalization.
pub const COMPOSITION_KEYWORDS: &[&str] = &["allOf", "anyOf", "oneOf"];

/// Returns the JSON type name for diagnostics.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Wrap a field name in the mustache placeholder used by every template.
pub fn placeholder(field: &str) -> String {
    format!("'{{{{ {} }}}}'", field)
}

/// Strip the `data__` marker from a column name, if present.
pub fn strip_data_prefix(column: &str) -> &str {
    column.strip_prefix(DATA_FIELD_PREFIX).unwrap_or(column)
}

/// SQL verb a StackQL method is accessible by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SqlVerb {
    Select,
    Insert,
    Update,
    Replace,
    Delete,
    Exec,
}

impl SqlVerb {
    /// Verbs that get a synthesized example, in page order.
    pub const EXAMPLE_ORDER: [SqlVerb; 5] = [
        SqlVerb::Select,
        SqlVerb::Insert,
        SqlVerb::Update,
        SqlVerb::Replace,
        SqlVerb::Delete,
    ];

    /// Returns the SQL keyword for this verb.
    pub fn keyword(&self) -> &'static str {
        match self {
            SqlVerb::Select => "SELECT",
            SqlVerb::Insert => "INSERT",
            SqlVerb::Update => "UPDATE",
            SqlVerb::Replace => "REPLACE",
            SqlVerb::Delete => "DELETE",
            SqlVerb::Exec => "EXEC",
        }
    }

    /// Parse a verb as reported by `SHOW EXTENDED METHODS` (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SELECT" => Some(SqlVerb::Select),
            "INSERT" => Some(SqlVerb::Insert),
            "UPDATE" => Some(SqlVerb::Update),
            "REPLACE" => Some(SqlVerb::Replace),
            "DELETE" => Some(SqlVerb::Delete),
            "EXEC" => Some(SqlVerb::Exec),
            _ => None,
        }
    }
}

impl fmt::Display for SqlVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Fully qualified `provider.service.resource` name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath {
    pub provider: String,
    pub service: String,
    pub resource: String,
}

impl ResourcePath {
    pub fn new(
        provider: impl Into<String>,
        service: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            service: service.into(),
            resource: resource.into(),
        }
    }

    /// Same provider and service, different resource name.
    pub fn sibling(&self, resource: impl Into<String>) -> Self {
        Self {
            provider: self.provider.clone(),
            service: self.service.clone(),
            resource: resource.into(),
        }
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.provider, self.service, self.resource)
    }
}

/// One row of `DESCRIBE EXTENDED <resource>`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldRow {
    pub name: String,
    #[serde(rename = "type", default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl FieldRow {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: Some(data_type.into()),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// One row of `SHOW EXTENDED METHODS IN <resource>`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MethodRow {
    #[serde(rename = "MethodName")]
    pub method_name: String,
    #[serde(rename = "SQLVerb")]
    pub sql_verb: String,
    #[serde(rename = "RequiredParams", default)]
    pub required_params: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl MethodRow {
    pub fn new(
        method_name: impl Into<String>,
        sql_verb: impl Into<String>,
        required_params: impl Into<String>,
    ) -> Self {
        Self {
            method_name: method_name.into(),
            sql_verb: sql_verb.into(),
            required_params: required_params.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Parsed verb, `None` for verbs this crate does not know.
    pub fn verb(&self) -> Option<SqlVerb> {
        SqlVerb::parse(&self.sql_verb)
    }

    /// Required params split on commas, trimmed, empties dropped.
    pub fn required_param_list(&self) -> Vec<String> {
        self.required_params
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect()
    }
}

/// Options for page assembly.
#[derive(Debug, Clone)]
pub struct PageOptions {
    /// Emit front matter and the Overview/Fields/Methods sections ahead of
    /// the examples. Examples-only output is useful for snippets.
    pub include_tables: bool,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            include_tables: true,
        }
    }
}

impl PageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the front matter and reference tables.
    pub fn include_tables(mut self, include: bool) -> Self {
        self.include_tables = include;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn placeholder_uses_double_braces() {
        assert_eq!(placeholder("name"), "'{{ name }}'");
    }

    #[test]
    fn strip_data_prefix_only_strips_marker() {
        assert_eq!(strip_data_prefix("data__name"), "name");
        assert_eq!(strip_data_prefix("projectId"), "projectId");
        assert_eq!(strip_data_prefix("metadata__x"), "metadata__x");
    }

    #[test]
    fn sql_verb_parse_is_case_insensitive() {
        assert_eq!(SqlVerb::parse("select"), Some(SqlVerb::Select));
        assert_eq!(SqlVerb::parse(" REPLACE "), Some(SqlVerb::Replace));
        assert_eq!(SqlVerb::parse("upsert"), None);
    }

    #[test]
    fn required_param_list_trims_and_drops_empty() {
        let method = MethodRow::new("get", "SELECT", " projectId, zone ,,");
        assert_eq!(method.required_param_list(), vec!["projectId", "zone"]);

        let method = MethodRow::new("list", "SELECT", "");
        assert!(method.required_param_list().is_empty());
    }

    #[test]
    fn method_row_deserializes_introspection_shape() {
        let row: MethodRow = serde_json::from_value(json!({
            "MethodName": "instances_insert",
            "SQLVerb": "INSERT",
            "RequiredParams": "project, zone",
            "description": "Creates an instance."
        }))
        .unwrap();
        assert_eq!(row.verb(), Some(SqlVerb::Insert));
        assert_eq!(row.required_param_list(), vec!["project", "zone"]);
    }

    #[test]
    fn field_row_tolerates_missing_columns() {
        let row: FieldRow = serde_json::from_value(json!({ "name": "id" })).unwrap();
        assert_eq!(row.name, "id");
        assert!(row.data_type.is_none());
        assert!(row.description.is_none());
    }

    #[test]
    fn resource_path_display_and_sibling() {
        let path = ResourcePath::new("google", "compute", "instances");
        assert_eq!(path.to_string(), "google.compute.instances");
        assert_eq!(
            path.sibling("vw_instances").to_string(),
            "google.compute.vw_instances"
        );
    }
}
