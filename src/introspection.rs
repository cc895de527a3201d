//! Field and method metadata for resources.
//!
//! StackQL reports columns through `DESCRIBE EXTENDED` and methods through
//! `SHOW EXTENDED METHODS IN`. Running those queries is left to whoever
//! implements [`MetadataSource`]; [`StaticMetadata`] serves pre-captured
//! rows from a JSON file.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::LoadError;
use crate::loader::load_document;
use crate::resource::ResourceDescriptor;
use crate::types::{FieldRow, MethodRow, ResourcePath};

/// Type shown for view columns the base resource does not describe.
pub const FALLBACK_FIELD_TYPE: &str = "text";

/// Description shown for view columns the base resource does not describe.
pub const FALLBACK_FIELD_DESCRIPTION: &str = "field from the parent object";

/// `DESCRIBE EXTENDED provider.service.resource`
pub fn describe_query(path: &ResourcePath) -> String {
    format!("DESCRIBE EXTENDED {path}")
}

/// `SHOW EXTENDED METHODS IN provider.service.resource`
pub fn methods_query(path: &ResourcePath) -> String {
    format!("SHOW EXTENDED METHODS IN {path}")
}

/// Where field and method rows come from.
pub trait MetadataSource {
    /// Rows of [`describe_query`] for `path`; empty if unknown.
    fn fields(&self, path: &ResourcePath) -> Vec<FieldRow>;

    /// Rows of [`methods_query`] for `path`; empty if unknown.
    fn methods(&self, path: &ResourcePath) -> Vec<MethodRow>;
}

/// Everything the page needs to know about a resource besides its schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceMetadata {
    pub fields: Vec<FieldRow>,
    /// View columns with type and description filled from the base resource.
    pub view_fields: Vec<FieldRow>,
    pub methods: Vec<MethodRow>,
}

impl ResourceMetadata {
    /// Collect rows for a resource and its view, if it has one.
    pub fn gather(source: &dyn MetadataSource, resource: &ResourceDescriptor) -> Self {
        let fields = source.fields(&resource.path);
        let view_fields = resource
            .view()
            .map(|view| merge_view_fields(&source.fields(view), &fields))
            .unwrap_or_default();
        let methods = source.methods(&resource.path);

        tracing::debug!(
            resource = %resource.path,
            fields = fields.len(),
            view_fields = view_fields.len(),
            methods = methods.len(),
            "metadata gathered"
        );

        Self {
            fields,
            view_fields,
            methods,
        }
    }
}

/// Fill gaps in view rows from same-named base rows, then from fallbacks.
pub fn merge_view_fields(view_fields: &[FieldRow], base_fields: &[FieldRow]) -> Vec<FieldRow> {
    let base: HashMap<&str, &FieldRow> = base_fields.iter().map(|f| (f.name.as_str(), f)).collect();

    view_fields
        .iter()
        .map(|field| {
            let parent = base.get(field.name.as_str());
            let data_type = non_empty(&field.data_type)
                .or_else(|| parent.and_then(|p| non_empty(&p.data_type)))
                .unwrap_or(FALLBACK_FIELD_TYPE);
            let description = non_empty(&field.description)
                .or_else(|| parent.and_then(|p| non_empty(&p.description)))
                .unwrap_or(FALLBACK_FIELD_DESCRIPTION);
            FieldRow::new(field.name.as_str(), data_type).with_description(description)
        })
        .collect()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ResourceRows {
    #[serde(default)]
    fields: Vec<FieldRow>,
    #[serde(default)]
    methods: Vec<MethodRow>,
}

/// Metadata captured ahead of time, keyed by resource name.
///
/// ```json
/// {
///   "instances": {
///     "fields": [{ "name": "id", "type": "string", "description": "..." }],
///     "methods": [{ "MethodName": "list", "SQLVerb": "SELECT", "RequiredParams": "project" }]
///   },
///   "vw_instances": { "fields": [{ "name": "instance_name" }] }
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct StaticMetadata {
    resources: HashMap<String, ResourceRows>,
}

impl StaticMetadata {
    /// Load rows from a JSON or YAML file.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` if the file can't be read or has the wrong shape.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let value = load_document(path)?;
        serde_json::from_value(value).map_err(|source| LoadError::InvalidMetadata { source })
    }

    /// Register rows for a resource.
    pub fn insert(&mut self, resource: impl Into<String>, fields: Vec<FieldRow>, methods: Vec<MethodRow>) {
        self.resources
            .insert(resource.into(), ResourceRows { fields, methods });
    }
}

impl MetadataSource for StaticMetadata {
    fn fields(&self, path: &ResourcePath) -> Vec<FieldRow> {
        self.resources
            .get(&path.resource)
            .map(|rows| rows.fields.clone())
            .unwrap_or_default()
    }

    fn methods(&self, path: &ResourcePath) -> Vec<MethodRow> {
        self.resources
            .get(&path.resource)
            .map(|rows| rows.methods.clone())
            .unwrap_or_default()
    }
}
