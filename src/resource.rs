//! Resource catalog read from a StackQL service document.
//!
//! Resources live under `components.x-stackQL-resources`. Each names an `id`
//! and a map of methods whose `operation.$ref` points at an OpenAPI
//! operation in the same document:
//!
//! ```yaml
//! components:
//!   x-stackQL-resources:
//!     instances:
//!       id: google.compute.instances
//!       methods:
//!         insert:
//!           operation:
//!             $ref: '#/paths/~1projects~1{project}~1zones~1{zone}~1instances/post'
//! ```

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::CatalogError;
use crate::loader::{is_local_ref, navigate_fragment};
use crate::normalizer::Normalizer;
use crate::types::{ResourcePath, VIEW_PREFIX};

const JSON_MEDIA_TYPE: &str = "application/json";

/// A documented resource with its request bodies already canonicalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDescriptor {
    pub path: ResourcePath,
    pub id: String,
    view: Option<ResourcePath>,
    request_bodies: HashMap<String, Value>,
}

impl ResourceDescriptor {
    pub fn new(path: ResourcePath, id: impl Into<String>) -> Self {
        Self {
            path,
            id: id.into(),
            view: None,
            request_bodies: HashMap::new(),
        }
    }

    /// Attach the `vw_` sibling.
    pub fn with_view(mut self, view: ResourcePath) -> Self {
        self.view = Some(view);
        self
    }

    /// Attach a canonical request body for a method.
    pub fn with_request_body(mut self, method_name: impl Into<String>, schema: Value) -> Self {
        self.request_bodies.insert(method_name.into(), schema);
        self
    }

    pub fn name(&self) -> &str {
        &self.path.resource
    }

    pub fn view(&self) -> Option<&ResourcePath> {
        self.view.as_ref()
    }

    /// Canonical request body of `method_name`, if it has one.
    pub fn request_body(&self, method_name: &str) -> Option<&Value> {
        self.request_bodies.get(method_name)
    }
}

/// A parsed service document for one provider service.
#[derive(Debug, Clone)]
pub struct ServiceDocument {
    document: Value,
    provider: String,
    service: String,
}

impl ServiceDocument {
    pub fn from_value(
        document: Value,
        provider: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            document,
            provider: provider.into(),
            service: service.into(),
        }
    }

    fn resource_map(&self) -> Result<&Map<String, Value>, CatalogError> {
        self.document
            .get("components")
            .and_then(|c| c.get("x-stackQL-resources"))
            .and_then(Value::as_object)
            .filter(|resources| !resources.is_empty())
            .ok_or(CatalogError::NoResources)
    }

    /// All documentable resources in document order.
    ///
    /// `vw_` views are never listed on their own; they are attached to their
    /// base resource instead. Resources without an `id` are logged and left
    /// out.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NoResources` if the document declares none.
    pub fn resources(&self) -> Result<Vec<ResourceDescriptor>, CatalogError> {
        let map = self.resource_map()?;
        let mut out = Vec::new();

        for (name, data) in map {
            if name.starts_with(VIEW_PREFIX) {
                continue;
            }
            match self.describe(map, name, data) {
                Ok(descriptor) => out.push(descriptor),
                Err(err) => {
                    tracing::warn!(service = %self.service, resource = %name, "{err}, skipping");
                }
            }
        }

        tracing::debug!(service = %self.service, count = out.len(), "resources loaded");
        Ok(out)
    }

    /// Look up one resource by name.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ResourceNotFound` for unknown or `vw_` names,
    /// and `CatalogError::MissingId` when the resource has no `id`.
    pub fn resource(&self, name: &str) -> Result<ResourceDescriptor, CatalogError> {
        let map = self.resource_map()?;
        let data = map
            .get(name)
            .filter(|_| !name.starts_with(VIEW_PREFIX))
            .ok_or_else(|| CatalogError::ResourceNotFound {
                name: name.to_string(),
            })?;
        self.describe(map, name, data)
    }

    fn describe(
        &self,
        map: &Map<String, Value>,
        name: &str,
        data: &Value,
    ) -> Result<ResourceDescriptor, CatalogError> {
        let id = data
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CatalogError::MissingId {
                name: name.to_string(),
            })?;

        let path = ResourcePath::new(&self.provider, &self.service, name);
        let mut descriptor = ResourceDescriptor::new(path.clone(), id);

        let view_name = format!("{VIEW_PREFIX}{name}");
        if map.contains_key(&view_name) {
            descriptor = descriptor.with_view(path.sibling(view_name));
        }

        if let Some(methods) = data.get("methods").and_then(Value::as_object) {
            for (method_name, method) in methods {
                if let Some(schema) = self.request_body_schema(method) {
                    descriptor = descriptor.with_request_body(method_name.as_str(), schema);
                }
            }
        }

        Ok(descriptor)
    }

    /// Canonical JSON request body of a resource method entry.
    ///
    /// Follows `operation.$ref` to the OpenAPI operation, then its
    /// `requestBody` (itself possibly a local `$ref`) down to the
    /// `application/json` schema. Missing links yield `None`.
    pub fn request_body_schema(&self, method: &Value) -> Option<Value> {
        let operation_ref = method
            .get("operation")
            .and_then(|op| op.get("$ref"))
            .and_then(Value::as_str)?;

        let operation = self.follow(operation_ref)?;
        let mut request_body = operation.get("requestBody")?;
        if let Some(reference) = request_body.get("$ref").and_then(Value::as_str) {
            request_body = self.follow(reference)?;
        }

        let schema = request_body
            .get("content")
            .and_then(|c| c.get(JSON_MEDIA_TYPE))
            .and_then(|media| media.get("schema"))?;

        Some(Normalizer::with_document(&self.document).canonicalize(schema))
    }

    fn follow(&self, reference: &str) -> Option<&Value> {
        if !is_local_ref(reference) {
            tracing::debug!(reference, "ignoring non-local reference");
            return None;
        }
        match navigate_fragment(&self.document, reference) {
            Ok(target) => Some(target),
            Err(err) => {
                tracing::debug!(reference, "{err}");
                None
            }
        }
    }
}
