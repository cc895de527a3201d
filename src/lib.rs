//! StackQL Docgen
//!
//! Normalizes OpenAPI request body schemas and synthesizes StackQL SQL
//! examples for provider documentation.
//!
//! The pipeline for one resource is:
//!
//! 1. [`canonicalize`] the request body: flatten `allOf`, pick the first
//!    `anyOf`/`oneOf` branch, drop `readOnly` properties
//! 2. derive INSERT column/value lists ([`derive_field_sets`]) and a
//!    [`build_manifest`] tree
//! 3. render SELECT/INSERT/UPDATE/REPLACE/DELETE examples
//!    ([`render_examples`]) and wrap them in a page ([`assemble_page`])
//!
//! # Example
//!
//! ```
//! use stackql_docgen::{canonicalize, derive_field_sets};
//! use serde_json::json;
//!
//! let body = json!({
//!     "allOf": [
//!         { "properties": { "id": { "type": "string", "readOnly": true } } },
//!         { "properties": { "name": { "type": "string" } }, "required": ["name"] }
//!     ]
//! });
//!
//! let body = canonicalize(&body);
//! assert!(body["properties"].get("id").is_none());
//!
//! let sets = derive_field_sets(&["projectId".to_string()], Some(&body)).unwrap();
//! assert_eq!(sets.all_columns, ["data__name", "projectId"]);
//! assert_eq!(sets.all_values, ["'{{ name }}'", "'{{ projectId }}'"]);
//! assert!(!sets.has_distinct_required());
//! ```
//!
//! # Normalization Rules
//!
//! | Keyword | Effect |
//! |---------|--------|
//! | `allOf` | Branches merged into the node |
//! | `anyOf` / `oneOf` | Node replaced by its first branch |
//! | `readOnly: true` | Property and its `required` entry removed |
//! | `$ref` | Inlined when a document is supplied, left opaque on a cycle |

mod error;
mod fields;
mod introspection;
mod loader;
mod manifest;
mod normalizer;
mod page;
mod resource;
mod synthesizer;
mod types;

pub use error::{CatalogError, LoadError, Skipped, SynthesisError};
pub use fields::{derive_field_sets, FieldSets};
pub use introspection::{
    describe_query, merge_view_fields, methods_query, MetadataSource, ResourceMetadata,
    StaticMetadata,
};
pub use loader::{load_document, load_json_str, load_yaml_str, navigate_fragment};
pub use manifest::{build_manifest, manifest_yaml, FieldManifestEntry};
pub use normalizer::{canonicalize, normalize, strip_read_only, Normalizer};
pub use page::{assemble_page, clean_description, ResourcePage};
pub use resource::{ResourceDescriptor, ServiceDocument};
pub use synthesizer::{
    delete_example, insert_example, param_conditions, render_examples, representative_method,
    select_example, set_assignments, update_example, ExampleSet,
};
pub use types::{
    FieldRow, MethodRow, PageOptions, ResourcePath, SqlVerb, COMPOSITION_KEYWORDS,
    DATA_FIELD_PREFIX, MAX_SCHEMA_DEPTH, VIEW_PREFIX,
};
