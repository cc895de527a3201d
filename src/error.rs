//! Error types for document loading, resource lookup and example synthesis.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::SqlVerb;

/// Errors while loading a schema or service document.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML: {source}")]
    InvalidYaml {
        #[source]
        source: serde_yaml::Error,
    },

    #[error("fragment not found: {fragment}")]
    FragmentNotFound { fragment: String },

    #[error("invalid metadata rows: {source}")]
    InvalidMetadata {
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors while reading resources out of a service document.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("service document has no components.x-stackQL-resources")]
    NoResources,

    #[error("resource '{name}' not found")]
    ResourceNotFound { name: String },

    #[error("resource '{name}' has no id")]
    MissingId { name: String },
}

impl CatalogError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors while deriving a single example.
///
/// These never abort a run: the page assembler logs them and emits an
/// empty template for the affected verb.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("request body schema is {actual}, expected object")]
    RequestBodyNotObject { actual: String },

    #[error("properties of request body is {actual}, expected object")]
    PropertiesNotObject { actual: String },

    #[error("required of request body is {actual}, expected array of strings")]
    RequiredNotArray { actual: String },

    #[error("cannot serialize manifest: {source}")]
    Manifest {
        #[source]
        source: serde_yaml::Error,
    },
}

/// A verb whose example was replaced by an empty template.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Skipped {
    pub resource: String,
    pub verb: SqlVerb,
    pub reason: String,
}

impl std::fmt::Display for Skipped {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.resource, self.verb, self.reason)
    }
}
