//! Error types for the schema compiler

use std::path::PathBuf;

use thiserror::Error;

/// Result type for compiler operations
pub type Result<T> = std::result::Result<T, CompileError>;

/// Fatal compiler errors.
///
/// Anything in here aborts the compilation: the schema itself is invalid and
/// no partial graph is usable. Recoverable problems (bad constraint entries,
/// unresolved constraint scopes) are reported through
/// [`Diagnostics`](crate::graph::Diagnostics) instead.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("File not found: {path} (searched: {})", format_searched(.searched))]
    FileNotFound { path: PathBuf, searched: Vec<PathBuf> },

    #[error("Unsupported reference: '{reference}' (only local and file references are supported)")]
    UnsupportedReference { reference: String },

    #[error("Unresolved reference: '{pointer}' does not name an entry of the schema")]
    UnresolvedReference { pointer: String },

    #[error("Cyclic reference: {}", .chain.join(" -> "))]
    CyclicReference { chain: Vec<String> },

    #[error("Could not resolve item type of '{name}'")]
    UnresolvedItemType { name: String },

    #[error("Could not resolve key type of '{name}'")]
    UnresolvedKeyType { name: String },

    #[error("Could not resolve value type of '{name}'")]
    UnresolvedValueType { name: String },

    #[error("Malformed type '{name}': {reason}")]
    MalformedType { name: String, reason: String },

    #[error("Section '{section}' must be a mapping")]
    InvalidSection { section: String },

    #[error("Cyclic type dependency between: {}", .members.join(", "))]
    CyclicDependency { members: Vec<String> },

    #[error("Schema validation failed:\n  {}", .violations.join("\n  "))]
    Validation { violations: Vec<String> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CompileError {
    pub(crate) fn malformed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedType {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

fn format_searched(searched: &[PathBuf]) -> String {
    searched
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
