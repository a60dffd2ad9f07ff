//! Meta-schema validation of the merged document
//!
//! The compiler only needs "is this document acceptable". The check itself
//! is pluggable through [`DocumentValidator`]; [`JsonSchemaValidator`] is the
//! stock implementation backed by the `jsonschema` crate.

use jsonschema::JSONSchema;
use serde_json::Value;
use std::fmt;
use std::path::Path;

use crate::error::{CompileError, Result};

/// Checks a merged schema document before any type is built
pub trait DocumentValidator {
    /// `Err(CompileError::Validation { .. })` listing every violation
    fn validate(&self, document: &Value) -> Result<()>;
}

/// Validates against a JSON Schema (draft auto-detected from `$schema`)
pub struct JsonSchemaValidator {
    schema: JSONSchema,
    origin: String,
}

impl fmt::Debug for JsonSchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchemaValidator")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl JsonSchemaValidator {
    /// Compile a meta-schema given as a value
    pub fn from_value(schema: &Value) -> Result<Self> {
        Self::compile(schema, "<inline>".to_string())
    }

    /// Load a meta-schema file, YAML or JSON
    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::debug!("loading meta-schema {}", path.display());
        let raw = std::fs::read(path)?;
        let schema: Value = serde_yaml::from_slice(&raw)?;
        Self::compile(&schema, path.display().to_string())
    }

    /// Where the meta-schema came from
    pub fn origin(&self) -> &str {
        &self.origin
    }

    fn compile(schema: &Value, origin: String) -> Result<Self> {
        let compiled = JSONSchema::compile(schema).map_err(|e| CompileError::Validation {
            violations: vec![format!("meta-schema {} is invalid: {}", origin, e)],
        })?;
        Ok(Self {
            schema: compiled,
            origin,
        })
    }
}

impl DocumentValidator for JsonSchemaValidator {
    fn validate(&self, document: &Value) -> Result<()> {
        let violations: Vec<String> = match self.schema.validate(document) {
            Ok(()) => return Ok(()),
            Err(errors) => errors
                .map(|e| {
                    let at = e.instance_path.to_string();
                    if at.is_empty() {
                        format!("/: {}", e)
                    } else {
                        format!("{}: {}", at, e)
                    }
                })
                .collect(),
        };

        tracing::warn!(
            "{} failed validation with {} violation(s)",
            self.origin,
            violations.len()
        );
        Err(CompileError::Validation { violations })
    }
}
