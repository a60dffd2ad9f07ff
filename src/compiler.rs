//! Compilation pipeline
//!
//! load -> validate -> build types/elements -> extract -> order -> bind ->
//! handoff. Stages run strictly one after the other; each consumes all of
//! the previous stage's output.

use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::checksum::Checksum;
use crate::codegen::RenderData;
use crate::config::CgenConfig;
use crate::error::Result;
use crate::graph::{
    bind_constraints, extract_nested_types, order_types, Diagnostics, ReorderStats,
};
use crate::loader::Loader;
use crate::model::{load_constraints, TypeBuilder};
use crate::validate::{DocumentValidator, JsonSchemaValidator};

/// Result of a successful compilation
#[derive(Debug, Clone)]
pub struct Compilation {
    pub data: RenderData,
    /// Recoverable problems met on the way
    pub diagnostics: Diagnostics,
    pub stats: ReorderStats,
}

/// Compiles schema files into [`RenderData`]
pub struct Compiler {
    config: CgenConfig,
    search_paths: Vec<PathBuf>,
    validator: Option<Box<dyn DocumentValidator>>,
}

impl Compiler {
    /// Compiler without a validator
    pub fn new(config: CgenConfig) -> Self {
        Self {
            config,
            search_paths: Vec::new(),
            validator: None,
        }
    }

    /// Compiler validating against the configured meta-schema when
    /// validation is enabled
    pub fn from_config(config: CgenConfig) -> Result<Self> {
        let validator: Option<Box<dyn DocumentValidator>> = if config.validation.enabled {
            let path = config.meta_schema_path()?;
            Some(Box::new(JsonSchemaValidator::from_file(&path)?))
        } else {
            None
        };

        let mut compiler = Self::new(config);
        compiler.validator = validator;
        Ok(compiler)
    }

    pub fn with_validator(mut self, validator: Box<dyn DocumentValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn without_validator(mut self) -> Self {
        self.validator = None;
        self
    }

    /// Search directory tried after the configured ones
    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        self.search_paths.push(path.into());
    }

    pub fn config(&self) -> &CgenConfig {
        &self.config
    }

    /// Load `definition` (with everything it references) and compile it
    pub fn compile(&self, definition: &Path) -> Result<Compilation> {
        let mut loader = Loader::with_search_paths(
            self.config
                .loader
                .search_paths
                .iter()
                .chain(&self.search_paths)
                .cloned(),
        );
        loader.load(definition)?;
        let digest = loader.digest();
        let document = loader.into_document();

        self.compile_document(&definition.display().to_string(), &document, digest)
    }

    /// Compile an already merged document
    pub fn compile_document(
        &self,
        definition: &str,
        document: &Value,
        digest: Checksum,
    ) -> Result<Compilation> {
        if let Some(validator) = &self.validator {
            tracing::info!("validating {}", definition);
            validator.validate(document)?;
        }

        let mut builder = TypeBuilder::new(document);
        let mut types = builder.load_section("types")?;
        let mut elements = builder.load_section("elements")?;
        let mut diagnostics = builder.into_diagnostics();
        tracing::info!(
            "loaded {} type(s) and {} element(s)",
            types.len(),
            elements.len()
        );

        extract_nested_types(&mut types, &mut elements, &mut diagnostics);
        let (mut types, stats) = order_types(types, &mut diagnostics)?;

        let constraints = load_constraints(document, &mut diagnostics);
        let total = constraints.len();
        let bound = bind_constraints(&mut types, &mut elements, constraints, &mut diagnostics);
        tracing::info!("bound {} of {} constraint(s)", bound, total);

        let data = RenderData::build(definition, digest, document, types, elements);
        Ok(Compilation {
            data,
            diagnostics,
            stats,
        })
    }
}
