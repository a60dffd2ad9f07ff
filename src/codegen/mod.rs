//! Render Handoff
//!
//! Everything a renderer gets to see about a compiled schema, frozen into
//! [`RenderData`]. Renderers implement [`Renderer`] and never read the raw
//! schema document; the naming helpers they need live in [`names`].
//!
//! The handoff carries:
//! - the ordered, deduplicated `types` and the loaded `elements`
//! - a synthesized `config` object with one field per element
//! - which names are element-only and the union of all names
//! - a documentation index over `config`

pub mod docs;
pub mod names;

pub use docs::{DocEntry, DocIndex, DocSection};

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::checksum::Checksum;
use crate::error::Result;
use crate::model::{Field, ObjectType, Type, TypeKind, TypeTag};

/// Name of the synthesized wrapper object
pub const CONFIG_TYPE_NAME: &str = "config";

// =============================================================================
// RenderData
// =============================================================================

/// Compiled schema, as handed to renderers
#[derive(Debug, Clone, Serialize)]
pub struct RenderData {
    /// Path of the root schema file
    pub definition: String,

    /// Digest over every source file read
    pub digest: Checksum,

    /// `info` section, verbatim (`{}` when absent)
    pub info: Value,

    /// `options` section, verbatim (`{}` when absent)
    pub options: Value,

    /// Dependency-first, one per name
    pub types: Vec<Type>,

    pub elements: Vec<Type>,

    /// Object with one field per element, named by the element's alias
    pub config: Type,

    /// Element names that are not also type names, sorted
    pub unique_elements: Vec<String>,

    /// Type names and element names, sorted
    pub unique_types: Vec<String>,

    pub docs: DocIndex,
}

impl RenderData {
    pub fn build(
        definition: impl Into<String>,
        digest: Checksum,
        document: &Value,
        types: Vec<Type>,
        elements: Vec<Type>,
    ) -> Self {
        let config = config_type(&elements);

        let type_names: BTreeSet<&str> = types.iter().map(|t| t.name.as_str()).collect();
        let element_names: BTreeSet<&str> = elements.iter().map(|e| e.alias.as_str()).collect();

        let unique_elements = element_names
            .difference(&type_names)
            .map(|s| s.to_string())
            .collect();
        let unique_types = type_names
            .union(&element_names)
            .map(|s| s.to_string())
            .collect();

        let docs = DocIndex::from_entries(docs::document(&config, CONFIG_TYPE_NAME));

        Self {
            definition: definition.into(),
            digest,
            info: section_or_empty(document, "info"),
            options: section_or_empty(document, "options"),
            types,
            elements,
            config,
            unique_elements,
            unique_types,
            docs,
        }
    }

    /// `options.output_prefix`, prepended to every output file name
    pub fn output_prefix(&self) -> &str {
        self.options
            .get("output_prefix")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    pub fn type_named(&self, name: &str) -> Option<&Type> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn element(&self, alias: &str) -> Option<&Type> {
        self.elements.iter().find(|e| e.alias == alias)
    }
}

fn section_or_empty(document: &Value, key: &str) -> Value {
    match document.get(key) {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(v) => v.clone(),
    }
}

/// The wrapper object exposing every element as a field
pub fn config_type(elements: &[Type]) -> Type {
    let fields = elements
        .iter()
        .map(|e| Field {
            name: e.alias.clone(),
            ty: e.clone(),
            description: e.description.clone(),
            required: e.required,
            default: e.default_value(),
        })
        .collect();

    let mut config = Type::new(
        CONFIG_TYPE_NAME,
        TypeTag::Object,
        TypeKind::Object(ObjectType {
            fields,
            default: None,
        }),
    );
    config.description = "Configuration".to_string();
    config
}

// =============================================================================
// Renderers
// =============================================================================

/// A backend turning [`RenderData`] into files
pub trait Renderer {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Write output under `output_dir`, returning the files written
    fn render(&self, data: &RenderData, output_dir: &Path) -> Result<Vec<PathBuf>>;
}

/// Writes the handoff itself as JSON, for renderers living out of process
#[derive(Debug, Clone)]
pub struct JsonRenderer {
    pretty: bool,
}

impl JsonRenderer {
    pub const FILE_NAME: &'static str = "cgen.json";

    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    pub fn file_name(&self, data: &RenderData) -> String {
        format!("{}{}", data.output_prefix(), Self::FILE_NAME)
    }

    pub fn to_json(&self, data: &RenderData) -> Result<String> {
        let text = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(text)
    }
}

impl Default for JsonRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Renderer for JsonRenderer {
    fn name(&self) -> &str {
        "json"
    }

    fn render(&self, data: &RenderData, output_dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(output_dir)?;
        let path = output_dir.join(self.file_name(data));
        std::fs::write(&path, self.to_json(data)?)?;
        tracing::info!("wrote {}", path.display());
        Ok(vec![path])
    }
}
