//! Configuration for the schema compiler
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (cgen.toml)
//! - Environment variables (CGEN__*)
//!
//! ## Example config file (cgen.toml):
//! ```toml
//! [loader]
//! search_paths = ["definition", "../shared/definition"]
//!
//! [validation]
//! enabled = true
//! meta_schema = "definition.schema.json"
//!
//! [output]
//! pretty = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CompileError, Result};

/// Main configuration for the compiler
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CgenConfig {
    /// Where schema files are looked up
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Meta-schema validation
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Handoff writer
    #[serde(default)]
    pub output: OutputConfig,
}

/// Loader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Directories tried, in order, for every schema file
    #[serde(default = "default_search_paths")]
    pub search_paths: Vec<PathBuf>,
}

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Validate the merged document before compiling
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Meta-schema file name (or absolute path)
    #[serde(default = "default_meta_schema")]
    pub meta_schema: PathBuf,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Pretty-print the JSON handoff
    #[serde(default = "default_true")]
    pub pretty: bool,
}

// Default value functions
fn default_search_paths() -> Vec<PathBuf> {
    vec![PathBuf::from("definition")]
}

fn default_true() -> bool {
    true
}

fn default_meta_schema() -> PathBuf {
    PathBuf::from("definition.schema.json")
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            search_paths: default_search_paths(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            meta_schema: default_meta_schema(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("dev", "cgen", "cgen")
}

impl CgenConfig {
    /// Load configuration from default locations
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, with `config_path` layered over the defaults
    pub fn load_from(config_path: Option<&Path>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        for location in ["cgen.toml", ".cgen.toml", "config/cgen.toml"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = project_dirs() {
            let xdg_config = dirs.config_dir().join("cgen.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // CGEN__VALIDATION__ENABLED=false
        builder = builder.add_source(
            Environment::with_prefix("CGEN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Places the meta-schema is looked for, in order
    pub fn meta_schema_candidates(&self) -> Vec<PathBuf> {
        let name = &self.validation.meta_schema;
        if name.is_absolute() {
            return vec![name.clone()];
        }

        let mut candidates = vec![name.clone(), Path::new("schema").join(name)];
        if let Some(dirs) = project_dirs() {
            candidates.push(dirs.config_dir().join("schema").join(name));
        }
        candidates
    }

    /// Resolve the meta-schema file
    pub fn meta_schema_path(&self) -> Result<PathBuf> {
        let candidates = self.meta_schema_candidates();
        match candidates.iter().find(|c| c.is_file()) {
            Some(found) => Ok(found.clone()),
            None => Err(CompileError::FileNotFound {
                path: self.validation.meta_schema.clone(),
                searched: candidates,
            }),
        }
    }
}
