//! cgen - schema compiler
//!
//! Turns a declarative YAML schema of `types`, `elements` and `constraints`
//! into a dependency-ordered, deduplicated type graph that code generators
//! render from.
//!
//! ## Pipeline
//!
//! ```text
//! schema.yml ──► Loader ──► validate ──► TypeBuilder ──► extract ──► order ──► bind ──► RenderData
//!   (+ files       (merge       (meta-      (types,         (hoist     (deps     (constraints
//!   it refs)      + digest)     schema)     elements)       nested)    first)     to nodes)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use cgen::{CgenConfig, Compiler};
//!
//! let compiler = Compiler::new(CgenConfig::default());
//! let compilation = compiler.compile("schema.yml".as_ref())?;
//! for t in &compilation.data.types {
//!     println!("{}", t.name);
//! }
//! # Ok::<(), cgen::CompileError>(())
//! ```

pub mod checksum;
pub mod codegen;
pub mod compiler;
pub mod config;
pub mod error;
pub mod graph;
pub mod loader;
pub mod model;
pub mod validate;

pub use checksum::{Checksum, SourceDigest};
pub use codegen::{JsonRenderer, RenderData, Renderer};
pub use compiler::{Compilation, Compiler};
pub use config::CgenConfig;
pub use error::{CompileError, Result};
pub use graph::{DiagnosticCode, DiagnosticItem, Diagnostics, Severity};
pub use loader::Loader;
pub use model::{Constraint, Field, Type, TypeKind, TypeTag};
pub use validate::{DocumentValidator, JsonSchemaValidator};
