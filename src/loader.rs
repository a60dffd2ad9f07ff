//! Reference Loader
//!
//! Reads the root schema document and every file it `$ref`s, merging them
//! into one document. File references are rewritten to local ones
//! (`other.yml#/types/Point` becomes `#/types/Point`) so type resolution
//! never has to know which file a definition came from.
//!
//! Documents are YAML; JSON is accepted as the subset it is.

use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::checksum::{Checksum, SourceDigest};
use crate::error::{CompileError, Result};

/// Loads and merges schema files
pub struct Loader {
    /// Directories tried, in order, after the path itself
    search_paths: Vec<PathBuf>,

    /// Files already merged (resolved paths)
    loaded: HashSet<PathBuf>,

    /// Merge of everything loaded so far
    document: Value,

    digest: SourceDigest,

    /// `<file>#<pointer>`
    reference: Regex,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    pub fn new() -> Self {
        Self {
            search_paths: Vec::new(),
            loaded: HashSet::new(),
            document: Value::Object(Map::new()),
            digest: SourceDigest::new(),
            reference: Regex::new(r"^([^#]*)#(.*)$").expect("reference pattern is valid"),
        }
    }

    pub fn with_search_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut loader = Self::new();
        loader.search_paths = paths.into_iter().map(Into::into).collect();
        loader
    }

    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        self.search_paths.push(path.into());
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Load `path` (and everything it references) into the document
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<&Value> {
        let path = path.as_ref();
        tracing::info!("loading schema {}", path.display());
        self.load_file(path, None)?;
        tracing::debug!(
            "merged {} file(s) into the schema document",
            self.loaded.len()
        );
        Ok(&self.document)
    }

    /// The merged document
    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn into_document(self) -> Value {
        self.document
    }

    /// Digest over the raw bytes of every file read, in load order
    pub fn digest(&self) -> Checksum {
        self.digest.finish()
    }

    /// Resolved paths of every file merged so far
    pub fn loaded_files(&self) -> impl Iterator<Item = &Path> {
        self.loaded.iter().map(PathBuf::as_path)
    }

    /// Split a `$ref` into its file and pointer parts.
    ///
    /// Only local (`#/a/b`) and relative file (`file.yml#/a/b`) references
    /// are supported.
    pub fn split_reference<'r>(&self, reference: &'r str) -> Result<(&'r str, &'r str)> {
        let unsupported = || CompileError::UnsupportedReference {
            reference: reference.to_string(),
        };

        let caps = self.reference.captures(reference).ok_or_else(unsupported)?;
        let (Some(file), Some(pointer)) = (caps.get(1), caps.get(2)) else {
            return Err(unsupported());
        };
        if file.as_str().contains("://") {
            return Err(unsupported());
        }
        Ok((file.as_str(), pointer.as_str()))
    }

    /// Deep-merge `source` over `destination`.
    ///
    /// Mappings merge key by key; any other value from `source` replaces
    /// what was there. Keys keep their first position.
    pub fn merge(source: Value, destination: Value) -> Value {
        match (source, destination) {
            (Value::Object(source), Value::Object(mut destination)) => {
                for (key, value) in source {
                    match destination.get_mut(&key) {
                        Some(slot) if value.is_object() => {
                            let current = slot.take();
                            *slot = Self::merge(value, current);
                        }
                        _ => {
                            destination.insert(key, value);
                        }
                    }
                }
                Value::Object(destination)
            }
            (source, _) => source,
        }
    }

    fn load_file(&mut self, file: &Path, referrer: Option<&Path>) -> Result<()> {
        let path = self.locate(file, referrer)?;
        let key = path.canonicalize().unwrap_or_else(|_| path.clone());
        if !self.loaded.insert(key) {
            tracing::debug!("{} already loaded", path.display());
            return Ok(());
        }

        tracing::debug!("reading {}", path.display());
        let raw = std::fs::read(&path)?;
        self.digest.update(&raw);

        let mut data: Value = serde_yaml::from_slice(&raw)?;
        match data {
            Value::Object(_) => {}
            Value::Null => data = Value::Object(Map::new()),
            _ => {
                return Err(CompileError::InvalidSection {
                    section: format!("{} (document root)", path.display()),
                })
            }
        }

        self.load_references(&mut data, &path)?;

        let document = std::mem::take(&mut self.document);
        self.document = Self::merge(data, document);
        Ok(())
    }

    /// Load every file `data` references, rewriting its `$ref`s to local form
    fn load_references(&mut self, data: &mut Value, from: &Path) -> Result<()> {
        match data {
            Value::Object(map) => {
                for (key, value) in map.iter_mut() {
                    if key == "$ref" {
                        if let Value::String(reference) = value {
                            if let Some(local) = self.load_reference(reference, from)? {
                                *reference = local;
                            }
                        }
                        continue;
                    }
                    self.load_references(value, from)?;
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.load_references(item, from)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Returns the local form when `reference` pointed into another file
    fn load_reference(&mut self, reference: &str, from: &Path) -> Result<Option<String>> {
        let (file, pointer) = self.split_reference(reference)?;
        if file.is_empty() {
            return Ok(None);
        }

        let local = format!("#{}", pointer);
        let file = PathBuf::from(file);
        self.load_file(&file, Some(from))?;
        Ok(Some(local))
    }

    /// First readable candidate: the path itself, each search path joined
    /// with it, then the referring file's directory.
    fn locate(&self, file: &Path, referrer: Option<&Path>) -> Result<PathBuf> {
        let mut candidates = vec![file.to_path_buf()];
        candidates.extend(self.search_paths.iter().map(|dir| dir.join(file)));
        if let Some(dir) = referrer.and_then(Path::parent) {
            candidates.push(dir.join(file));
        }

        match candidates.iter().find(|c| c.is_file()) {
            Some(found) => Ok(found.clone()),
            None => Err(CompileError::FileNotFound {
                path: file.to_path_buf(),
                searched: candidates,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_merge_into_empty_is_identity() {
        let doc = json!({"types": {"a": {"type": "int"}}, "elements": {"b": {"$ref": "#/types/a"}}});
        assert_eq!(Loader::merge(doc.clone(), json!({})), doc);
        assert_eq!(Loader::merge(doc.clone(), doc.clone()), doc);
    }

    #[test]
    fn test_merge_nested_and_overwrite() {
        let destination = json!({"types": {"a": {"type": "int", "min": 0}}, "info": "old"});
        let source = json!({"types": {"a": {"min": 1}, "b": {"type": "bool"}}, "info": {"name": "new"}});
        let merged = Loader::merge(source, destination);

        assert_eq!(
            merged,
            json!({
                "types": {"a": {"type": "int", "min": 1}, "b": {"type": "bool"}},
                "info": {"name": "new"}
            })
        );
        let keys: Vec<_> = merged["types"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_split_reference() {
        let loader = Loader::new();
        assert_eq!(loader.split_reference("#/types/a").unwrap(), ("", "/types/a"));
        assert_eq!(
            loader.split_reference("common.yml#/types/a").unwrap(),
            ("common.yml", "/types/a")
        );
        assert!(matches!(
            loader.split_reference("https://example.com/s.yml#/types/a"),
            Err(CompileError::UnsupportedReference { .. })
        ));
        assert!(matches!(
            loader.split_reference("types/a"),
            Err(CompileError::UnsupportedReference { .. })
        ));
    }

    #[test]
    fn test_file_reference_is_merged_and_rewritten() {
        let dir = TempDir::new().unwrap();
        write(&dir, "common.yml", "types:\n  Port:\n    type: uint\n    max: 65535\n");
        let root = write(
            &dir,
            "main.yml",
            "elements:\n  port:\n    $ref: common.yml#/types/Port\n  backup:\n    $ref: common.yml#/types/Port\n",
        );

        let mut loader = Loader::new();
        let doc = loader.load(&root).unwrap().clone();

        assert_eq!(doc["elements"]["port"]["$ref"], json!("#/types/Port"));
        assert_eq!(doc["elements"]["backup"]["$ref"], json!("#/types/Port"));
        assert_eq!(doc["types"]["Port"]["max"], json!(65535));
        assert_eq!(loader.loaded_files().count(), 2);
    }

    #[test]
    fn test_search_paths_in_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write(&first, "schema.yml", "info:\n  from: first\n");
        write(&second, "schema.yml", "info:\n  from: second\n");

        let mut loader = Loader::with_search_paths([first.path(), second.path()]);
        let doc = loader.load("schema.yml").unwrap();
        assert_eq!(doc["info"]["from"], json!("first"));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut loader = Loader::with_search_paths([dir.path()]);
        match loader.load("missing.yml") {
            Err(CompileError::FileNotFound { path, searched }) => {
                assert_eq!(path, PathBuf::from("missing.yml"));
                assert_eq!(searched.len(), 2);
            }
            other => panic!("expected FileNotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_mutual_file_references_terminate() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.yml", "types:\n  A:\n    type: object\n    properties:\n      b:\n        $ref: b.yml#/types/B\n");
        write(&dir, "b.yml", "types:\n  B:\n    type: object\n    properties:\n      name:\n        $ref: a.yml#/types/Name\n  \n");
        let root = write(&dir, "root.yml", "types:\n  Name:\n    type: string\nelements:\n  a:\n    $ref: a.yml#/types/A\n");

        let mut loader = Loader::new();
        let doc = loader.load(&root).unwrap();
        assert!(doc["types"].get("A").is_some());
        assert!(doc["types"].get("B").is_some());
        assert!(doc["types"].get("Name").is_some());
    }

    #[test]
    fn test_digest_changes_with_content() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "s.yml", "types: {}\n");
        let mut first = Loader::new();
        first.load(&path).unwrap();

        write(&dir, "s.yml", "types: {a: {type: int}}\n");
        let mut second = Loader::new();
        second.load(&path).unwrap();

        assert_ne!(first.digest(), second.digest());
    }
}
