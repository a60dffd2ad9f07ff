//! Documentation index
//!
//! A flat list of `{path, description, required, default}` entries built by
//! walking the synthesized `config` object depth first, grouped into
//! sections for renderers that emit reference documentation.
//!
//! Paths: an object field descends as `<root>/<field>`; a field with no
//! structure of its own is a leaf `<root>/@<field>`. An array or dictionary
//! whose item (value) has no structure becomes one leaf named after the
//! container.

use serde::Serialize;
use serde_json::Value;

use crate::model::{Field, Type, TypeKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocEntry {
    pub path: String,
    pub description: String,
    pub required: bool,
    pub default: Option<Value>,
}

/// Entries sharing a section key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocSection {
    pub name: String,
    pub entries: Vec<DocEntry>,
}

/// Sections in order of first appearance
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocIndex {
    pub sections: Vec<DocSection>,
}

impl DocIndex {
    /// Group entries by their second path segment (the first when there is
    /// only one)
    pub fn from_entries(entries: Vec<DocEntry>) -> Self {
        let mut index = Self::default();
        for entry in entries {
            let mut segments = entry.path.split('/');
            let first = segments.next().unwrap_or_default();
            let key = segments.next().unwrap_or(first).to_string();

            match index.sections.iter_mut().find(|s| s.name == key) {
                Some(section) => section.entries.push(entry),
                None => index.sections.push(DocSection {
                    name: key,
                    entries: vec![entry],
                }),
            }
        }
        index
    }

    pub fn section(&self, name: &str) -> Option<&DocSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn entry_count(&self) -> usize {
        self.sections.iter().map(|s| s.entries.len()).sum()
    }
}

/// Doc entries for `t` rooted at `root`
pub fn document(t: &Type, root: &str) -> Vec<DocEntry> {
    let mut out = Vec::new();
    walk(t, root, &mut out);
    out
}

/// Returns false, emitting nothing, for types without inner structure
fn walk(t: &Type, root: &str, out: &mut Vec<DocEntry>) -> bool {
    match &t.kind {
        TypeKind::Object(o) => {
            for field in &o.fields {
                walk_field(field, root, out);
            }
            true
        }
        TypeKind::Array(a) => {
            if !walk(&a.item_type, root, out) {
                out.push(leaf(
                    root,
                    &t.alias,
                    &t.description,
                    a.min_items.unwrap_or(0) > 0,
                    a.item_type.default_value(),
                ));
            }
            true
        }
        TypeKind::Dictionary(d) => {
            if !walk(&d.value_type, root, out) {
                out.push(leaf(
                    root,
                    &t.alias,
                    &t.description,
                    false,
                    d.value_type.default_value(),
                ));
            }
            true
        }
        _ => false,
    }
}

fn walk_field(field: &Field, root: &str, out: &mut Vec<DocEntry>) {
    let path = format!("{}/{}", root, field.name);
    if !walk(&field.ty, &path, out) {
        out.push(leaf(
            root,
            &field.name,
            &field.description,
            field.required,
            field.ty.default_value(),
        ));
    }
}

fn leaf(root: &str, name: &str, description: &str, required: bool, default: Option<Value>) -> DocEntry {
    DocEntry {
        path: format!("{}/@{}", root, name),
        description: description.to_string(),
        required,
        default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_support::*;
    use serde_json::json;

    fn with_description(mut t: Type, description: &str) -> Type {
        t.description = description.to_string();
        t
    }

    #[test]
    fn test_object_paths() {
        let server = object(
            "Server",
            vec![("host", string("host")), ("port", int("port"))],
        );
        let config = object("config", vec![("server", server), ("debug", int("debug"))]);

        let paths: Vec<_> = document(&config, "config").into_iter().map(|e| e.path).collect();
        assert_eq!(
            paths,
            vec!["config/server/@host", "config/server/@port", "config/@debug"]
        );
    }

    #[test]
    fn test_scalar_array_leaf_uses_container_alias() {
        let mut tags = array("string_array", string("items"));
        tags.alias = "tags".to_string();
        let tags = with_description(tags, "labels");
        let config = object("config", vec![("tags", tags)]);

        let entries = document(&config, "config");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "config/tags/@tags");
        assert_eq!(entries[0].description, "labels");
        assert!(!entries[0].required);
    }

    #[test]
    fn test_object_array_descends_into_item() {
        let host = object("Host", vec![("name", string("name"))]);
        let config = object("config", vec![("hosts", array("Host_array", host))]);

        let entries = document(&config, "config");
        assert_eq!(entries[0].path, "config/hosts/@name");
    }

    #[test]
    fn test_sections_in_first_appearance_order() {
        let entry = |path: &str| DocEntry {
            path: path.to_string(),
            description: String::new(),
            required: false,
            default: Some(json!(1)),
        };
        let index = DocIndex::from_entries(vec![
            entry("config/server/@host"),
            entry("config/@debug"),
            entry("config/server/@port"),
            entry("lonely"),
        ]);

        let names: Vec<_> = index.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["server", "@debug", "lonely"]);
        assert_eq!(index.section("server").unwrap().entries.len(), 2);
        assert_eq!(index.entry_count(), 4);
    }
}
