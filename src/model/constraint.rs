//! Identity and referential constraints

use serde::Serialize;
use serde_json::Value;

use crate::graph::Diagnostics;

/// A constraint declared in the `constraints` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Constraint {
    /// `field` is unique among the siblings inside `scope`
    Unique {
        id: String,
        scope: String,
        field: String,
    },
    /// `field` must hold a value produced by the unique constraint `refer`
    KeyRef {
        id: String,
        scope: String,
        refer: String,
        field: String,
    },
}

impl Constraint {
    pub fn id(&self) -> &str {
        match self {
            Self::Unique { id, .. } | Self::KeyRef { id, .. } => id,
        }
    }

    pub fn scope(&self) -> &str {
        match self {
            Self::Unique { scope, .. } | Self::KeyRef { scope, .. } => scope,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::Unique { field, .. } | Self::KeyRef { field, .. } => field,
        }
    }

    /// Last segment of the scope path: the element or field bound to
    pub fn scope_name(&self) -> &str {
        let scope = self.scope().trim_end_matches('/');
        scope.rsplit('/').next().unwrap_or(scope)
    }

    /// Parse one entry. `Err` carries the reason it was rejected.
    pub fn from_entry(entry: &Value) -> Result<Self, String> {
        let map = entry
            .as_object()
            .ok_or_else(|| "constraint must be a mapping".to_string())?;

        let text = |key: &str| -> Result<String, String> {
            match map.get(key) {
                Some(Value::String(s)) => Ok(s.clone()),
                Some(Value::Number(n)) => Ok(n.to_string()),
                Some(_) => Err(format!("key \"{}\" must be a string", key)),
                None => Err(format!("missing key \"{}\"", key)),
            }
        };

        if map.contains_key("unique") {
            Ok(Self::Unique {
                id: text("id")?,
                scope: text("scope")?,
                field: text("field")?,
            })
        } else if map.contains_key("keyref") {
            Ok(Self::KeyRef {
                id: text("id")?,
                scope: text("scope")?,
                refer: text("refer")?,
                field: text("field")?,
            })
        } else {
            Err("neither \"unique\" nor \"keyref\" is set".to_string())
        }
    }
}

/// Load the `constraints` section.
///
/// Bad entries are skipped with a [`MalformedConstraint`] diagnostic; a
/// missing section yields no constraints.
///
/// [`MalformedConstraint`]: crate::graph::DiagnosticCode::MalformedConstraint
pub fn load_constraints(document: &Value, diagnostics: &mut Diagnostics) -> Vec<Constraint> {
    let entries = match document.get("constraints") {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            diagnostics.malformed_constraint("constraints", "section must be a sequence");
            return Vec::new();
        }
    };

    let mut constraints = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match Constraint::from_entry(entry) {
            Ok(c) => constraints.push(c),
            Err(reason) => {
                let id = entry
                    .get("id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("#{}", index));
                diagnostics.malformed_constraint(&id, reason);
            }
        }
    }

    tracing::debug!("loaded {} constraint(s)", constraints.len());
    constraints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DiagnosticCode;
    use serde_json::json;

    #[test]
    fn test_load_both_kinds() {
        let doc = json!({
            "constraints": [
                {"unique": true, "id": "u1", "scope": "/elements/hosts", "field": "name"},
                {"keyref": true, "id": "k1", "scope": "/elements/routes", "refer": "u1", "field": "host"}
            ]
        });
        let mut diags = Diagnostics::new();
        let constraints = load_constraints(&doc, &mut diags);

        assert!(diags.is_empty());
        assert_eq!(constraints.len(), 2);
        assert_eq!(constraints[0].scope_name(), "hosts");
        assert!(matches!(&constraints[1], Constraint::KeyRef { refer, .. } if refer == "u1"));
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let doc = json!({
            "constraints": [
                {"keyref": true, "id": "k1", "scope": "/elements/routes", "field": "host"},
                {"id": "x", "scope": "/elements/routes", "field": "host"},
                {"unique": true, "id": "u2", "scope": "/elements/hosts", "field": "name"}
            ]
        });
        let mut diags = Diagnostics::new();
        let constraints = load_constraints(&doc, &mut diags);

        assert_eq!(constraints.len(), 1);
        assert_eq!(constraints[0].id(), "u2");
        assert_eq!(diags.with_code(DiagnosticCode::MalformedConstraint).count(), 2);
    }

    #[test]
    fn test_missing_section() {
        let mut diags = Diagnostics::new();
        assert!(load_constraints(&json!({"types": {}}), &mut diags).is_empty());
        assert!(diags.is_empty());
    }

    #[test]
    fn test_scope_name_of_single_segment() {
        let c = Constraint::Unique {
            id: "u".into(),
            scope: "hosts".into(),
            field: "name".into(),
        };
        assert_eq!(c.scope_name(), "hosts");
    }
}
