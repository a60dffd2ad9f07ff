//! Constraint Binder
//!
//! The last segment of a constraint's scope names either an element (by
//! name or alias) or a field of some object type. Elements win; a field
//! match binds to the object that owns the field.

use crate::model::{Constraint, Type};

use super::Diagnostics;

/// Attach each constraint to the node its scope names.
///
/// Constraints whose scope matches nothing are dropped with an
/// [`UnresolvedConstraintScope`](super::DiagnosticCode::UnresolvedConstraintScope)
/// diagnostic. Returns how many were bound.
pub fn bind_constraints(
    types: &mut [Type],
    elements: &mut [Type],
    constraints: Vec<Constraint>,
    diagnostics: &mut Diagnostics,
) -> usize {
    let mut bound = 0;

    for constraint in constraints {
        let name = constraint.scope_name().to_string();

        if let Some(element) = elements
            .iter_mut()
            .find(|e| e.name == name || e.alias == name)
        {
            tracing::debug!("constraint {} bound to element {}", constraint.id(), element.alias);
            element.constraints.push(constraint);
            bound += 1;
            continue;
        }

        let owner = types.iter_mut().find(|t| {
            t.as_object()
                .map_or(false, |o| o.fields.iter().any(|f| f.name == name))
        });
        match owner {
            Some(owner) => {
                tracing::debug!("constraint {} bound to type {}", constraint.id(), owner.name);
                owner.constraints.push(constraint);
                bound += 1;
            }
            None => diagnostics.unresolved_scope(constraint.id(), constraint.scope()),
        }
    }

    bound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_support::*;
    use crate::graph::DiagnosticCode;

    fn unique(id: &str, scope: &str, field: &str) -> Constraint {
        Constraint::Unique {
            id: id.into(),
            scope: scope.into(),
            field: field.into(),
        }
    }

    #[test]
    fn test_binds_to_element_by_alias() {
        let point = object("Point", vec![("x", int("x"))]);
        let mut types = vec![point.clone()];
        let mut elements = vec![reference(&point, "origin")];
        let mut diags = Diagnostics::new();

        let n = bind_constraints(
            &mut types,
            &mut elements,
            vec![unique("u1", "/elements/origin", "x")],
            &mut diags,
        );

        assert_eq!(n, 1);
        assert_eq!(elements[0].constraints.len(), 1);
        assert_eq!(elements[0].constraints[0].field(), "x");
        assert!(types[0].constraints.is_empty());
    }

    #[test]
    fn test_element_wins_over_field() {
        let hosts = array("hosts", string("items"));
        let mut types = vec![object("Cluster", vec![("hosts", hosts.clone())])];
        let mut elements = vec![hosts];
        let mut diags = Diagnostics::new();

        bind_constraints(
            &mut types,
            &mut elements,
            vec![unique("u1", "/elements/hosts", "name")],
            &mut diags,
        );

        assert_eq!(elements[0].constraints.len(), 1);
        assert!(types[0].constraints.is_empty());
    }

    #[test]
    fn test_field_match_binds_to_owner() {
        let mut types = vec![
            int("Port"),
            object("Cluster", vec![("nodes", array("nodes", string("items")))]),
        ];
        let mut diags = Diagnostics::new();

        let keyref = Constraint::KeyRef {
            id: "k1".into(),
            scope: "/types/Cluster/nodes".into(),
            refer: "u1".into(),
            field: "host".into(),
        };
        bind_constraints(&mut types, &mut [], vec![keyref], &mut diags);

        assert_eq!(types[1].constraints.len(), 1);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_unresolved_scope_is_reported() {
        let mut elements = vec![int("port")];
        let mut diags = Diagnostics::new();

        let n = bind_constraints(
            &mut [],
            &mut elements,
            vec![unique("u9", "/elements/doesnotexist", "x")],
            &mut diags,
        );

        assert_eq!(n, 0);
        assert!(elements[0].constraints.is_empty());
        let items: Vec<_> = diags.with_code(DiagnosticCode::UnresolvedConstraintScope).collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].subject, "u9");
    }
}
