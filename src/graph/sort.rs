//! Type Sorter
//!
//! Orders the flat type list so every type comes after the types it
//! depends on. Three steps, run by [`order_types`]:
//!
//! 1. [`sort_types`]: destructive drain of the pool, emitting each type's
//!    dependencies (recursively) before the type itself
//! 2. [`filter_types`]: keep the first type of each name
//! 3. [`reorder_types`]: repeat full scans, moving any dependency found after
//!    its dependent to just before it, until a scan moves nothing
//!
//! Dependency cycles are rejected (via [`TypeGraph`]) before step 3, so the
//! fixpoint always terminates.

use std::collections::HashSet;

use serde::Serialize;

use super::{Diagnostics, TypeGraph};
use crate::error::{CompileError, Result};
use crate::model::Type;

/// Work done by the reorder pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReorderStats {
    /// Full scans over the list, including the final one that moved nothing
    pub scans: usize,
    /// Types moved
    pub moves: usize,
}

/// Sort, dedup, check for cycles and reorder
pub fn order_types(
    types: Vec<Type>,
    diagnostics: &mut Diagnostics,
) -> Result<(Vec<Type>, ReorderStats)> {
    let sorted = filter_types(sort_types(types));

    let graph = TypeGraph::build(&sorted);
    if let Some(members) = graph.cycles().into_iter().next() {
        tracing::error!("dependency cycle between {}", members.join(", "));
        return Err(CompileError::CyclicDependency { members });
    }

    let (ordered, stats) = reorder_types(sorted, diagnostics)?;
    tracing::debug!(
        "ordered {} type(s): {} scan(s), {} move(s)",
        ordered.len(),
        stats.scans,
        stats.moves
    );
    Ok((ordered, stats))
}

/// Dependency-first order, emitting every name once.
///
/// When several pool entries share a name the first non-reference one wins.
pub fn sort_types(types: Vec<Type>) -> Vec<Type> {
    let mut pool = types;
    let mut sorted = Vec::with_capacity(pool.len());

    while let Some(current) = pool.first().cloned() {
        emit(&mut pool, &current, &mut sorted);
    }

    sorted
}

fn emit(pool: &mut Vec<Type>, node: &Type, sorted: &mut Vec<Type>) {
    for dep in node.dependencies() {
        emit(pool, dep, sorted);
    }
    take(pool, node, sorted);
}

/// Move the entry named like `node` from the pool to the output
fn take(pool: &mut Vec<Type>, node: &Type, sorted: &mut Vec<Type>) {
    let mut matches = Vec::new();
    let mut i = 0;
    while i < pool.len() {
        if pool[i].name == node.name {
            matches.push(pool.remove(i));
        } else {
            i += 1;
        }
    }

    if matches.is_empty() {
        return;
    }

    let chosen = match matches.iter().position(|t| !t.is_ref) {
        Some(pos) => matches.swap_remove(pos),
        None if !node.is_ref => node.clone(),
        None => matches.swap_remove(0),
    };
    sorted.push(chosen);
}

/// Keep the first type of each name
pub fn filter_types(types: Vec<Type>) -> Vec<Type> {
    let mut seen = HashSet::new();
    types
        .into_iter()
        .filter(|t| seen.insert(t.name.clone()))
        .collect()
}

/// Fixpoint pass: move dependencies in front of their dependents.
///
/// Every move is reported as a
/// [`TypeRelocated`](super::DiagnosticCode::TypeRelocated) diagnostic.
pub fn reorder_types(
    types: Vec<Type>,
    diagnostics: &mut Diagnostics,
) -> Result<(Vec<Type>, ReorderStats)> {
    let edges: Vec<(String, String)> = types
        .iter()
        .flat_map(|t| {
            t.dependencies()
                .into_iter()
                .map(move |d| (t.name.clone(), d.name.clone()))
        })
        .collect();

    let limit = types.len() * types.len() + 1;
    let mut result = types;
    let mut stats = ReorderStats::default();

    loop {
        stats.scans += 1;
        let mut moves = 0;

        for (dependent, dependency) in &edges {
            let (Some(a), Some(b)) = (position(&result, dependent), position(&result, dependency))
            else {
                continue;
            };
            if b <= a {
                continue;
            }

            tracing::debug!("moving {} from {} to {}", dependency, b, a);
            diagnostics.relocated(dependency, b, a);
            let moved = result.remove(b);
            result.insert(a, moved);
            moves += 1;
        }

        stats.moves += moves;
        if moves == 0 {
            return Ok((result, stats));
        }
        if stats.scans > limit {
            let mut members: Vec<String> = edges
                .iter()
                .flat_map(|(a, b)| [a.clone(), b.clone()])
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();
            members.sort();
            return Err(CompileError::CyclicDependency { members });
        }
    }
}

fn position(types: &[Type], name: &str) -> Option<usize> {
    types.iter().position(|t| t.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_support::*;
    use crate::graph::DiagnosticCode;

    fn names(types: &[Type]) -> Vec<&str> {
        types.iter().map(|t| t.name.as_str()).collect()
    }

    /// Every named child sits strictly before its parent
    fn assert_dependency_first(types: &[Type]) {
        for (i, t) in types.iter().enumerate() {
            for dep in t.dependencies() {
                if let Some(j) = position(types, &dep.name) {
                    assert!(j < i, "{} at {} must precede {} at {}", dep.name, j, t.name, i);
                }
            }
        }
    }

    #[test]
    fn test_dependencies_are_emitted_first() {
        let point = object("Point", vec![("x", int("x"))]);
        let points = array("Point_array", reference(&point, "items"));
        let shape = object("Shape", vec![("points", points.clone())]);

        let sorted = sort_types(vec![shape, points, point]);

        assert_eq!(names(&sorted), vec!["Point", "Point_array", "Shape"]);
        assert_dependency_first(&sorted);
    }

    #[test]
    fn test_non_reference_instance_wins() {
        let point = object("Point", vec![("x", int("x"))]);
        let alias = reference(&point, "Alias");

        let sorted = sort_types(vec![alias, point]);

        assert_eq!(sorted.len(), 1);
        assert!(!sorted[0].is_ref);
    }

    #[test]
    fn test_filter_keeps_first() {
        let mut second = int("n");
        second.description = "second".into();
        let filtered = filter_types(vec![int("n"), second, int("m")]);
        assert_eq!(names(&filtered), vec!["n", "m"]);
        assert_eq!(filtered[0].description, "");
    }

    #[test]
    fn test_reorder_moves_dependency_in_front() {
        let point = object("Point", vec![("x", int("x"))]);
        let line = object("Line", vec![("a", reference(&point, "a"))]);
        let mut diags = Diagnostics::new();

        let (ordered, stats) = reorder_types(vec![int("other"), line, point], &mut diags).unwrap();

        assert_eq!(names(&ordered), vec!["other", "Point", "Line"]);
        assert_eq!(stats, ReorderStats { scans: 2, moves: 1 });
        assert_eq!(diags.with_code(DiagnosticCode::TypeRelocated).count(), 1);
    }

    #[test]
    fn test_reorder_of_sorted_list_is_single_scan() {
        let point = object("Point", vec![("x", int("x"))]);
        let line = object("Line", vec![("a", reference(&point, "a"))]);
        let mut diags = Diagnostics::new();

        let (_, stats) = reorder_types(vec![point, line], &mut diags).unwrap();
        assert_eq!(stats, ReorderStats { scans: 1, moves: 0 });
        assert!(diags.is_empty());
    }

    #[test]
    fn test_order_types_rejects_cycles() {
        let a_stub = object("A", vec![]);
        let b = object("B", vec![("a", reference(&a_stub, "a"))]);
        let a = object("A", vec![("b", reference(&b, "b"))]);
        let mut diags = Diagnostics::new();

        match order_types(vec![a, b], &mut diags) {
            Err(CompileError::CyclicDependency { members }) => assert_eq!(members, vec!["A", "B"]),
            other => panic!("expected cycle, got {:?}", other.map(|(t, _)| t.len())),
        }
    }

    #[test]
    fn test_diamond() {
        let leaf = object("Leaf", vec![("v", int("v"))]);
        let left = object("Left", vec![("leaf", reference(&leaf, "leaf"))]);
        let right = object("Right", vec![("leaf", reference(&leaf, "leaf"))]);
        let top = object(
            "Top",
            vec![("l", reference(&left, "l")), ("r", reference(&right, "r"))],
        );
        let mut diags = Diagnostics::new();

        let (ordered, _) = order_types(vec![top, right, left, leaf], &mut diags).unwrap();

        assert_eq!(ordered.len(), 4);
        assert_eq!(ordered.last().unwrap().name, "Top");
        assert_dependency_first(&ordered);
    }
}
