//! Type Graph
//!
//! The passes that turn freshly loaded types into the ordered list renderers
//! consume:
//!
//! - [`extract`]: hoist nested composites into named top-level types
//! - [`sort`]: dependency-first order, dedup by name, fixpoint reorder
//! - [`bind`]: attach constraints to the nodes their scope names
//!
//! [`TypeGraph`] is the name-level dependency graph (petgraph) the sorter
//! uses to reject cycles before reordering.

pub mod bind;
pub mod diagnostics;
pub mod extract;
pub mod sort;

pub use bind::bind_constraints;
pub use diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics, Severity};
pub use extract::{extract_nested_types, ExtractionPlan, Hoisted, PathSegment, Rename, Root};
pub use sort::{filter_types, order_types, reorder_types, sort_types, ReorderStats};

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

use crate::model::Type;

/// Dependency graph between top-level type names.
///
/// Edges point from a dependency to its dependent, so a topological walk
/// visits dependencies first.
#[derive(Debug, Default)]
pub struct TypeGraph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl TypeGraph {
    /// Build from a type list. Dependencies on names that are not in the
    /// list are ignored.
    pub fn build(types: &[Type]) -> Self {
        let mut tg = Self::default();
        for t in types {
            if !tg.index.contains_key(&t.name) {
                let idx = tg.graph.add_node(t.name.clone());
                tg.index.insert(t.name.clone(), idx);
            }
        }

        for t in types {
            let Some(&dependent) = tg.index.get(&t.name) else {
                continue;
            };
            for dep in t.dependencies() {
                if let Some(&dependency) = tg.index.get(&dep.name) {
                    tg.graph.update_edge(dependency, dependent, ());
                }
            }
        }

        tg
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Names `name` depends on
    pub fn dependencies(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Incoming)
    }

    /// Names depending on `name`
    pub fn dependents(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Outgoing)
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.index.get(name) else {
            return Vec::new();
        };
        self.graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].as_str())
            .collect()
    }

    /// Every dependency cycle, as sorted member names.
    ///
    /// A type depending on itself is a cycle of one.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        kosaraju_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0])
            })
            .map(|scc| {
                let mut members: Vec<String> =
                    scc.iter().map(|&idx| self.graph[idx].clone()).collect();
                members.sort();
                members
            })
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Small constructors shared by the graph pass tests

    use crate::model::{
        ArrayType, DictionaryType, Field, IntegerType, ObjectType, StringType, Type, TypeKind,
        TypeTag,
    };

    pub fn int(name: &str) -> Type {
        Type::new(
            name,
            TypeTag::Int,
            TypeKind::Integer(IntegerType {
                base: 10,
                default: None,
                min: None,
                max: None,
            }),
        )
    }

    pub fn string(name: &str) -> Type {
        Type::new(
            name,
            TypeTag::String,
            TypeKind::String(StringType {
                default: None,
                pattern: None,
                min: None,
                max: None,
            }),
        )
    }

    /// Reference node to the type `target`, used at site `alias`
    pub fn reference(target: &Type, alias: &str) -> Type {
        let mut r = target.clone();
        r.alias = alias.to_string();
        r.is_ref = true;
        r
    }

    pub fn object(name: &str, fields: Vec<(&str, Type)>) -> Type {
        Type::new(
            name,
            TypeTag::Object,
            TypeKind::Object(ObjectType {
                fields: fields
                    .into_iter()
                    .map(|(n, ty)| Field {
                        name: n.to_string(),
                        description: String::new(),
                        required: false,
                        default: None,
                        ty,
                    })
                    .collect(),
                default: None,
            }),
        )
    }

    pub fn array(name: &str, item: Type) -> Type {
        Type::new(
            name,
            TypeTag::Array,
            TypeKind::Array(ArrayType {
                item_type: Box::new(item),
                item_name: "entry".to_string(),
                default: None,
                min_items: None,
                max_items: None,
            }),
        )
    }

    pub fn dict(name: &str, key: Type, value: Type) -> Type {
        Type::new(
            name,
            TypeTag::Dict,
            TypeKind::Dictionary(DictionaryType {
                key_type: Box::new(key),
                value_type: Box::new(value),
                default: None,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_graph_edges_follow_named_children() {
        let point = object("Point", vec![("x", int("x")), ("y", int("y"))]);
        let line = object(
            "Line",
            vec![("a", reference(&point, "a")), ("b", reference(&point, "b"))],
        );
        let graph = TypeGraph::build(&[point, line]);

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.dependencies("Line"), vec!["Point"]);
        assert_eq!(graph.dependents("Point"), vec!["Line"]);
        assert!(graph.cycles().is_empty());
    }

    #[test]
    fn test_cycle_detection() {
        let a_stub = object("A", vec![]);
        let b = object("B", vec![("a", reference(&a_stub, "a"))]);
        let a = object("A", vec![("b", reference(&b, "b"))]);
        let graph = TypeGraph::build(&[a, b]);

        assert_eq!(graph.cycles(), vec![vec!["A".to_string(), "B".to_string()]]);
    }

    #[test]
    fn test_unknown_dependency_ignored() {
        let ghost = object("Ghost", vec![]);
        let t = object("T", vec![("g", reference(&ghost, "g"))]);
        let graph = TypeGraph::build(&[t]);
        assert!(!graph.contains("Ghost"));
        assert_eq!(graph.edge_count(), 0);
    }
}
