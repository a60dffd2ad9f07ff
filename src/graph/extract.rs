//! Nested Type Extractor
//!
//! Every non-reference node found inside a declared type, and every element,
//! is hoisted into a named top-level type: object fields of any kind, and
//! composites (object, enum, array, dictionary) wherever they appear. Scalar
//! array items and dictionary keys/values stay inline. Structurally equal
//! nodes share one definition.
//!
//! Extraction runs in two phases. [`plan`] walks an immutable view of the
//! forest and decides every name and every new definition; [`apply`] then
//! renames the walked nodes by path and appends the new definitions.

use crate::model::{is_equal_shape, Type, TypeKind};

use super::Diagnostics;

/// Tree a rename applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Root {
    /// Index into the declared types
    Type(usize),
    /// Index into the elements
    Element(usize),
}

/// One step from a node to one of its children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Field at this position of an object
    Field(usize),
    /// Array item type
    Item,
    /// Dictionary key type
    Key,
    /// Dictionary value type
    Value,
}

/// Rename of one walked node to its hoisted name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub root: Root,
    pub path: Vec<PathSegment>,
    pub name: String,
}

/// A new top-level definition
#[derive(Debug, Clone)]
pub struct Hoisted {
    pub ty: Type,
    /// Where the first node with this shape was found
    pub origin: String,
}

/// Outcome of [`plan`]
#[derive(Debug, Clone, Default)]
pub struct ExtractionPlan {
    pub renames: Vec<Rename>,
    pub hoisted: Vec<Hoisted>,
}

impl ExtractionPlan {
    pub fn is_empty(&self) -> bool {
        self.renames.is_empty() && self.hoisted.is_empty()
    }
}

/// Hoist nested composites of `types` and `elements` into `types`.
///
/// Returns the number of definitions appended.
pub fn extract_nested_types(
    types: &mut Vec<Type>,
    elements: &mut [Type],
    diagnostics: &mut Diagnostics,
) -> usize {
    let plan = plan(types, elements);
    let hoisted = plan.hoisted.len();
    apply(plan, types, elements, diagnostics);
    tracing::debug!("hoisted {} nested type(s)", hoisted);
    hoisted
}

/// Decide names and new definitions without touching the input
pub fn plan(types: &[Type], elements: &[Type]) -> ExtractionPlan {
    let mut planner = Planner {
        registry: types.to_vec(),
        declared: types.len(),
        origins: Vec::new(),
        renames: Vec::new(),
        trail: Vec::new(),
        path: Vec::new(),
    };

    // Declared types keep their own name; only what is inside them moves.
    for (i, t) in types.iter().enumerate() {
        if t.is_ref {
            continue;
        }
        planner.trail.push(format!("types/{}", t.name));
        let canonical = planner.canonical_children(t, Root::Type(i));
        planner.registry[i] = canonical;
        planner.trail.pop();
    }

    for (i, e) in elements.iter().enumerate() {
        planner.trail.push(format!("elements/{}", e.alias));
        planner.canonicalize(e, Root::Element(i), true);
        planner.trail.pop();
    }

    let hoisted = planner
        .registry
        .split_off(planner.declared)
        .into_iter()
        .zip(planner.origins)
        .map(|(ty, origin)| Hoisted { ty, origin })
        .collect();

    ExtractionPlan {
        renames: planner.renames,
        hoisted,
    }
}

/// Carry out a plan made by [`plan`] over the same `types` and `elements`
pub fn apply(
    plan: ExtractionPlan,
    types: &mut Vec<Type>,
    elements: &mut [Type],
    diagnostics: &mut Diagnostics,
) {
    for rename in &plan.renames {
        let root = match rename.root {
            Root::Type(i) => types.get_mut(i),
            Root::Element(i) => elements.get_mut(i),
        };
        match root.and_then(|r| node_at_mut(r, &rename.path)) {
            Some(node) => node.name = rename.name.clone(),
            None => tracing::warn!(
                "rename target for \"{}\" vanished before extraction was applied",
                rename.name
            ),
        }
    }

    for hoisted in plan.hoisted {
        diagnostics.hoisted(&hoisted.ty.name, &hoisted.origin);
        types.push(hoisted.ty);
    }
}

/// Follow `path` down from `root`
pub fn node_at_mut<'t>(root: &'t mut Type, path: &[PathSegment]) -> Option<&'t mut Type> {
    let Some((step, rest)) = path.split_first() else {
        return Some(root);
    };

    let child = match (step, &mut root.kind) {
        (PathSegment::Field(i), TypeKind::Object(o)) => &mut o.fields.get_mut(*i)?.ty,
        (PathSegment::Item, TypeKind::Array(a)) => a.item_type.as_mut(),
        (PathSegment::Key, TypeKind::Dictionary(d)) => d.key_type.as_mut(),
        (PathSegment::Value, TypeKind::Dictionary(d)) => d.value_type.as_mut(),
        _ => return None,
    };
    node_at_mut(child, rest)
}

struct Planner {
    /// Declared types (canonical once walked) followed by hoisted ones
    registry: Vec<Type>,
    declared: usize,
    /// Origin of each hoisted entry, parallel to `registry[declared..]`
    origins: Vec<String>,
    renames: Vec<Rename>,
    /// Human readable location, for diagnostics
    trail: Vec<String>,
    path: Vec<PathSegment>,
}

impl Planner {
    /// Canonical copy of `node`, hoisting it if it is a composite or sits
    /// at a position where scalars are hoisted too
    fn canonicalize(&mut self, node: &Type, root: Root, hoist_scalar: bool) -> Type {
        if node.is_ref {
            return node.clone();
        }

        let mut canonical = self.canonical_children(node, root);
        if hoist_scalar || canonical.kind.is_composite() {
            let name = self.place(&canonical);
            if name != canonical.name {
                self.renames.push(Rename {
                    root,
                    path: self.path.clone(),
                    name: name.clone(),
                });
                canonical.name = name;
            }
        }
        canonical
    }

    /// Copy of `node` whose children are canonical
    fn canonical_children(&mut self, node: &Type, root: Root) -> Type {
        let mut out = node.clone();
        match &mut out.kind {
            TypeKind::Object(o) => {
                for (i, field) in o.fields.iter_mut().enumerate() {
                    let c = self.descend(PathSegment::Field(i), &field.name, &field.ty, root);
                    field.ty = c;
                }
            }
            TypeKind::Array(a) => {
                let c = self.descend(PathSegment::Item, "items", &a.item_type, root);
                *a.item_type = c;
            }
            TypeKind::Dictionary(d) => {
                let k = self.descend(PathSegment::Key, "keys", &d.key_type, root);
                *d.key_type = k;
                let v = self.descend(PathSegment::Value, "values", &d.value_type, root);
                *d.value_type = v;
            }
            _ => {}
        }
        out
    }

    fn descend(&mut self, step: PathSegment, label: &str, child: &Type, root: Root) -> Type {
        self.path.push(step);
        self.trail.push(label.to_string());
        let c = self.canonicalize(child, root, matches!(step, PathSegment::Field(_)));
        self.trail.pop();
        self.path.pop();
        c
    }

    /// Pick the top-level name for a canonical node, registering a new
    /// definition when no structurally equal one exists under that name.
    ///
    /// Candidates: the base name, the base name with the kind suffix, then
    /// the base name with a counter.
    fn place(&mut self, node: &Type) -> String {
        let base = hoisted_base_name(node);
        let suffixed = format!("{}{}", base, node.kind.suffix());
        let counted = (0..).map(|n| format!("{}-{}", base, n));

        let chosen = [base.clone(), suffixed]
            .into_iter()
            .chain(counted)
            .find(|candidate| match self.lookup(candidate) {
                None => true,
                Some(existing) => is_equal_shape(node, existing),
            })
            .unwrap_or(base);

        if self.lookup(&chosen).is_none() {
            let mut def = node.clone();
            def.name = chosen.clone();
            def.alias = chosen.clone();
            def.is_nested = true;
            self.registry.push(def);
            self.origins.push(self.trail.join("/"));
        }
        chosen
    }

    fn lookup(&self, name: &str) -> Option<&Type> {
        self.registry.iter().find(|t| t.name == name)
    }
}

/// `<item>_array`, `<key>_<value>_dict`, otherwise the node's own name.
///
/// A member is named after its object type, or after its tag for any other
/// kind.
fn hoisted_base_name(node: &Type) -> String {
    fn member(t: &Type) -> &str {
        match t.kind {
            TypeKind::Object(_) => &t.name,
            _ => t.tag.as_str(),
        }
    }

    match &node.kind {
        TypeKind::Array(a) => format!("{}_array", member(&a.item_type)),
        TypeKind::Dictionary(d) => format!("{}_{}_dict", member(&d.key_type), member(&d.value_type)),
        _ => node.name.clone(),
    }
}
