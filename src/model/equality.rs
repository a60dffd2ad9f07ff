//! Structural equality of type nodes
//!
//! Defaults and descriptions never take part: two shapes that differ only in
//! those are the same type.

use super::{Type, TypeKind};

/// Name, tag, reference flag and kind payload all match
pub fn is_equal_type(a: &Type, b: &Type) -> bool {
    a.name == b.name && is_equal_shape(a, b)
}

/// Like [`is_equal_type`] but ignoring the names of the two nodes themselves.
/// Names of children still have to match.
pub fn is_equal_shape(a: &Type, b: &Type) -> bool {
    if a.tag != b.tag || a.is_ref != b.is_ref {
        return false;
    }

    match (&a.kind, &b.kind) {
        (TypeKind::Integer(x), TypeKind::Integer(y)) => {
            x.base == y.base && x.min == y.min && x.max == y.max
        }
        (TypeKind::Float(x), TypeKind::Float(y)) => x.min == y.min && x.max == y.max,
        (TypeKind::Boolean(_), TypeKind::Boolean(_)) => true,
        (TypeKind::String(x), TypeKind::String(y)) => {
            x.pattern == y.pattern && x.min == y.min && x.max == y.max
        }
        (TypeKind::Enum(x), TypeKind::Enum(y)) => x.base == y.base && x.values == y.values,
        (TypeKind::Array(x), TypeKind::Array(y)) => {
            is_equal_type(&x.item_type, &y.item_type)
                && x.item_name == y.item_name
                && x.min_items == y.min_items
                && x.max_items == y.max_items
        }
        (TypeKind::Dictionary(x), TypeKind::Dictionary(y)) => {
            is_equal_type(&x.key_type, &y.key_type) && is_equal_type(&x.value_type, &y.value_type)
        }
        (TypeKind::Object(x), TypeKind::Object(y)) => {
            x.fields.len() == y.fields.len()
                && x
                    .fields
                    .iter()
                    .zip(&y.fields)
                    .all(|(f, g)| f.name == g.name && is_equal_type(&f.ty, &g.ty))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ArrayType, EnumType, Field, ObjectType, StringType, TypeTag,
    };
    use serde_json::json;

    fn string(name: &str, max: Option<u64>) -> Type {
        Type::new(
            name,
            TypeTag::String,
            TypeKind::String(StringType {
                default: None,
                pattern: None,
                min: None,
                max,
            }),
        )
    }

    fn object(name: &str, fields: Vec<(&str, Type)>) -> Type {
        Type::new(
            name,
            TypeTag::Object,
            TypeKind::Object(ObjectType {
                fields: fields
                    .into_iter()
                    .map(|(n, ty)| Field {
                        name: n.to_string(),
                        description: ty.description.clone(),
                        required: false,
                        default: None,
                        ty,
                    })
                    .collect(),
                default: None,
            }),
        )
    }

    #[test]
    fn test_defaults_and_descriptions_ignored() {
        let mut a = string("host", Some(64));
        let mut b = string("host", Some(64));
        a.description = "primary".into();
        if let TypeKind::String(s) = &mut b.kind {
            s.default = Some(json!("localhost"));
        }
        assert!(is_equal_type(&a, &b));
    }

    #[test]
    fn test_bounds_and_ref_flag_matter() {
        let a = string("host", Some(64));
        assert!(!is_equal_type(&a, &string("host", Some(32))));

        let mut r = a.clone();
        r.is_ref = true;
        assert!(!is_equal_type(&a, &r));
    }

    #[test]
    fn test_object_field_order_matters() {
        let a = object("p", vec![("x", string("x", None)), ("y", string("y", None))]);
        let b = object("p", vec![("y", string("y", None)), ("x", string("x", None))]);
        assert!(!is_equal_type(&a, &b));
        assert!(is_equal_shape(&a, &object("q", vec![("x", string("x", None)), ("y", string("y", None))])));
    }

    #[test]
    fn test_enum_literal_order_matters() {
        let e = |values: &[&str]| {
            Type::new(
                "mode",
                TypeTag::Enum,
                TypeKind::Enum(EnumType {
                    base: TypeTag::String,
                    values: values.iter().map(|v| v.to_string()).collect(),
                    default: None,
                }),
            )
        };
        assert!(is_equal_type(&e(&["a", "b"]), &e(&["a", "b"])));
        assert!(!is_equal_type(&e(&["a", "b"]), &e(&["b", "a"])));
    }

    #[test]
    fn test_array_item_name_matters() {
        let arr = |item_name: &str| {
            Type::new(
                "tags",
                TypeTag::Array,
                TypeKind::Array(ArrayType {
                    item_type: Box::new(string("items", None)),
                    item_name: item_name.to_string(),
                    default: None,
                    min_items: None,
                    max_items: None,
                }),
            )
        };
        assert!(is_equal_type(&arr("entry"), &arr("entry")));
        assert!(!is_equal_type(&arr("entry"), &arr("tag")));
    }
}
