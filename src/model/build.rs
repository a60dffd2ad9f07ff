//! Building type nodes from the merged schema document
//!
//! Dispatch happens on the `type` discriminator (synonyms folded by
//! [`TypeTag::parse`]); without one, a `$ref` key makes the entry a
//! reference. Anything else is not a type and is skipped by the caller.

use serde_json::{Map, Number, Value};

use super::{
    ArrayType, BooleanType, DictionaryType, EnumType, Field, FloatType, IntegerType, ObjectType,
    StringType, Type, TypeKind, TypeTag,
};
use crate::error::{CompileError, Result};
use crate::graph::Diagnostics;

const DEFAULT_BASE: u32 = 10;
const DEFAULT_ITEM_NAME: &str = "entry";

/// Loads [`Type`] trees out of one merged document.
///
/// The builder remembers which `$ref`s are being resolved so a reference
/// that leads back to itself fails with [`CompileError::CyclicReference`]
/// instead of recursing forever.
pub struct TypeBuilder<'a> {
    document: &'a Value,
    resolving: Vec<String>,
    diagnostics: Diagnostics,
}

impl<'a> TypeBuilder<'a> {
    pub fn new(document: &'a Value) -> Self {
        Self {
            document,
            resolving: Vec::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Diagnostics collected while loading
    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    /// Load every entry of a top-level section (`types`, `elements`).
    ///
    /// A missing section is empty. Entries that are not types are skipped
    /// with an [`IgnoredEntry`](crate::graph::DiagnosticCode::IgnoredEntry)
    /// diagnostic.
    pub fn load_section(&mut self, section: &str) -> Result<Vec<Type>> {
        let document = self.document;
        let entries = match document.get(section) {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Object(entries)) => entries,
            Some(_) => {
                return Err(CompileError::InvalidSection {
                    section: section.to_string(),
                })
            }
        };

        let mut types = Vec::with_capacity(entries.len());
        for (name, props) in entries {
            match self.load_type(name, props)? {
                Some(t) => types.push(t),
                None => self.diagnostics.ignored_entry(section, name),
            }
        }

        tracing::debug!("loaded {} entries from {}", types.len(), section);
        Ok(types)
    }

    /// Load one entry. `Ok(None)` means the entry is not a type.
    pub fn load_type(&mut self, name: &str, props: &Value) -> Result<Option<Type>> {
        let Some(props) = props.as_object() else {
            return Ok(None);
        };

        let loaded = self.load_shape(name, props).map_err(|e| {
            tracing::error!("failed to load type \"{}\"", name);
            e
        })?;

        Ok(loaded.map(|mut t| {
            t.required = required_flag(props);
            t
        }))
    }

    fn load_shape(&mut self, name: &str, props: &Map<String, Value>) -> Result<Option<Type>> {
        let Some(discriminator) = props.get("type") else {
            if props.contains_key("$ref") {
                return self.load_ref_type(name, props);
            }
            return Ok(None);
        };

        let tag = match discriminator.as_str().and_then(TypeTag::parse) {
            Some(tag) => tag,
            None if props.contains_key("$ref") => return self.load_ref_type(name, props),
            None => {
                return Err(CompileError::malformed(
                    name,
                    format!("unrecognized type {}", discriminator),
                ))
            }
        };

        let has_enum = props.contains_key("enum");
        let mut t = match tag {
            TypeTag::Int | TypeTag::Uint | TypeTag::String if has_enum => {
                enum_type(name, tag, props)?
            }
            TypeTag::Int | TypeTag::Uint => integer(name, tag, props)?,
            TypeTag::Float | TypeTag::Double => float(name, tag, props)?,
            TypeTag::Bool => boolean(name, props),
            TypeTag::String => string(name, props)?,
            TypeTag::Array => self.array(name, props)?,
            TypeTag::Dict => self.dictionary(name, props)?,
            TypeTag::Object => self.object(name, props)?,
            TypeTag::Enum => {
                return Err(CompileError::malformed(
                    name,
                    "enums are declared as a scalar type with an \"enum\" list",
                ))
            }
        };

        t.description = text(name, props, "description")?.unwrap_or_default();
        t.xml = xml(name, props)?;
        Ok(Some(t))
    }

    /// Resolve the `$ref` at a reference site.
    ///
    /// The target is loaded under its own key, then renamed to the site
    /// (`alias`), flagged as a reference and overridden with whatever the
    /// site sets for its kind.
    pub fn load_ref_type(&mut self, name: &str, site: &Map<String, Value>) -> Result<Option<Type>> {
        let reference = match site.get("$ref") {
            Some(Value::String(reference)) => reference.as_str(),
            _ => return Err(CompileError::malformed(name, "\"$ref\" must be a string")),
        };

        let document = self.document;
        let (key, target) = resolve_pointer(document, reference)?;

        if self.resolving.iter().any(|r| r == reference) {
            let mut chain = self.resolving.clone();
            chain.push(reference.to_string());
            return Err(CompileError::CyclicReference { chain });
        }

        self.resolving.push(reference.to_string());
        let loaded = self.load_type(&key, target);
        self.resolving.pop();

        let Some(mut resolved) = loaded? else {
            return Ok(None);
        };
        resolved.alias = name.to_string();
        resolved.is_ref = true;
        apply_overrides(&mut resolved, site)?;
        Ok(Some(resolved))
    }

    fn array(&mut self, name: &str, props: &Map<String, Value>) -> Result<Type> {
        let item = match props.get("items") {
            Some(items) => self.load_type("items", items)?,
            None if props.contains_key("$ref") => self.load_ref_type("items", &ref_site(props))?,
            None => None,
        };
        let item = item.ok_or_else(|| CompileError::UnresolvedItemType {
            name: name.to_string(),
        })?;

        Ok(Type::new(
            name,
            TypeTag::Array,
            TypeKind::Array(ArrayType {
                item_type: Box::new(item),
                item_name: text(name, props, "itemName")?
                    .unwrap_or_else(|| DEFAULT_ITEM_NAME.to_string()),
                default: prop(props, "default").cloned(),
                min_items: size_bound(name, props, "minItems", "min")?,
                max_items: size_bound(name, props, "maxItems", "max")?,
            }),
        ))
    }

    fn dictionary(&mut self, name: &str, props: &Map<String, Value>) -> Result<Type> {
        let key = match props.get("keys") {
            Some(keys) => self.load_type("keys", keys)?,
            None => None,
        };
        let key = key.ok_or_else(|| CompileError::UnresolvedKeyType {
            name: name.to_string(),
        })?;

        let value = match props.get("values") {
            Some(values) => self.load_type("values", values)?,
            None if props.contains_key("$ref") => self.load_ref_type("values", &ref_site(props))?,
            None => None,
        };
        let value = value.ok_or_else(|| CompileError::UnresolvedValueType {
            name: name.to_string(),
        })?;

        Ok(Type::new(
            name,
            TypeTag::Dict,
            TypeKind::Dictionary(DictionaryType {
                key_type: Box::new(key),
                value_type: Box::new(value),
                default: prop(props, "default").cloned(),
            }),
        ))
    }

    fn object(&mut self, name: &str, props: &Map<String, Value>) -> Result<Type> {
        let required: Vec<&str> = match props.get("required") {
            Some(Value::Array(names)) => names.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };

        let properties = match props.get("properties") {
            None | Some(Value::Null) => None,
            Some(Value::Object(properties)) => Some(properties),
            Some(_) => return Err(CompileError::malformed(name, "\"properties\" must be a mapping")),
        };

        let mut fields = Vec::new();
        for (field_name, field_props) in properties.into_iter().flatten() {
            let Some(ty) = self.load_type(field_name, field_props)? else {
                self.diagnostics
                    .ignored_entry(&format!("properties of {}", name), field_name);
                continue;
            };
            fields.push(Field {
                name: field_name.clone(),
                required: required.contains(&field_name.as_str()) || ty.required,
                description: ty.description.clone(),
                default: ty.default_value(),
                ty,
            });
        }

        Ok(Type::new(
            name,
            TypeTag::Object,
            TypeKind::Object(ObjectType {
                fields,
                default: prop(props, "default").cloned(),
            }),
        ))
    }
}

// =============================================================================
// Scalars
// =============================================================================

fn integer(name: &str, tag: TypeTag, props: &Map<String, Value>) -> Result<Type> {
    Ok(Type::new(
        name,
        tag,
        TypeKind::Integer(IntegerType {
            base: base(name, props)?.unwrap_or(DEFAULT_BASE),
            default: prop(props, "default").cloned(),
            min: number(name, props, "min")?,
            max: number(name, props, "max")?,
        }),
    ))
}

fn float(name: &str, tag: TypeTag, props: &Map<String, Value>) -> Result<Type> {
    Ok(Type::new(
        name,
        tag,
        TypeKind::Float(FloatType {
            default: prop(props, "default").cloned(),
            min: number(name, props, "min")?,
            max: number(name, props, "max")?,
        }),
    ))
}

fn boolean(name: &str, props: &Map<String, Value>) -> Type {
    Type::new(
        name,
        TypeTag::Bool,
        TypeKind::Boolean(BooleanType {
            default: prop(props, "default").and_then(parse_bool),
        }),
    )
}

fn string(name: &str, props: &Map<String, Value>) -> Result<Type> {
    Ok(Type::new(
        name,
        TypeTag::String,
        TypeKind::String(StringType {
            default: prop(props, "default").cloned(),
            pattern: text(name, props, "pattern")?,
            min: count(name, props, "min")?,
            max: count(name, props, "max")?,
        }),
    ))
}

fn enum_type(name: &str, base: TypeTag, props: &Map<String, Value>) -> Result<Type> {
    let values = match props.get("enum") {
        Some(Value::Array(literals)) => literals
            .iter()
            .map(|v| literal(name, v))
            .collect::<Result<Vec<_>>>()?,
        _ => return Err(CompileError::malformed(name, "\"enum\" must be a sequence")),
    };

    Ok(Type::new(
        name,
        TypeTag::Enum,
        TypeKind::Enum(EnumType {
            base,
            values,
            default: prop(props, "default").cloned(),
        }),
    ))
}

/// Read a boolean default written as a bool, a word or a number.
///
/// Unreadable spellings give `None` (no default).
pub fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n
            .as_i64()
            .map(|i| i != 0)
            .or_else(|| n.as_f64().map(|f| f != 0.0)),
        _ => None,
    }
}

// =============================================================================
// Reference Sites
// =============================================================================

fn apply_overrides(t: &mut Type, site: &Map<String, Value>) -> Result<()> {
    let name = t.alias.clone();

    if let Some(description) = text(&name, site, "description")? {
        t.description = description;
    }
    if site.contains_key("xml") {
        t.xml = xml(&name, site)?;
    }

    let default = prop(site, "default").cloned();
    match &mut t.kind {
        TypeKind::Integer(i) => {
            set(&mut i.default, default);
            if let Some(b) = base(&name, site)? {
                i.base = b;
            }
            set(&mut i.min, number(&name, site, "min")?);
            set(&mut i.max, number(&name, site, "max")?);
        }
        TypeKind::Float(f) => {
            set(&mut f.default, default);
            set(&mut f.min, number(&name, site, "min")?);
            set(&mut f.max, number(&name, site, "max")?);
        }
        TypeKind::Boolean(b) => {
            if let Some(d) = default {
                b.default = parse_bool(&d);
            }
        }
        TypeKind::String(s) => {
            set(&mut s.default, default);
            set(&mut s.pattern, text(&name, site, "pattern")?);
            set(&mut s.min, count(&name, site, "min")?);
            set(&mut s.max, count(&name, site, "max")?);
        }
        TypeKind::Enum(e) => set(&mut e.default, default),
        TypeKind::Array(a) => {
            set(&mut a.default, default);
            set(&mut a.min_items, size_bound(&name, site, "minItems", "min")?);
            set(&mut a.max_items, size_bound(&name, site, "maxItems", "max")?);
        }
        TypeKind::Dictionary(d) => set(&mut d.default, default),
        TypeKind::Object(o) => set(&mut o.default, default),
    }

    Ok(())
}

/// A site carrying only the `$ref` of `props`, so the container's own
/// attributes do not leak onto its item or value type.
fn ref_site(props: &Map<String, Value>) -> Map<String, Value> {
    props
        .iter()
        .filter(|(k, _)| k.as_str() == "$ref")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Walk a local `#/a/b` pointer. Returns the last key and the value under it.
fn resolve_pointer<'d>(document: &'d Value, reference: &str) -> Result<(String, &'d Value)> {
    let mut segments = reference.split('/');
    if segments.next() != Some("#") {
        return Err(CompileError::UnsupportedReference {
            reference: reference.to_string(),
        });
    }

    let unresolved = || CompileError::UnresolvedReference {
        pointer: reference.to_string(),
    };

    let mut node = document;
    let mut key = None;
    for segment in segments {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        node = match node {
            Value::Object(map) => map.get(&segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
        .ok_or_else(unresolved)?;
        key = Some(segment);
    }

    key.map(|k| (k, node)).ok_or_else(unresolved)
}

fn required_flag(props: &Map<String, Value>) -> bool {
    match props.get("required") {
        Some(Value::Bool(required)) => *required,
        _ => props.get("use").and_then(Value::as_str) == Some("required"),
    }
}

// =============================================================================
// Property Readers
// =============================================================================

fn set<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn prop<'v>(props: &'v Map<String, Value>, key: &str) -> Option<&'v Value> {
    props.get(key).filter(|v| !v.is_null())
}

fn number(name: &str, props: &Map<String, Value>, key: &str) -> Result<Option<Number>> {
    match prop(props, key) {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n.clone())),
        Some(other) => Err(CompileError::malformed(
            name,
            format!("\"{}\" must be a number, got {}", key, other),
        )),
    }
}

fn count(name: &str, props: &Map<String, Value>, key: &str) -> Result<Option<u64>> {
    match prop(props, key) {
        None => Ok(None),
        Some(v) => v.as_u64().map(Some).ok_or_else(|| {
            CompileError::malformed(
                name,
                format!("\"{}\" must be a non-negative integer, got {}", key, v),
            )
        }),
    }
}

fn size_bound(
    name: &str,
    props: &Map<String, Value>,
    key: &str,
    fallback: &str,
) -> Result<Option<u64>> {
    match count(name, props, key)? {
        Some(bound) => Ok(Some(bound)),
        None => count(name, props, fallback),
    }
}

fn base(name: &str, props: &Map<String, Value>) -> Result<Option<u32>> {
    count(name, props, "base")?
        .map(|b| {
            u32::try_from(b)
                .map_err(|_| CompileError::malformed(name, format!("base {} is out of range", b)))
        })
        .transpose()
}

fn text(name: &str, props: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match prop(props, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(CompileError::malformed(
            name,
            format!("\"{}\" must be a string, got {}", key, other),
        )),
    }
}

fn xml(name: &str, props: &Map<String, Value>) -> Result<Map<String, Value>> {
    match prop(props, "xml") {
        None => Ok(Map::new()),
        Some(Value::Object(meta)) => Ok(meta.clone()),
        Some(_) => Err(CompileError::malformed(name, "\"xml\" must be a mapping")),
    }
}

fn literal(name: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(CompileError::malformed(
            name,
            format!("enum literal {} is not a scalar", other),
        )),
    }
}
