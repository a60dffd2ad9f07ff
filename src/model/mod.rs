//! Type Model
//!
//! A schema type is a tree of [`Type`] nodes. Every node carries the common
//! attributes (name, alias, tag, flags, attached constraints, format
//! metadata) and exactly one [`TypeKind`] payload. Composite kinds own their
//! children: an array owns its item type, a dictionary its key and value
//! types, an object the types of its fields.
//!
//! Nodes are built by [`TypeBuilder`] from the merged schema document,
//! renamed by the extractor, ordered by the sorter and annotated by the
//! constraint binder. After that they are a read-only snapshot for renderers.

mod build;
mod constraint;
mod equality;

pub use build::{parse_bool, TypeBuilder};
pub use constraint::{load_constraints, Constraint};
pub use equality::{is_equal_shape, is_equal_type};

use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::fmt;

// =============================================================================
// Type Tag
// =============================================================================

/// Declared tag of a node, as written (after synonym folding) in the schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Int,
    Uint,
    Float,
    Double,
    Bool,
    String,
    Enum,
    Array,
    Dict,
    Object,
}

impl TypeTag {
    /// Fold a `type` discriminator, including synonyms, into a tag
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "int" | "integer" | "number" => Some(Self::Int),
            "uint" | "unsigned" => Some(Self::Uint),
            "float" => Some(Self::Float),
            "double" => Some(Self::Double),
            "bool" | "boolean" => Some(Self::Bool),
            "string" => Some(Self::String),
            "array" | "list" => Some(Self::Array),
            "dict" | "dictionary" | "map" => Some(Self::Dict),
            "object" => Some(Self::Object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::Double => "double",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Enum => "enum",
            Self::Array => "array",
            Self::Dict => "dict",
            Self::Object => "object",
        }
    }

    /// Every tag, in declaration order
    pub fn all() -> &'static [TypeTag] {
        &[
            Self::Int,
            Self::Uint,
            Self::Float,
            Self::Double,
            Self::Bool,
            Self::String,
            Self::Enum,
            Self::Array,
            Self::Dict,
            Self::Object,
        ]
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Kind Payloads
// =============================================================================

/// `int` / `uint`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegerType {
    /// Numeric base used when rendering literals
    pub base: u32,
    pub default: Option<Value>,
    pub min: Option<Number>,
    pub max: Option<Number>,
}

/// `float` / `double`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloatType {
    pub default: Option<Value>,
    pub min: Option<Number>,
    pub max: Option<Number>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BooleanType {
    /// Absent when the schema gave no (or an unreadable) default
    pub default: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StringType {
    pub default: Option<Value>,
    pub pattern: Option<String>,
    /// Length bounds
    pub min: Option<u64>,
    pub max: Option<u64>,
}

/// A scalar restricted to a list of literals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumType {
    /// Scalar tag the literals belong to
    pub base: TypeTag,
    pub values: Vec<String>,
    pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayType {
    pub item_type: Box<Type>,
    /// Display name of a single item
    pub item_name: String,
    pub default: Option<Value>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DictionaryType {
    pub key_type: Box<Type>,
    pub value_type: Box<Type>,
    pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectType {
    pub fields: Vec<Field>,
    pub default: Option<Value>,
}

impl ObjectType {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One named member of an object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
    pub description: String,
    pub required: bool,
    pub default: Option<Value>,
}

/// Kind-specific payload of a [`Type`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeKind {
    Integer(IntegerType),
    Float(FloatType),
    Boolean(BooleanType),
    String(StringType),
    Enum(EnumType),
    Array(ArrayType),
    Dictionary(DictionaryType),
    Object(ObjectType),
}

impl TypeKind {
    /// Kinds hoisted to top-level types wherever they appear
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            Self::Enum(_) | Self::Array(_) | Self::Dictionary(_) | Self::Object(_)
        )
    }

    /// Suffix used to disambiguate a hoisted name
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Array(_) => "-array",
            Self::Dictionary(_) => "-dict",
            Self::Enum(_) => "-enum",
            Self::Object(_) => "-object",
            _ => "-type",
        }
    }
}

// =============================================================================
// Type Node
// =============================================================================

/// A node of the type graph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Type {
    /// Unique identifier once extraction has run
    pub name: String,

    /// Name used at the site that declared or referenced this node
    pub alias: String,

    #[serde(rename = "type")]
    pub tag: TypeTag,

    pub description: String,

    /// Produced by resolving a `$ref`
    pub is_ref: bool,

    /// Synthesized by hoisting a nested node
    pub is_nested: bool,

    pub required: bool,

    pub constraints: Vec<Constraint>,

    /// Format-specific metadata, opaque to the compiler
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub xml: Map<String, Value>,

    #[serde(flatten)]
    pub kind: TypeKind,
}

impl Type {
    pub fn new(name: impl Into<String>, tag: TypeTag, kind: TypeKind) -> Self {
        let name = name.into();
        Self {
            alias: name.clone(),
            name,
            tag,
            description: String::new(),
            is_ref: false,
            is_nested: false,
            required: false,
            constraints: Vec::new(),
            xml: Map::new(),
            kind,
        }
    }

    /// Default literal as a plain value
    pub fn default_value(&self) -> Option<Value> {
        match &self.kind {
            TypeKind::Integer(t) => t.default.clone(),
            TypeKind::Float(t) => t.default.clone(),
            TypeKind::Boolean(t) => t.default.map(Value::Bool),
            TypeKind::String(t) => t.default.clone(),
            TypeKind::Enum(t) => t.default.clone(),
            TypeKind::Array(t) => t.default.clone(),
            TypeKind::Dictionary(t) => t.default.clone(),
            TypeKind::Object(t) => t.default.clone(),
        }
    }

    /// Direct sub-nodes: array item, dictionary key and value, field types
    pub fn children(&self) -> Vec<&Type> {
        match &self.kind {
            TypeKind::Array(a) => vec![a.item_type.as_ref()],
            TypeKind::Dictionary(d) => vec![d.key_type.as_ref(), d.value_type.as_ref()],
            TypeKind::Object(o) => o.fields.iter().map(|f| &f.ty).collect(),
            _ => Vec::new(),
        }
    }

    /// Whether this node stands for a top-level type by name wherever it
    /// appears: references and composites. Scalar array items and
    /// dictionary keys/values are rendered in place.
    pub fn is_named(&self) -> bool {
        self.is_ref || self.kind.is_composite()
    }

    /// Direct sub-nodes that name another top-level type.
    ///
    /// Every field type of an object (scalar fields are hoisted too); only
    /// the named members of an array or dictionary.
    pub fn dependencies(&self) -> Vec<&Type> {
        match &self.kind {
            TypeKind::Object(o) => o.fields.iter().map(|f| &f.ty).collect(),
            _ => self.children().into_iter().filter(|c| c.is_named()).collect(),
        }
    }

    pub fn as_object(&self) -> Option<&ObjectType> {
        match &self.kind {
            TypeKind::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayType> {
        match &self.kind {
            TypeKind::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&DictionaryType> {
        match &self.kind {
            TypeKind::Dictionary(d) => Some(d),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.tag)?;
        if self.is_ref {
            write!(f, " -> ref as {}", self.alias)?;
        }
        Ok(())
    }
}
