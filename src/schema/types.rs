//! Schema type definitions
//!
//! Supported types:
//! - str: UTF-8 string
//! - int: 64-bit integer
//! - float: any JSON number
//! - bool: JSON boolean
//! - list / list[T]: untyped or homogeneous list
//! - dict / object: free-form or field-mapped nested object

use std::fmt;

use super::path::{FieldPath, PathSegment};

/// Primitive value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Str,
    Int,
    Float,
    Bool,
}

impl PrimitiveKind {
    /// Returns the keyword used in the type grammar
    pub fn keyword(&self) -> &'static str {
        match self {
            PrimitiveKind::Str => "str",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Bool => "bool",
        }
    }

    /// Case-sensitive keyword lookup
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "str" => Some(PrimitiveKind::Str),
            "int" => Some(PrimitiveKind::Int),
            "float" => Some(PrimitiveKind::Float),
            "bool" => Some(PrimitiveKind::Bool),
            _ => None,
        }
    }
}

/// Expected shape of a field value.
///
/// A `List` whose element is a `Dict` carries that dict's field map on the
/// element descriptor, so element records can be validated like top-level ones.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),
    /// `None` element type means any JSON value is accepted per element
    List(Option<Box<TypeDescriptor>>),
    /// `None` field map means a free-form key/value dict
    Dict(Option<FieldMap>),
}

impl TypeDescriptor {
    pub fn str() -> Self {
        TypeDescriptor::Primitive(PrimitiveKind::Str)
    }

    pub fn int() -> Self {
        TypeDescriptor::Primitive(PrimitiveKind::Int)
    }

    pub fn float() -> Self {
        TypeDescriptor::Primitive(PrimitiveKind::Float)
    }

    pub fn bool() -> Self {
        TypeDescriptor::Primitive(PrimitiveKind::Bool)
    }

    pub fn list_of(element: TypeDescriptor) -> Self {
        TypeDescriptor::List(Some(Box::new(element)))
    }

    pub fn dict_of(fields: FieldMap) -> Self {
        TypeDescriptor::Dict(Some(fields))
    }

    /// Coarse kind name, used by callers to pick an editing widget
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeDescriptor::Primitive(kind) => kind.keyword(),
            TypeDescriptor::List(_) => "list",
            TypeDescriptor::Dict(_) => "dict",
        }
    }

    /// Renders the descriptor back into the type grammar
    pub fn type_name(&self) -> String {
        match self {
            TypeDescriptor::Primitive(kind) => kind.keyword().to_string(),
            TypeDescriptor::List(None) => "list".to_string(),
            TypeDescriptor::List(Some(element)) => format!("list[{}]", element.type_name()),
            TypeDescriptor::Dict(_) => "dict".to_string(),
        }
    }

    /// Known nested field map, if any
    pub fn fields(&self) -> Option<&FieldMap> {
        match self {
            TypeDescriptor::Dict(Some(fields)) => Some(fields),
            _ => None,
        }
    }

    /// Element type of a typed list
    pub fn element(&self) -> Option<&TypeDescriptor> {
        match self {
            TypeDescriptor::List(Some(element)) => Some(element),
            _ => None,
        }
    }

    /// Returns true if walking this type can reach a field-mapped dict
    pub fn has_nested_fields(&self) -> bool {
        match self {
            TypeDescriptor::Dict(Some(_)) => true,
            TypeDescriptor::List(Some(element)) => element.has_nested_fields(),
            _ => false,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Field definition within one schema scope
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: TypeDescriptor,
    /// Required fields must be present and non-null
    pub required: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: TypeDescriptor, required: bool) -> Self {
        Self {
            name: name.into(),
            field_type,
            required,
        }
    }

    pub fn required(name: impl Into<String>, field_type: TypeDescriptor) -> Self {
        Self::new(name, field_type, true)
    }

    pub fn optional(name: impl Into<String>, field_type: TypeDescriptor) -> Self {
        Self::new(name, field_type, false)
    }
}

/// Insertion-ordered field specs, unique by name.
///
/// Order follows the model document and drives validation traversal and
/// export key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    fields: Vec<FieldSpec>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Inserts a field, replacing any existing spec of the same name in place
    pub fn insert(&mut self, spec: FieldSpec) {
        match self.fields.iter_mut().find(|f| f.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.fields.push(spec),
        }
    }

    /// Builder form of [`FieldMap::insert`]
    pub fn with(mut self, spec: FieldSpec) -> Self {
        self.insert(spec);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldSpec> {
        self.fields.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for &'a FieldMap {
    type Item = &'a FieldSpec;
    type IntoIter = std::slice::Iter<'a, FieldSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Typed schema built from a model document's `__meta__` block.
///
/// Immutable after construction. Reloading a model builds a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaModel {
    fields: FieldMap,
}

impl SchemaModel {
    pub fn new(fields: FieldMap) -> Self {
        Self { fields }
    }

    /// Top-level fields in model order
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.names().collect()
    }

    /// Resolves the declared type at `path`.
    ///
    /// Returns `None` when the path leaves the known schema: an unknown key,
    /// a key below a free-form dict, or an index below an untyped list.
    pub fn describe(&self, path: &FieldPath) -> Option<&TypeDescriptor> {
        let (first, rest) = path.segments().split_first()?;
        let mut current = &self.fields.get(first.as_key()?)?.field_type;

        for segment in rest {
            current = match segment {
                PathSegment::Key(key) => &current.fields()?.get(key)?.field_type,
                PathSegment::Index(_) | PathSegment::Append => current.element()?,
            };
        }

        Some(current)
    }
}
