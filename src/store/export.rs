//! Export key ordering
//!
//! Known fields come first in schema order, followed by unknown fields in
//! their stored order. Applied recursively through field-mapped dicts and
//! typed lists, so load followed by export loses no keys.

use serde_json::{Map, Value};

use crate::schema::{FieldMap, TypeDescriptor};

/// Reorders an object's keys for export.
pub fn ordered_object(fields: &FieldMap, obj: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::with_capacity(obj.len());

    for spec in fields {
        if let Some(value) = obj.get(&spec.name) {
            out.insert(spec.name.clone(), ordered_value(&spec.field_type, value));
        }
    }
    for (key, value) in obj {
        if !fields.contains(key) {
            out.insert(key.clone(), value.clone());
        }
    }
    out
}

fn ordered_value(field_type: &TypeDescriptor, value: &Value) -> Value {
    match (field_type, value) {
        (TypeDescriptor::Dict(Some(fields)), Value::Object(obj)) => {
            Value::Object(ordered_object(fields, obj))
        }
        (TypeDescriptor::List(Some(element)), Value::Array(items)) if element.has_nested_fields() => {
            Value::Array(items.iter().map(|item| ordered_value(element, item)).collect())
        }
        _ => value.clone(),
    }
}
