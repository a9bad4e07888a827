//! Model document loader
//!
//! A model document is a JSON object with a `__meta__` key:
//!
//! ```json
//! {"__meta__": {"name": {"type": "str", "required": true},
//!               "tags": {"type": "list[str]"},
//!               "address": {"type": "dict", "fields": {"city": {"type": "str"}}}}}
//! ```
//!
//! Other top-level keys are reserved for the caller and ignored.

use serde_json::{Map, Value};

use super::errors::{SchemaError, SchemaResult};
use super::types::{FieldMap, FieldSpec, PrimitiveKind, SchemaModel, TypeDescriptor};

/// Key holding the field definitions
pub const META_KEY: &str = "__meta__";

impl SchemaModel {
    /// Builds a schema from a parsed model document.
    ///
    /// # Errors
    ///
    /// - `MalformedMeta` if `__meta__` is missing, not a non-empty object, or
    ///   holds an entry that is not field-shaped
    /// - `BadTypeString` if a `type` string is outside the grammar
    pub fn parse(model_doc: &Value) -> SchemaResult<Self> {
        let root = model_doc
            .as_object()
            .ok_or_else(|| SchemaError::malformed_meta("model document must be a JSON object"))?;

        let meta = root
            .get(META_KEY)
            .ok_or_else(|| SchemaError::malformed_meta("model document has no __meta__ key"))?
            .as_object()
            .ok_or_else(|| SchemaError::malformed_meta("__meta__ must be an object"))?;

        if meta.is_empty() {
            return Err(SchemaError::malformed_meta("__meta__ declares no fields"));
        }

        Ok(SchemaModel::new(parse_field_map(meta, "")?))
    }

    /// Parses model text. Invalid JSON is reported as `MalformedMeta`.
    pub fn parse_str(text: &str) -> SchemaResult<Self> {
        let doc: Value = serde_json::from_str(text)
            .map_err(|e| SchemaError::malformed_meta(format!("model is not valid JSON: {}", e)))?;
        Self::parse(&doc)
    }
}

fn parse_field_map(entries: &Map<String, Value>, prefix: &str) -> SchemaResult<FieldMap> {
    let mut fields = FieldMap::new();
    for (name, entry) in entries {
        let qualified = qualify(prefix, name);
        fields.insert(parse_field_spec(name, entry, &qualified)?);
    }
    Ok(fields)
}

fn parse_field_spec(name: &str, entry: &Value, qualified: &str) -> SchemaResult<FieldSpec> {
    let entry = entry.as_object().ok_or_else(|| {
        SchemaError::malformed_meta(format!("entry for field '{}' must be an object", qualified))
    })?;

    let type_string = match entry.get("type") {
        Some(Value::String(s)) => s,
        Some(_) => {
            return Err(SchemaError::malformed_meta(format!(
                "'type' of field '{}' must be a string",
                qualified
            )))
        }
        None => {
            return Err(SchemaError::malformed_meta(format!(
                "field '{}' has no 'type'",
                qualified
            )))
        }
    };

    let required = match entry.get("required") {
        None => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            return Err(SchemaError::malformed_meta(format!(
                "'required' of field '{}' must be a boolean",
                qualified
            )))
        }
    };

    let mut field_type = parse_type_string(type_string)
        .ok_or_else(|| SchemaError::bad_type_string(qualified, type_string.as_str()))?;

    match entry.get("fields") {
        None | Some(Value::Null) => {}
        Some(Value::Object(nested)) => {
            let nested = parse_field_map(nested, qualified)?;
            field_type = attach_fields(field_type, nested);
        }
        Some(_) => {
            return Err(SchemaError::malformed_meta(format!(
                "'fields' of field '{}' must be an object",
                qualified
            )))
        }
    }

    Ok(FieldSpec::new(name, field_type, required))
}

/// Deepest `list[...]` nesting a type string may use
pub const MAX_TYPE_NESTING: usize = 32;

/// Parses one term of the type grammar:
/// `str | int | float | bool | list | list[T] | dict | object`.
///
/// Dicts come back free-form; a sibling `fields` object is attached afterwards.
/// Strings nested deeper than [`MAX_TYPE_NESTING`] are rejected.
pub fn parse_type_string(s: &str) -> Option<TypeDescriptor> {
    let mut inner = s;
    let mut depth = 0;
    while let Some(rest) = inner.strip_prefix("list[") {
        if depth == MAX_TYPE_NESTING {
            return None;
        }
        inner = rest.strip_suffix(']')?;
        depth += 1;
    }

    let mut parsed = match inner {
        "list" => TypeDescriptor::List(None),
        "dict" | "object" => TypeDescriptor::Dict(None),
        _ => TypeDescriptor::Primitive(PrimitiveKind::from_keyword(inner)?),
    };
    for _ in 0..depth {
        parsed = TypeDescriptor::list_of(parsed);
    }
    Some(parsed)
}

/// Attaches a field map to the dict reached by walking list elements.
///
/// `fields` on a type with no dict in reach is ignored.
fn attach_fields(field_type: TypeDescriptor, fields: FieldMap) -> TypeDescriptor {
    match field_type {
        TypeDescriptor::Dict(_) => TypeDescriptor::Dict(Some(fields)),
        TypeDescriptor::List(Some(element)) => {
            TypeDescriptor::List(Some(Box::new(attach_fields(*element, fields))))
        }
        other => other,
    }
}

fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldPath;
    use serde_json::json;

    #[test]
    fn test_parse_primitives_and_required() {
        let schema = SchemaModel::parse(&json!({
            "__meta__": {
                "name": {"type": "str", "required": true},
                "age": {"type": "int", "required": false},
                "score": {"type": "float"},
                "active": {"type": "bool"}
            },
            "title": "ignored by the engine"
        }))
        .unwrap();

        assert_eq!(schema.field_names(), vec!["name", "age", "score", "active"]);
        assert!(schema.field("name").unwrap().required);
        assert!(!schema.field("age").unwrap().required);
        assert!(!schema.field("score").unwrap().required);
        assert_eq!(schema.field("active").unwrap().field_type, TypeDescriptor::bool());
    }

    #[test]
    fn test_parse_type_grammar() {
        assert_eq!(parse_type_string("list"), Some(TypeDescriptor::List(None)));
        assert_eq!(parse_type_string("object"), Some(TypeDescriptor::Dict(None)));
        assert_eq!(
            parse_type_string("list[int]"),
            Some(TypeDescriptor::list_of(TypeDescriptor::int()))
        );
        assert_eq!(
            parse_type_string("list[list[str]]"),
            Some(TypeDescriptor::list_of(TypeDescriptor::list_of(
                TypeDescriptor::str()
            )))
        );
        assert_eq!(parse_type_string("Str"), None);
        assert_eq!(parse_type_string("list[]"), None);
        assert_eq!(parse_type_string("list[str"), None);
        assert_eq!(parse_type_string("string"), None);
    }

    #[test]
    fn test_type_nesting_is_capped() {
        let nested = |depth: usize| format!("{}str{}", "list[".repeat(depth), "]".repeat(depth));

        assert!(parse_type_string(&nested(MAX_TYPE_NESTING)).is_some());
        assert_eq!(parse_type_string(&nested(MAX_TYPE_NESTING + 1)), None);

        let err = SchemaModel::parse(&json!({
            "__meta__": {"grid": {"type": nested(20_000)}}
        }))
        .unwrap_err();
        assert_eq!(err.code(), "SCHEMA_BAD_TYPE_STRING");
    }

    #[test]
    fn test_missing_meta_is_malformed() {
        let err = SchemaModel::parse(&json!({"fields": {}})).unwrap_err();
        assert_eq!(err.code(), "SCHEMA_MALFORMED_META");

        let err = SchemaModel::parse(&json!({"__meta__": []})).unwrap_err();
        assert_eq!(err.code(), "SCHEMA_MALFORMED_META");

        let err = SchemaModel::parse(&json!([1, 2])).unwrap_err();
        assert_eq!(err.code(), "SCHEMA_MALFORMED_META");
    }

    #[test]
    fn test_bad_type_string() {
        let err = SchemaModel::parse(&json!({
            "__meta__": {"age": {"type": "integer"}}
        }))
        .unwrap_err();
        assert_eq!(err, SchemaError::bad_type_string("age", "integer"));
    }

    #[test]
    fn test_nested_bad_type_reports_qualified_name() {
        let err = SchemaModel::parse(&json!({
            "__meta__": {
                "address": {"type": "dict", "fields": {"zip": {"type": "INT"}}}
            }
        }))
        .unwrap_err();
        assert_eq!(err, SchemaError::bad_type_string("address.zip", "INT"));
    }

    #[test]
    fn test_non_boolean_required_is_malformed() {
        let err = SchemaModel::parse(&json!({
            "__meta__": {"name": {"type": "str", "required": "yes"}}
        }))
        .unwrap_err();
        assert_eq!(err.code(), "SCHEMA_MALFORMED_META");
    }

    #[test]
    fn test_list_of_dict_carries_fields() {
        let schema = SchemaModel::parse(&json!({
            "__meta__": {
                "contacts": {
                    "type": "list[dict]",
                    "fields": {"phone": {"type": "str", "required": true}}
                },
                "loose": {"type": "list[dict]"}
            }
        }))
        .unwrap();

        let contacts = &schema.field("contacts").unwrap().field_type;
        let element_fields = contacts.element().and_then(|e| e.fields()).unwrap();
        assert!(element_fields.get("phone").unwrap().required);

        let loose = &schema.field("loose").unwrap().field_type;
        assert_eq!(loose.element(), Some(&TypeDescriptor::Dict(None)));
    }

    #[test]
    fn test_parse_str_rejects_invalid_json() {
        let err = SchemaModel::parse_str("{not json").unwrap_err();
        assert_eq!(err.code(), "SCHEMA_MALFORMED_META");

        let schema = SchemaModel::parse_str(r#"{"__meta__": {"n": {"type": "str"}}}"#).unwrap();
        assert!(schema.describe(&FieldPath::root().key("n")).is_some());
    }
}
