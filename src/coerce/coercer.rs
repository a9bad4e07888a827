//! Strict type coercion against a `TypeDescriptor`
//!
//! Coercion rules:
//! - Numeric-looking strings are NOT converted to `int`/`float`
//! - Booleans must be JSON booleans, never `"true"`/`"false"`
//! - `float` accepts any JSON number, integers are kept as written
//! - Typed lists fail on the first failing element, with its index
//! - Field-mapped dicts coerce known keys and pass unknown keys through;
//!   reporting unknown keys is the validator's job
//! - Free-form dicts pass through unmodified

use serde_json::{Map, Value};

use super::errors::{CoercionError, CoercionResult};
use crate::schema::{FieldMap, FieldPath, PathSegment, PrimitiveKind, TypeDescriptor};

/// Validates `value` against `expected`, returning the accepted value.
pub fn coerce(expected: &TypeDescriptor, value: &Value) -> CoercionResult<Value> {
    match expected {
        TypeDescriptor::Primitive(kind) => coerce_primitive(*kind, value),
        TypeDescriptor::List(element) => {
            let items = value
                .as_array()
                .ok_or_else(|| mismatch(expected, value))?;

            match element {
                None => Ok(value.clone()),
                Some(element) => items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        coerce(element, item).map_err(|e| e.within(PathSegment::Index(i)))
                    })
                    .collect::<CoercionResult<Vec<_>>>()
                    .map(Value::Array),
            }
        }
        TypeDescriptor::Dict(fields) => {
            let obj = value
                .as_object()
                .ok_or_else(|| mismatch(expected, value))?;

            match fields {
                None => Ok(value.clone()),
                Some(fields) => coerce_object(fields, obj).map(Value::Object),
            }
        }
    }
}

fn coerce_primitive(kind: PrimitiveKind, value: &Value) -> CoercionResult<Value> {
    let accepted = match kind {
        PrimitiveKind::Str => value.is_string(),
        PrimitiveKind::Int => value.is_i64() || value.is_u64(),
        PrimitiveKind::Float => value.is_number(),
        PrimitiveKind::Bool => value.is_boolean(),
    };

    if accepted {
        Ok(value.clone())
    } else {
        Err(CoercionError::type_mismatch(kind.keyword(), json_type_name(value)))
    }
}

/// Nulls under known keys are left for the validator to judge by required-ness.
fn coerce_object(fields: &FieldMap, obj: &Map<String, Value>) -> CoercionResult<Map<String, Value>> {
    let mut out = Map::with_capacity(obj.len());
    for (key, item) in obj {
        let accepted = match fields.get(key) {
            Some(spec) if !item.is_null() => coerce(&spec.field_type, item)
                .map_err(|e| e.within(PathSegment::Key(key.clone())))?,
            _ => item.clone(),
        };
        out.insert(key.clone(), accepted);
    }
    Ok(out)
}

/// Value used when materializing a new record.
///
/// Field-mapped dicts are populated recursively with every known field.
pub fn default_value(field_type: &TypeDescriptor) -> Value {
    match field_type {
        TypeDescriptor::Primitive(PrimitiveKind::Str) => Value::String(String::new()),
        TypeDescriptor::Primitive(PrimitiveKind::Int) => Value::from(0),
        TypeDescriptor::Primitive(PrimitiveKind::Float) => Value::from(0.0),
        TypeDescriptor::Primitive(PrimitiveKind::Bool) => Value::Bool(false),
        TypeDescriptor::List(_) => Value::Array(Vec::new()),
        TypeDescriptor::Dict(None) => Value::Object(Map::new()),
        TypeDescriptor::Dict(Some(fields)) => Value::Object(default_object(fields)),
    }
}

/// Object holding the default of every field in `fields`, in schema order
pub fn default_object(fields: &FieldMap) -> Map<String, Value> {
    fields
        .iter()
        .map(|spec| (spec.name.clone(), default_value(&spec.field_type)))
        .collect()
}

/// Checks a list position against the current length.
///
/// `allow_end` admits `index == len`, the slot an append would fill.
pub fn check_index(path: &FieldPath, index: usize, len: usize, allow_end: bool) -> CoercionResult<()> {
    if index < len || (allow_end && index == len) {
        Ok(())
    } else {
        Err(CoercionError::IndexOutOfRange {
            path: path.clone(),
            index,
            len,
        })
    }
}

/// Returns the JSON type name for error messages, in type grammar terms.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "int"
            } else {
                "float"
            }
        }
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

fn mismatch(expected: &TypeDescriptor, actual: &Value) -> CoercionError {
    CoercionError::type_mismatch(expected.type_name(), json_type_name(actual))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;
    use serde_json::json;

    #[test]
    fn test_numeric_strings_not_converted() {
        let err = coerce(&TypeDescriptor::int(), &json!("42")).unwrap_err();
        assert_eq!(
            err,
            CoercionError::type_mismatch("int", "str")
        );
        assert!(coerce(&TypeDescriptor::float(), &json!("4.2")).is_err());
    }

    #[test]
    fn test_boolean_strings_rejected() {
        assert!(coerce(&TypeDescriptor::bool(), &json!("true")).is_err());
        assert_eq!(coerce(&TypeDescriptor::bool(), &json!(true)).unwrap(), json!(true));
    }

    #[test]
    fn test_int_rejects_fractional_numbers() {
        assert!(coerce(&TypeDescriptor::int(), &json!(3.5)).is_err());
        assert_eq!(coerce(&TypeDescriptor::int(), &json!(-7)).unwrap(), json!(-7));
    }

    #[test]
    fn test_float_accepts_integers_unchanged() {
        assert_eq!(coerce(&TypeDescriptor::float(), &json!(100)).unwrap(), json!(100));
        assert_eq!(coerce(&TypeDescriptor::float(), &json!(99.5)).unwrap(), json!(99.5));
    }

    #[test]
    fn test_typed_list_reports_offending_index() {
        let list = TypeDescriptor::list_of(TypeDescriptor::str());
        let err = coerce(&list, &json!(["a", "b", 3, 4])).unwrap_err();
        assert_eq!(err.path(), &FieldPath::root().index(2));

        let nested = TypeDescriptor::list_of(TypeDescriptor::list_of(TypeDescriptor::int()));
        let err = coerce(&nested, &json!([[1], [2, "x"]])).unwrap_err();
        assert_eq!(err.path(), &FieldPath::root().index(1).index(1));
    }

    #[test]
    fn test_untyped_list_accepts_anything() {
        let value = json!([1, "two", null, {"three": 3}]);
        assert_eq!(coerce(&TypeDescriptor::List(None), &value).unwrap(), value);
        assert!(coerce(&TypeDescriptor::List(None), &json!("nope")).is_err());
    }

    #[test]
    fn test_dict_keeps_unknown_keys() {
        let fields = FieldMap::new().with(FieldSpec::required("zip", TypeDescriptor::str()));
        let dict = TypeDescriptor::dict_of(fields);

        let value = json!({"zip": "10001", "note": 5});
        assert_eq!(coerce(&dict, &value).unwrap(), value);

        let err = coerce(&dict, &json!({"zip": 10001})).unwrap_err();
        assert_eq!(err.path(), &FieldPath::root().key("zip"));
    }

    #[test]
    fn test_free_form_dict_passes_through() {
        let value = json!({"a": [1, {"b": null}], "c": "d"});
        assert_eq!(coerce(&TypeDescriptor::Dict(None), &value).unwrap(), value);
        assert!(coerce(&TypeDescriptor::Dict(None), &json!([1])).is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(default_value(&TypeDescriptor::str()), json!(""));
        assert_eq!(default_value(&TypeDescriptor::int()), json!(0));
        assert_eq!(default_value(&TypeDescriptor::float()), json!(0.0));
        assert_eq!(default_value(&TypeDescriptor::bool()), json!(false));
        assert_eq!(default_value(&TypeDescriptor::List(None)), json!([]));
        assert_eq!(default_value(&TypeDescriptor::Dict(None)), json!({}));

        let inner = FieldMap::new()
            .with(FieldSpec::optional("city", TypeDescriptor::str()))
            .with(FieldSpec::optional("geo", TypeDescriptor::dict_of(
                FieldMap::new().with(FieldSpec::optional("lat", TypeDescriptor::float())),
            )));
        assert_eq!(
            default_value(&TypeDescriptor::dict_of(inner)),
            json!({"city": "", "geo": {"lat": 0.0}})
        );
    }

    #[test]
    fn test_check_index() {
        let path = FieldPath::root().key("tags");
        assert!(check_index(&path, 0, 1, false).is_ok());
        assert!(check_index(&path, 1, 1, true).is_ok());
        let err = check_index(&path, 0, 0, false).unwrap_err();
        assert_eq!(err.code(), "COERCION_INDEX_OUT_OF_RANGE");
    }
}
