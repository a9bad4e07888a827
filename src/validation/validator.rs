//! Record validator
//!
//! Validation semantics:
//! - Traversal follows schema field order, depth-first into nested
//!   dicts and lists before the next sibling
//! - Unknown fields of a scope are reported after its known fields
//! - Absent or null required fields yield `MissingRequired` only
//! - Absent optional fields are silently skipped; nothing is injected
//! - Unknown fields are reported, never removed
//!
//! Validation is deterministic and never mutates the record.

use serde_json::{Map, Value};

use super::violation::Violation;
use crate::coerce::{coerce, json_type_name, CoercionError};
use crate::record::{Record, RecordId};
use crate::schema::{FieldMap, FieldPath, PathSegment, SchemaModel, TypeDescriptor};

/// Walks records against a schema.
pub struct Validator<'a> {
    schema: &'a SchemaModel,
}

impl<'a> Validator<'a> {
    /// Creates a new validator bound to the given schema.
    pub fn new(schema: &'a SchemaModel) -> Self {
        Self { schema }
    }

    /// Validates a record, returning violations in traversal order.
    pub fn validate(&self, record: &Record) -> Vec<Violation> {
        self.validate_fields(record.id(), record.fields())
    }

    /// Validates a raw object that will carry `record_id`.
    pub fn validate_fields(&self, record_id: RecordId, fields: &Map<String, Value>) -> Vec<Violation> {
        let mut out = Vec::new();
        let walk = Walk {
            record_id,
            out: &mut out,
        };
        walk.object(self.schema.fields(), fields, &FieldPath::root());
        out
    }

    pub fn is_valid(&self, record: &Record) -> bool {
        self.validate(record).is_empty()
    }
}

/// Shorthand for `Validator::new(schema).validate(record)`
pub fn validate(record: &Record, schema: &SchemaModel) -> Vec<Violation> {
    Validator::new(schema).validate(record)
}

pub fn is_valid(record: &Record, schema: &SchemaModel) -> bool {
    validate(record, schema).is_empty()
}

struct Walk<'o> {
    record_id: RecordId,
    out: &'o mut Vec<Violation>,
}

impl Walk<'_> {
    fn object(mut self, fields: &FieldMap, obj: &Map<String, Value>, path: &FieldPath) -> Self {
        for spec in fields {
            let field_path = path.child(PathSegment::Key(spec.name.clone()));
            match obj.get(&spec.name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        self.out
                            .push(Violation::missing_required(self.record_id, field_path));
                    }
                }
                Some(value) => {
                    self = self.value(&spec.field_type, value, &field_path);
                }
            }
        }

        for key in obj.keys().filter(|k| !fields.contains(k)) {
            let field_path = path.child(PathSegment::Key(key.clone()));
            self.out
                .push(Violation::unknown_field(self.record_id, field_path));
        }
        self
    }

    fn value(self, expected: &TypeDescriptor, value: &Value, path: &FieldPath) -> Self {
        match expected {
            TypeDescriptor::Dict(Some(fields)) => match value.as_object() {
                Some(obj) => self.object(fields, obj, path),
                None => self.mismatch(expected, value, path),
            },
            TypeDescriptor::List(Some(element)) => match value.as_array() {
                Some(items) => items.iter().enumerate().fold(self, |walk, (i, item)| {
                    walk.value(element, item, &path.child(PathSegment::Index(i)))
                }),
                None => self.mismatch(expected, value, path),
            },
            _ => match coerce(expected, value) {
                Ok(_) => self,
                Err(CoercionError::TypeMismatch {
                    path: relative,
                    expected: expected_name,
                    found,
                }) => {
                    self.out.push(Violation::type_mismatch(
                        self.record_id,
                        path.join(&relative),
                        expected_name,
                        found,
                    ));
                    self
                }
                Err(_) => self.mismatch(expected, value, path),
            },
        }
    }

    fn mismatch(self, expected: &TypeDescriptor, value: &Value, path: &FieldPath) -> Self {
        self.out.push(Violation::type_mismatch(
            self.record_id,
            path.clone(),
            expected.type_name(),
            json_type_name(value),
        ));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ViolationKind;
    use serde_json::json;

    fn schema() -> SchemaModel {
        SchemaModel::parse(&json!({
            "__meta__": {
                "name": {"type": "str", "required": true},
                "age": {"type": "int"},
                "address": {
                    "type": "dict",
                    "required": true,
                    "fields": {
                        "city": {"type": "str", "required": true},
                        "zipcode": {"type": "str"}
                    }
                },
                "tags": {"type": "list[str]"},
                "contacts": {
                    "type": "list[dict]",
                    "fields": {"phone": {"type": "str", "required": true}}
                }
            }
        }))
        .unwrap()
    }

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => Record::new(RecordId(1), map),
            _ => panic!("fixture must be an object"),
        }
    }

    fn kinds_and_paths(violations: &[Violation]) -> Vec<(ViolationKind, String)> {
        violations
            .iter()
            .map(|v| (v.kind, v.field_path.to_string()))
            .collect()
    }

    #[test]
    fn test_valid_record_passes() {
        let schema = schema();
        let rec = record(json!({
            "name": "Ana",
            "address": {"city": "Lisbon"},
            "tags": ["a", "b"],
            "contacts": [{"phone": "123"}]
        }));
        assert!(Validator::new(&schema).is_valid(&rec));
    }

    #[test]
    fn test_optional_absent_or_null_is_silent() {
        let schema = schema();
        let rec = record(json!({"name": "Ana", "age": null, "address": {"city": "X"}}));
        assert!(validate(&rec, &schema).is_empty());
    }

    #[test]
    fn test_required_null_is_missing_not_mismatch() {
        let schema = schema();
        let rec = record(json!({"name": null, "address": {"city": "X"}}));
        let violations = validate(&rec, &schema);
        assert_eq!(
            kinds_and_paths(&violations),
            vec![(ViolationKind::MissingRequired, "name".to_string())]
        );
    }

    #[test]
    fn test_traversal_order_is_depth_first_schema_order() {
        let schema = schema();
        let rec = record(json!({
            "zzz": 1,
            "age": "thirty",
            "address": {"zipcode": 1000, "floor": 3},
            "tags": ["ok", 7, null],
            "contacts": [{"phone": "1"}, {"fax": "2"}, "bad"],
        }));

        let violations = validate(&rec, &schema);
        assert_eq!(
            kinds_and_paths(&violations),
            vec![
                (ViolationKind::MissingRequired, "name".to_string()),
                (ViolationKind::TypeMismatch, "age".to_string()),
                (ViolationKind::MissingRequired, "address.city".to_string()),
                (ViolationKind::TypeMismatch, "address.zipcode".to_string()),
                (ViolationKind::UnknownField, "address.floor".to_string()),
                (ViolationKind::TypeMismatch, "tags[1]".to_string()),
                (ViolationKind::TypeMismatch, "tags[2]".to_string()),
                (ViolationKind::MissingRequired, "contacts[1].phone".to_string()),
                (ViolationKind::UnknownField, "contacts[1].fax".to_string()),
                (ViolationKind::TypeMismatch, "contacts[2]".to_string()),
                (ViolationKind::UnknownField, "zzz".to_string()),
            ]
        );
    }

    #[test]
    fn test_type_mismatch_carries_expected_type() {
        let schema = schema();
        let rec = record(json!({"name": "Ana", "age": "30", "address": {"city": "X"}}));
        let violations = validate(&rec, &schema);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].expected.as_deref(), Some("int"));
        assert_eq!(violations[0].field_path, FieldPath::root().key("age"));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let schema = schema();
        let rec = record(json!({"age": 1.5, "extra": true}));
        let first = validate(&rec, &schema);
        let second = validate(&rec, &schema);
        assert_eq!(first, second);
        assert!(!is_valid(&rec, &schema));
    }
}
