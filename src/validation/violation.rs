//! Violation findings

use std::fmt;

use serde::Serialize;

use crate::record::RecordId;
use crate::schema::FieldPath;

/// Category of schema non-conformance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Required field absent or null
    MissingRequired,
    /// Present value does not fit its declared type
    TypeMismatch,
    /// Field present in the record but not declared at that scope
    UnknownField,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::MissingRequired => "missing_required",
            ViolationKind::TypeMismatch => "type_mismatch",
            ViolationKind::UnknownField => "unknown_field",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single schema non-conformance finding for a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub record_id: RecordId,
    pub field_path: FieldPath,
    pub kind: ViolationKind,
    /// Declared type, for type mismatches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    pub detail: String,
}

impl Violation {
    pub fn missing_required(record_id: RecordId, field_path: FieldPath) -> Self {
        Self {
            record_id,
            detail: format!("required field '{}' is missing", field_path),
            field_path,
            kind: ViolationKind::MissingRequired,
            expected: None,
        }
    }

    pub fn type_mismatch(
        record_id: RecordId,
        field_path: FieldPath,
        expected: impl Into<String>,
        found: &str,
    ) -> Self {
        let expected = expected.into();
        Self {
            record_id,
            detail: format!("field '{}': expected {}, found {}", field_path, expected, found),
            field_path,
            kind: ViolationKind::TypeMismatch,
            expected: Some(expected),
        }
    }

    pub fn unknown_field(record_id: RecordId, field_path: FieldPath) -> Self {
        Self {
            record_id,
            detail: format!("field '{}' is not declared in the model", field_path),
            field_path,
            kind: ViolationKind::UnknownField,
            expected: None,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] record {}: {}", self.kind, self.record_id, self.detail)
    }
}
