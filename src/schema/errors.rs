//! Schema error types
//!
//! Error codes:
//! - SCHEMA_MALFORMED_META
//! - SCHEMA_BAD_TYPE_STRING
//!
//! Schema errors are fatal to model loading: no partial schema is bound.

use thiserror::Error;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Model document could not be turned into a schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// `__meta__` missing, not an object, or holding a malformed field entry
    #[error("malformed __meta__: {reason}")]
    MalformedMeta { reason: String },

    /// A `type` string outside the type grammar
    #[error("bad type string '{type_string}' for field '{field}'")]
    BadTypeString { field: String, type_string: String },
}

impl SchemaError {
    pub fn malformed_meta(reason: impl Into<String>) -> Self {
        SchemaError::MalformedMeta {
            reason: reason.into(),
        }
    }

    pub fn bad_type_string(field: impl Into<String>, type_string: impl Into<String>) -> Self {
        SchemaError::BadTypeString {
            field: field.into(),
            type_string: type_string.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::MalformedMeta { .. } => "SCHEMA_MALFORMED_META",
            SchemaError::BadTypeString { .. } => "SCHEMA_BAD_TYPE_STRING",
        }
    }
}
