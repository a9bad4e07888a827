//! Record store error types
//!
//! Error codes:
//! - STORE_NO_SCHEMA_BOUND
//! - STORE_NOT_FOUND
//! - STORE_INVALID_PATH
//! - STORE_NOT_AN_OBJECT
//! - STORE_DUPLICATE_ID
//!
//! Apart from `NotAnObject`, these indicate caller misuse (stale id,
//! malformed path), not recoverable data states.

use thiserror::Error;

use crate::record::RecordId;
use crate::schema::FieldPath;

/// Result type for record store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Operation needs a schema and none is bound
    #[error("no schema bound to the record store")]
    NoSchemaBound,

    /// No record with this id
    #[error("record {0} not found")]
    NotFound(RecordId),

    /// Path does not address an existing container
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: FieldPath, reason: String },

    /// Raw data record is not a JSON object
    #[error("data record at position {position} is not a JSON object")]
    NotAnObject { position: usize },

    /// Reinsertion of an id that is already live
    #[error("record {0} already exists")]
    DuplicateId(RecordId),
}

impl StoreError {
    pub fn invalid_path(path: &FieldPath, reason: impl Into<String>) -> Self {
        StoreError::InvalidPath {
            path: path.clone(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NoSchemaBound => "STORE_NO_SCHEMA_BOUND",
            StoreError::NotFound(_) => "STORE_NOT_FOUND",
            StoreError::InvalidPath { .. } => "STORE_INVALID_PATH",
            StoreError::NotAnObject { .. } => "STORE_NOT_AN_OBJECT",
            StoreError::DuplicateId(_) => "STORE_DUPLICATE_ID",
        }
    }
}
