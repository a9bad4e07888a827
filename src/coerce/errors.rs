//! Coercion error types
//!
//! Coercion failures are never fatal. The validator turns them into
//! `TypeMismatch` violations and the store keeps the raw value.

use thiserror::Error;

use crate::schema::{FieldPath, PathSegment};

/// Result type for coercion operations
pub type CoercionResult<T> = Result<T, CoercionError>;

/// A value does not fit its declared type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    /// Value shape differs from the declared type.
    ///
    /// `path` is relative to the value handed to the coercer.
    #[error("type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        path: FieldPath,
        expected: String,
        found: &'static str,
    },

    /// A list position past the current end
    #[error("index {index} out of range at '{path}' (length {len})")]
    IndexOutOfRange {
        path: FieldPath,
        index: usize,
        len: usize,
    },
}

impl CoercionError {
    pub fn type_mismatch(expected: impl Into<String>, found: &'static str) -> Self {
        CoercionError::TypeMismatch {
            path: FieldPath::root(),
            expected: expected.into(),
            found,
        }
    }

    /// Prefixes the error path with one segment, used while unwinding recursion
    pub fn within(self, segment: PathSegment) -> Self {
        let prefix = FieldPath::root().child(segment);
        self.under(&prefix)
    }

    /// Prefixes the error path with `prefix`
    pub fn under(self, prefix: &FieldPath) -> Self {
        match self {
            CoercionError::TypeMismatch {
                path,
                expected,
                found,
            } => CoercionError::TypeMismatch {
                path: prefix.join(&path),
                expected,
                found,
            },
            CoercionError::IndexOutOfRange { path, index, len } => {
                CoercionError::IndexOutOfRange {
                    path: prefix.join(&path),
                    index,
                    len,
                }
            }
        }
    }

    pub fn path(&self) -> &FieldPath {
        match self {
            CoercionError::TypeMismatch { path, .. } => path,
            CoercionError::IndexOutOfRange { path, .. } => path,
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            CoercionError::TypeMismatch { .. } => "COERCION_TYPE_MISMATCH",
            CoercionError::IndexOutOfRange { .. } => "COERCION_INDEX_OUT_OF_RANGE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_prefixes_path() {
        let err = CoercionError::type_mismatch("int", "str")
            .within(PathSegment::Index(2))
            .within(PathSegment::Key("tags".into()));
        assert_eq!(err.path(), &FieldPath::root().key("tags").index(2));
        assert!(err.to_string().contains("tags[2]"));
    }
}
