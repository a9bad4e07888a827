//! History error types
//!
//! Error codes:
//! - HISTORY_EMPTY (advisory: undo at the bottom of the stack is a normal state)
//! - HISTORY_STORE (the underlying store refused a replayed command)

use thiserror::Error;

use crate::store::StoreError;

/// Result type for history operations
pub type HistoryResult<T> = Result<T, HistoryError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// Nothing to undo or redo
    #[error("history stack is empty")]
    Empty,

    /// Store rejected the edit
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl HistoryError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            HistoryError::Empty => "HISTORY_EMPTY",
            HistoryError::Store(e) => e.code(),
        }
    }

    /// Advisory errors are no-ops the caller may ignore
    pub fn is_advisory(&self) -> bool {
        matches!(self, HistoryError::Empty)
    }
}
