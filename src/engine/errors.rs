//! Engine error types
//!
//! Wraps the subsystem errors so every caller-facing operation returns one
//! typed error. `code()` passes through the subsystem's stable code.
//!
//! Error codes (in addition to the wrapped ones):
//! - ENGINE_CONFIG
//! - ENGINE_INVALID_DATA

use thiserror::Error;

use crate::history::HistoryError;
use crate::schema::SchemaError;
use crate::store::StoreError;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    History(#[from] HistoryError),

    /// Configuration missing, unreadable or out of range
    #[error("config error: {reason}")]
    Config { reason: String },

    /// Data document is not a JSON array
    #[error("invalid data document: {reason}")]
    InvalidData { reason: String },
}

impl EngineError {
    pub fn config(reason: impl Into<String>) -> Self {
        EngineError::Config {
            reason: reason.into(),
        }
    }

    pub fn invalid_data(reason: impl Into<String>) -> Self {
        EngineError::InvalidData {
            reason: reason.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Schema(e) => e.code(),
            EngineError::Store(e) => e.code(),
            EngineError::History(e) => e.code(),
            EngineError::Config { .. } => "ENGINE_CONFIG",
            EngineError::InvalidData { .. } => "ENGINE_INVALID_DATA",
        }
    }

    /// True for undo/redo on an empty stack
    pub fn is_advisory(&self) -> bool {
        matches!(self, EngineError::History(e) if e.is_advisory())
    }
}
