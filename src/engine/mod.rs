//! Engine subsystem
//!
//! The caller-facing boundary: load a model and data, edit with undo/redo,
//! search, and export. Every failure is a typed `EngineError`.
//!
//! # Design Principles
//!
//! - Explicit configuration passed in, never ambient state
//! - Synchronous; file I/O stays with the caller
//! - Batched loads are the only point where control returns mid-operation

mod config;
mod engine;
mod errors;

pub use config::{EngineConfig, FilesConfig, HistoryConfig, LoadConfig, ValidationConfig};
pub use engine::Engine;
pub use errors::{EngineError, EngineResult};
