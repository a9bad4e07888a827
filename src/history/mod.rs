//! Command history subsystem
//!
//! Records every edit as a reversible command so it can be undone and
//! redone exactly.
//!
//! # Design Principles
//!
//! - Commands are self-contained: both directions are captured at execution
//! - Undo then redo restores the collection byte for byte
//! - Multi-field edits commit as one step through `Intent::Batch`

mod command;
mod errors;
mod history;

pub use command::{Command, Intent, Outcome};
pub use errors::{HistoryError, HistoryResult};
pub use history::{CommandHistory, DEFAULT_MAX_DEPTH};
