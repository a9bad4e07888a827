//! CLI module for recordforge
//!
//! The reference caller of the engine: it owns all file I/O.
//! - validate: Load and report violations
//! - export: Print or atomically save the data in model order
//! - search: One-shot search
//! - session: JSON-lines editing loop over stdin/stdout

mod args;
mod commands;
mod errors;
mod io;
mod save;
mod session;

pub use args::{Cli, Command, Documents};
pub use commands::{export, open, run, run_command, search, session, validate};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_requests, write_error, write_response};
pub use save::{save_document, SaveReport};
pub use session::{Request, Session};
