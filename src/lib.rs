//! recordforge - schema-validated editing of JSON record collections
//!
//! A model document's `__meta__` block declares field names, types and
//! required-ness. Records are loaded against it, edited with undo/redo,
//! searched, and exported with keys in model order. Invalid data is kept
//! and flagged rather than rejected.
//!
//! Subsystems, leaves first: `schema`, `coerce`, `validation`, `store`,
//! `history`, `search`, with `engine` as the caller-facing facade and
//! `cli` as the file-backed caller.

pub mod cli;
pub mod coerce;
pub mod engine;
pub mod history;
pub mod record;
pub mod schema;
pub mod search;
pub mod store;
pub mod validation;
