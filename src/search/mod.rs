//! Search subsystem
//!
//! Substring search across nested record values with cyclic next/previous
//! navigation.
//!
//! # Design Principles
//!
//! - Derived state only; the record store stays the source of truth
//! - Fed by drained store events, never by references into the store
//! - Re-flattening is deferred until a record is next searched

mod index;
mod query;

pub use index::SearchIndex;
pub use query::{SearchMatch, SearchQuery};
