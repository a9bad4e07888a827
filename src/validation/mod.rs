//! Record validation subsystem
//!
//! Produces structured violation lists. Problems found here are data,
//! never errors: invalid records are stored and flagged, not rejected.

mod validator;
mod violation;

pub use validator::{is_valid, validate, Validator};
pub use violation::{Violation, ViolationKind};
