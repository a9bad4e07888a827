//! Type coercion subsystem
//!
//! Checks raw JSON values against type descriptors and materializes
//! default values for new records. Strict: no implicit conversions.

mod coercer;
mod errors;

pub use coercer::{check_index, coerce, default_object, default_value, json_type_name};
pub use errors::{CoercionError, CoercionResult};
