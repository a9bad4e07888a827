//! Schema model subsystem
//!
//! Parses a model document's `__meta__` block into a typed schema tree.
//!
//! # Design Principles
//!
//! - Immutable once built; reloading a model builds a new schema
//! - Field order follows the model document
//! - No partial schema on error

mod errors;
mod loader;
mod path;
mod types;

pub use errors::{SchemaError, SchemaResult};
pub use loader::{parse_type_string, MAX_TYPE_NESTING, META_KEY};
pub use path::{FieldPath, PathSegment, APPEND_TOKEN};
pub use types::{FieldMap, FieldSpec, PrimitiveKind, SchemaModel, TypeDescriptor};
