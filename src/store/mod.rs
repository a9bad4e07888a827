//! Record store subsystem
//!
//! Owns the ordered record collection and the bound schema.
//!
//! # Design Principles
//!
//! - Single choke point: every mutation flows through `RecordStore`
//! - Edit toward correctness: invalid data is stored and flagged
//! - Lossless: unknown fields are kept and exported after known ones
//! - Derived state is told about changes through drained events

mod errors;
mod events;
mod export;
mod load;
mod navigate;
mod store;

pub use errors::{StoreError, StoreResult};
pub use events::StoreEvent;
pub use export::ordered_object;
pub use load::{LoadCursor, LoadReport, LoadStep};
pub use store::{FieldUpdate, RecordStore, RemovedRecord};
