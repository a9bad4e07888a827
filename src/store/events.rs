//! Change notifications emitted by the record store
//!
//! The store queues one event per committed mutation. Owners of derived
//! state (the search index) drain the queue with
//! [`RecordStore::drain_events`](super::RecordStore::drain_events) and
//! update themselves; nothing holds a reference into the store.

use crate::record::RecordId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    /// Collection replaced or schema rebound; all derived state is stale
    Reset,
    /// Record added or reinserted
    Inserted(RecordId),
    /// Record removed
    Removed(RecordId),
    /// Record contents changed
    Updated(RecordId),
}

impl StoreEvent {
    /// Record touched by this event, if it concerns a single record
    pub fn record_id(&self) -> Option<RecordId> {
        match self {
            StoreEvent::Reset => None,
            StoreEvent::Inserted(id) | StoreEvent::Removed(id) | StoreEvent::Updated(id) => {
                Some(*id)
            }
        }
    }
}
