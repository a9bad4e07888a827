//! Edit intents and reversible commands
//!
//! An `Intent` is what the caller asks for. Executing it against the store
//! yields a `Command` that carries both directions of the edit, so undo
//! and redo never re-derive anything from current state.

use serde_json::Value;

use crate::record::{Record, RecordId};
use crate::schema::FieldPath;
use crate::store::{FieldUpdate, RecordStore, RemovedRecord, StoreResult};

/// Requested edit
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    AddRecord,
    RemoveRecord(RecordId),
    SetField {
        record_id: RecordId,
        path: FieldPath,
        value: Value,
    },
    /// Several edits undone and redone as one step
    Batch(Vec<Intent>),
}

impl Intent {
    pub fn set_field(record_id: RecordId, path: FieldPath, value: Value) -> Self {
        Intent::SetField {
            record_id,
            path,
            value,
        }
    }
}

/// Self-contained, reversible edit
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddRecord {
        position: usize,
        record: Record,
    },
    RemoveRecord {
        position: usize,
        record: Record,
    },
    SetField {
        record_id: RecordId,
        /// Concrete path; appends are pinned to the index they filled
        path: FieldPath,
        /// `None` when the edit created the slot
        old_value: Option<Value>,
        new_value: Value,
    },
    Batch(Vec<Command>),
}

/// What executing an intent did
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Added(RecordId),
    Removed(RemovedRecord),
    FieldSet(FieldUpdate),
    Batch(Vec<Outcome>),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddRecord { .. } => "add_record",
            Command::RemoveRecord { .. } => "remove_record",
            Command::SetField { .. } => "set_field",
            Command::Batch(_) => "batch",
        }
    }

    /// Records this command touches, in application order
    pub fn record_ids(&self) -> Vec<RecordId> {
        match self {
            Command::AddRecord { record, .. } | Command::RemoveRecord { record, .. } => {
                vec![record.id()]
            }
            Command::SetField { record_id, .. } => vec![*record_id],
            Command::Batch(commands) => {
                let mut ids: Vec<RecordId> = Vec::new();
                for id in commands.iter().flat_map(Command::record_ids) {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                ids
            }
        }
    }

    /// Re-applies the edit
    pub(crate) fn apply(&self, store: &mut RecordStore) -> StoreResult<()> {
        match self {
            Command::AddRecord { position, record } => store.reinsert(*position, record.clone()),
            Command::RemoveRecord { record, .. } => store.remove(record.id()).map(|_| ()),
            Command::SetField {
                record_id,
                path,
                new_value,
                ..
            } => store
                .restore_field(*record_id, path, Some(new_value.clone()))
                .map(|_| ()),
            Command::Batch(commands) => commands.iter().try_for_each(|c| c.apply(store)),
        }
    }

    /// Applies the inverse of the edit
    pub(crate) fn revert(&self, store: &mut RecordStore) -> StoreResult<()> {
        match self {
            Command::AddRecord { record, .. } => store.remove(record.id()).map(|_| ()),
            Command::RemoveRecord { position, record } => {
                store.reinsert(*position, record.clone())
            }
            Command::SetField {
                record_id,
                path,
                old_value,
                ..
            } => store
                .restore_field(*record_id, path, old_value.clone())
                .map(|_| ()),
            Command::Batch(commands) => commands.iter().rev().try_for_each(|c| c.revert(store)),
        }
    }
}
