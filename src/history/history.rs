//! Undo/redo command history
//!
//! ## Design
//!
//! - Every mutating store operation runs through `execute`
//! - Undo applies the inverse and moves the command to the redo stack
//! - Redo re-applies the command and moves it back
//! - New commands clear the redo stack
//! - The undo stack is bounded; the oldest command is evicted on overflow

use std::collections::VecDeque;

use serde_json::Value;
use tracing::{debug, warn};

use super::command::{Command, Intent, Outcome};
use super::errors::{HistoryError, HistoryResult};
use crate::record::RecordId;
use crate::schema::FieldPath;
use crate::store::{FieldUpdate, RecordStore, RemovedRecord, StoreError};

/// Default maximum number of undo levels
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// Bounded undo/redo stacks of commands
#[derive(Debug)]
pub struct CommandHistory {
    /// Applied commands, most recent last
    undo_stack: VecDeque<Command>,
    /// Undone commands, most recent last
    redo_stack: Vec<Command>,
    max_depth: usize,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl CommandHistory {
    /// Creates a history keeping at most `max_depth` undo levels (minimum 1)
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Applies an intent to the store and records it for undo.
    ///
    /// A failing batch member rolls back the members already applied;
    /// nothing is recorded.
    pub fn execute(&mut self, store: &mut RecordStore, intent: Intent) -> HistoryResult<Outcome> {
        let (command, outcome) = run(store, intent)?;
        if let Some(command) = command {
            self.push(command);
        }
        Ok(outcome)
    }

    /// Adds a defaulted record as one undo step.
    pub fn add_record(&mut self, store: &mut RecordStore) -> HistoryResult<RecordId> {
        let (command, id) = run_add(store)?;
        self.push(command);
        Ok(id)
    }

    /// Removes a record as one undo step.
    pub fn remove_record(&mut self, store: &mut RecordStore, id: RecordId) -> HistoryResult<RemovedRecord> {
        let (command, removed) = run_remove(store, id)?;
        self.push(command);
        Ok(removed)
    }

    /// Sets a field as one undo step.
    pub fn set_field(
        &mut self,
        store: &mut RecordStore,
        id: RecordId,
        path: &FieldPath,
        value: Value,
    ) -> HistoryResult<FieldUpdate> {
        let (command, update) = run_set(store, id, path, value)?;
        self.push(command);
        Ok(update)
    }

    /// Reverts the most recent command.
    ///
    /// Returns `HistoryError::Empty` when there is nothing to undo.
    pub fn undo(&mut self, store: &mut RecordStore) -> HistoryResult<Command> {
        let command = self.undo_stack.pop_back().ok_or(HistoryError::Empty)?;
        if let Err(e) = command.revert(store) {
            warn!(command = command.name(), error = %e, "undo failed");
            self.undo_stack.push_back(command);
            return Err(e.into());
        }
        debug!(command = command.name(), "command undone");
        self.redo_stack.push(command.clone());
        Ok(command)
    }

    /// Re-applies the most recently undone command.
    ///
    /// Returns `HistoryError::Empty` when there is nothing to redo.
    pub fn redo(&mut self, store: &mut RecordStore) -> HistoryResult<Command> {
        let command = self.redo_stack.pop().ok_or(HistoryError::Empty)?;
        if let Err(e) = command.apply(store) {
            warn!(command = command.name(), error = %e, "redo failed");
            self.redo_stack.push(command);
            return Err(e.into());
        }
        debug!(command = command.name(), "command redone");
        self.undo_stack.push_back(command.clone());
        Ok(command)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Drops all history, e.g. after the collection is reloaded
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn push(&mut self, command: Command) {
        debug!(command = command.name(), "command executed");
        self.undo_stack.push_back(command);
        if self.undo_stack.len() > self.max_depth {
            if let Some(evicted) = self.undo_stack.pop_front() {
                debug!(command = evicted.name(), "oldest command evicted");
            }
        }
        self.redo_stack.clear();
    }
}

fn run_add(store: &mut RecordStore) -> HistoryResult<(Command, RecordId)> {
    let id = store.add()?;
    let position = store.position(id).ok_or(StoreError::NotFound(id))?;
    let record = store.get(id).cloned().ok_or(StoreError::NotFound(id))?;
    Ok((Command::AddRecord { position, record }, id))
}

fn run_remove(store: &mut RecordStore, id: RecordId) -> HistoryResult<(Command, RemovedRecord)> {
    let removed = store.remove(id)?;
    let command = Command::RemoveRecord {
        position: removed.position,
        record: removed.record.clone(),
    };
    Ok((command, removed))
}

fn run_set(
    store: &mut RecordStore,
    id: RecordId,
    path: &FieldPath,
    value: Value,
) -> HistoryResult<(Command, FieldUpdate)> {
    let update = store.set_field(id, path, value)?;
    let command = Command::SetField {
        record_id: id,
        path: update.path.clone(),
        old_value: update.old_value.clone(),
        new_value: update.new_value.clone(),
    };
    Ok((command, update))
}

/// Applies an intent, returning the command to record (none for an empty batch).
fn run(store: &mut RecordStore, intent: Intent) -> HistoryResult<(Option<Command>, Outcome)> {
    match intent {
        Intent::AddRecord => {
            let (command, id) = run_add(store)?;
            Ok((Some(command), Outcome::Added(id)))
        }
        Intent::RemoveRecord(id) => {
            let (command, removed) = run_remove(store, id)?;
            Ok((Some(command), Outcome::Removed(removed)))
        }
        Intent::SetField {
            record_id,
            path,
            value,
        } => {
            let (command, update) = run_set(store, record_id, &path, value)?;
            Ok((Some(command), Outcome::FieldSet(update)))
        }
        Intent::Batch(intents) => {
            let mut commands = Vec::with_capacity(intents.len());
            let mut outcomes = Vec::with_capacity(intents.len());

            for intent in intents {
                match run(store, intent) {
                    Ok((command, outcome)) => {
                        commands.extend(command);
                        outcomes.push(outcome);
                    }
                    Err(e) => {
                        for applied in commands.iter().rev() {
                            if let Err(rollback) = applied.revert(store) {
                                warn!(error = %rollback, "batch rollback failed");
                            }
                        }
                        return Err(e);
                    }
                }
            }

            let command = if commands.is_empty() {
                None
            } else {
                Some(Command::Batch(commands))
            };
            Ok((command, Outcome::Batch(outcomes)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaModel;
    use serde_json::json;

    fn store() -> RecordStore {
        let schema = SchemaModel::parse(&json!({
            "__meta__": {
                "name": {"type": "str", "required": true},
                "tags": {"type": "list[str]"}
            }
        }))
        .unwrap();
        let mut store = RecordStore::with_schema(schema);
        store
            .load(vec![json!({"name": "a"}), json!({"name": "b"}), json!({"name": "c"})])
            .unwrap();
        store
    }

    #[test]
    fn test_empty_stacks_are_advisory() {
        let mut store = store();
        let mut history = CommandHistory::default();
        let err = history.undo(&mut store).unwrap_err();
        assert_eq!(err, HistoryError::Empty);
        assert!(err.is_advisory());
        assert_eq!(history.redo(&mut store).unwrap_err(), HistoryError::Empty);
    }

    #[test]
    fn test_undo_remove_restores_position() {
        let mut store = store();
        let mut history = CommandHistory::default();
        let middle = store.ids()[1];

        history.execute(&mut store, Intent::RemoveRecord(middle)).unwrap();
        assert_eq!(store.len(), 2);

        history.undo(&mut store).unwrap();
        assert_eq!(store.position(middle), Some(1));

        history.redo(&mut store).unwrap();
        assert_eq!(store.position(middle), None);
    }

    #[test]
    fn test_undo_add_then_redo_keeps_id() {
        let mut store = store();
        let mut history = CommandHistory::default();

        let id = history.add_record(&mut store).unwrap();
        history.undo(&mut store).unwrap();
        assert!(store.get(id).is_none());

        history.redo(&mut store).unwrap();
        assert_eq!(store.position(id), Some(3));
    }

    #[test]
    fn test_undo_append_removes_element() {
        let mut store = store();
        let mut history = CommandHistory::default();
        let id = store.ids()[0];

        history
            .execute(
                &mut store,
                Intent::set_field(id, FieldPath::root().key("tags"), json!([])),
            )
            .unwrap();
        history
            .execute(
                &mut store,
                Intent::set_field(id, FieldPath::root().key("tags").append(), json!("x")),
            )
            .unwrap();
        assert_eq!(store.get(id).unwrap().get("tags"), Some(&json!(["x"])));

        history.undo(&mut store).unwrap();
        assert_eq!(store.get(id).unwrap().get("tags"), Some(&json!([])));
        history.undo(&mut store).unwrap();
        assert_eq!(store.get(id).unwrap().get("tags"), None);
    }

    #[test]
    fn test_new_command_clears_redo() {
        let mut store = store();
        let mut history = CommandHistory::default();
        let id = store.ids()[0];

        history
            .execute(&mut store, Intent::set_field(id, FieldPath::root().key("name"), json!("x")))
            .unwrap();
        history.undo(&mut store).unwrap();
        assert!(history.can_redo());

        history
            .execute(&mut store, Intent::set_field(id, FieldPath::root().key("name"), json!("y")))
            .unwrap();
        assert!(!history.can_redo());
    }

    #[test]
    fn test_depth_bound_evicts_oldest() {
        let mut store = store();
        let mut history = CommandHistory::new(2);
        let id = store.ids()[0];

        for name in ["x", "y", "z"] {
            history
                .execute(&mut store, Intent::set_field(id, FieldPath::root().key("name"), json!(name)))
                .unwrap();
        }
        assert_eq!(history.undo_depth(), 2);

        history.undo(&mut store).unwrap();
        history.undo(&mut store).unwrap();
        assert_eq!(history.undo(&mut store).unwrap_err(), HistoryError::Empty);
        assert_eq!(store.get(id).unwrap().get("name"), Some(&json!("x")));
    }

    #[test]
    fn test_failed_batch_rolls_back() {
        let mut store = store();
        let mut history = CommandHistory::default();
        let id = store.ids()[0];
        let before = store.export_records();

        let err = history
            .execute(
                &mut store,
                Intent::Batch(vec![
                    Intent::set_field(id, FieldPath::root().key("name"), json!("changed")),
                    Intent::AddRecord,
                    Intent::set_field(id, FieldPath::root().key("tags").index(5), json!("x")),
                ]),
            )
            .unwrap_err();

        assert_eq!(err.code(), "STORE_INVALID_PATH");
        assert_eq!(store.export_records(), before);
        assert!(!history.can_undo());
    }

    #[test]
    fn test_batch_is_one_undo_step() {
        let mut store = store();
        let mut history = CommandHistory::default();
        let ids = store.ids();
        let before = store.export_records();

        history
            .execute(
                &mut store,
                Intent::Batch(vec![
                    Intent::set_field(ids[0], FieldPath::root().key("name"), json!("A")),
                    Intent::RemoveRecord(ids[2]),
                ]),
            )
            .unwrap();
        assert_eq!(history.undo_depth(), 1);

        let undone = history.undo(&mut store).unwrap();
        assert_eq!(undone.record_ids(), vec![ids[0], ids[2]]);
        assert_eq!(store.export_records(), before);
    }

    #[test]
    fn test_store_errors_pass_through() {
        let mut store = store();
        let mut history = CommandHistory::default();
        let missing = RecordId(404);
        let err = history
            .execute(&mut store, Intent::RemoveRecord(missing))
            .unwrap_err();
        assert_eq!(err, HistoryError::Store(StoreError::NotFound(missing)));
    }
}
