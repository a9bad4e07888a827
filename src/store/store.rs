//! Record store
//!
//! Sole owner of the ordered record sequence and the bound schema. Every
//! mutation goes through here, is re-validated, and queues a change event.
//!
//! # Invariants
//!
//! - Record ids are unique and never reused
//! - Invalid records are stored and flagged, never rejected
//! - Field edits always store what the caller sent; mismatches are flagged
//! - Unknown fields survive schema changes untouched

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::{debug, info, trace};

use super::errors::{StoreError, StoreResult};
use super::events::StoreEvent;
use super::export::ordered_object;
use super::load::{LoadCursor, LoadReport, LoadStep};
use super::navigate;
use crate::coerce::{coerce, default_object};
use crate::record::{Record, RecordId};
use crate::schema::{FieldPath, PathSegment, SchemaModel, TypeDescriptor};
use crate::validation::{Validator, Violation};

/// A removed record with the position it occupied
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedRecord {
    pub position: usize,
    pub record: Record,
}

/// Outcome of a field edit
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    /// Concrete path written; an append resolves to the index it filled
    pub path: FieldPath,
    /// Previous value, `None` if the slot was created
    pub old_value: Option<Value>,
    /// Value now stored
    pub new_value: Value,
    /// Whether the value fit its declared type
    pub coerced: bool,
    /// Violations of the whole record after the edit
    pub violations_after: Vec<Violation>,
}

/// Ordered collection of records bound to a schema
#[derive(Debug, Default)]
pub struct RecordStore {
    schema: Option<SchemaModel>,
    records: Vec<Record>,
    /// Sequence position of every record
    positions: HashMap<RecordId, usize>,
    /// Violations of flagged records only
    flagged: HashMap<RecordId, Vec<Violation>>,
    next_id: u64,
    events: Vec<StoreEvent>,
}

impl RecordStore {
    /// Creates an empty store with no schema bound
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(schema: SchemaModel) -> Self {
        Self {
            schema: Some(schema),
            ..Self::default()
        }
    }

    pub fn schema(&self) -> Option<&SchemaModel> {
        self.schema.as_ref()
    }

    /// Replaces the bound schema and re-validates every record.
    ///
    /// Record contents are not touched.
    pub fn rebind_schema(&mut self, schema: SchemaModel) {
        self.schema = Some(schema);
        self.flagged.clear();
        for i in 0..self.records.len() {
            self.revalidate_at(i);
        }
        self.events.push(StoreEvent::Reset);
        info!(
            records = self.records.len(),
            flagged = self.flagged.len(),
            "schema rebound"
        );
    }

    /// Replaces the collection with `raw`, validating every record.
    ///
    /// # Errors
    ///
    /// - `NoSchemaBound` if no schema is bound
    /// - `NotAnObject` if an element is not a JSON object; nothing is loaded
    pub fn load(&mut self, raw: Vec<Value>) -> StoreResult<LoadReport> {
        let mut cursor = self.begin_load(raw, None)?;
        while let LoadStep::Batch { .. } = self.load_batch(&mut cursor)? {}
        Ok(cursor.into_report())
    }

    /// Starts a batched load, clearing the collection.
    ///
    /// `chunk_size` of `None` loads everything in a single batch, and the
    /// whole input is checked before the collection is cleared.
    pub fn begin_load(&mut self, raw: Vec<Value>, chunk_size: Option<usize>) -> StoreResult<LoadCursor> {
        if self.schema.is_none() {
            return Err(StoreError::NoSchemaBound);
        }
        if chunk_size.is_none() {
            if let Some(position) = raw.iter().position(|v| !v.is_object()) {
                return Err(StoreError::NotAnObject { position });
            }
        }

        self.records.clear();
        self.positions.clear();
        self.flagged.clear();
        self.events.push(StoreEvent::Reset);
        debug!(total = raw.len(), ?chunk_size, "load started");
        Ok(LoadCursor::new(raw, chunk_size))
    }

    /// Commits the next batch of a load.
    ///
    /// A batch holding a non-object is rejected whole and the rest of the
    /// input is discarded; earlier batches stay committed.
    pub fn load_batch(&mut self, cursor: &mut LoadCursor) -> StoreResult<LoadStep> {
        if self.schema.is_none() {
            return Err(StoreError::NoSchemaBound);
        }

        let batch = cursor.next_batch();
        if batch.is_empty() {
            info!(
                accepted = cursor.report.accepted,
                flagged = cursor.report.flagged(),
                "load finished"
            );
            return Ok(LoadStep::Finished);
        }

        if let Some(offset) = batch.iter().position(|v| !v.is_object()) {
            let position = cursor.position + offset;
            cursor.abandon();
            return Err(StoreError::NotAnObject { position });
        }

        let committed = batch.len();
        for fields in batch.into_iter().filter_map(into_fields) {
            let id = self.allocate_id();
            let position = self.push(Record::new(id, fields));
            let violations = self.revalidate_at(position);
            if !violations.is_empty() {
                cursor.report.violations.insert(id, violations);
            }
            self.events.push(StoreEvent::Inserted(id));
        }

        cursor.position += committed;
        cursor.report.accepted += committed;
        debug!(committed, remaining = cursor.remaining(), "load batch committed");

        Ok(LoadStep::Batch {
            committed,
            remaining: cursor.remaining(),
        })
    }

    /// Appends a record with every schema field defaulted.
    pub fn add(&mut self) -> StoreResult<RecordId> {
        let schema = self.schema.as_ref().ok_or(StoreError::NoSchemaBound)?;
        let fields = default_object(schema.fields());

        let id = self.allocate_id();
        let position = self.push(Record::new(id, fields));
        self.revalidate_at(position);
        self.events.push(StoreEvent::Inserted(id));
        debug!(%id, "record added");
        Ok(id)
    }

    /// Removes a record, returning it with its former position.
    pub fn remove(&mut self, id: RecordId) -> StoreResult<RemovedRecord> {
        let position = self.position(id).ok_or(StoreError::NotFound(id))?;
        let record = self.records.remove(position);
        self.positions.remove(&id);
        self.reindex_from(position);
        self.flagged.remove(&id);
        self.events.push(StoreEvent::Removed(id));
        debug!(%id, position, "record removed");
        Ok(RemovedRecord { position, record })
    }

    /// Puts a previously removed record back, keeping its id.
    ///
    /// Positions past the end append.
    pub fn reinsert(&mut self, position: usize, record: Record) -> StoreResult<()> {
        let id = record.id();
        if self.position(id).is_some() {
            return Err(StoreError::DuplicateId(id));
        }

        let position = position.min(self.records.len());
        self.next_id = self.next_id.max(id.0 + 1);
        self.records.insert(position, record);
        self.reindex_from(position);
        self.revalidate_at(position);
        self.events.push(StoreEvent::Inserted(id));
        debug!(%id, position, "record reinserted");
        Ok(())
    }

    /// Sets the value at `path`, coercing it when the path has a declared type.
    ///
    /// A final `"+"` segment appends to a list. Appending to a declared list
    /// that is absent or null creates it with the value as its only element.
    /// If coercion fails the raw value is stored anyway and the mismatch
    /// shows up in `violations_after`.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown id
    /// - `InvalidPath` if the path does not address an existing container
    pub fn set_field(&mut self, id: RecordId, path: &FieldPath, value: Value) -> StoreResult<FieldUpdate> {
        let schema = self.schema.as_ref().ok_or(StoreError::NoSchemaBound)?;
        let position = self.position(id).ok_or(StoreError::NotFound(id))?;

        let (new_value, coerced) = match schema.describe(path) {
            Some(declared) => match coerce(declared, &value) {
                Ok(accepted) => (accepted, true),
                Err(e) => {
                    trace!(%id, %path, error = %e, "storing value that does not fit its type");
                    (value, false)
                }
            },
            None => (value, true),
        };

        let (path, new_value) = match missing_list(schema, self.records[position].fields(), path) {
            Some(list_path) => (list_path, Value::Array(vec![new_value])),
            None => (path.clone(), new_value),
        };

        let written = navigate::write(self.records[position].fields_mut(), &path, new_value.clone())?;
        let violations_after = self.revalidate_at(position);
        self.events.push(StoreEvent::Updated(id));
        trace!(%id, path = %written.path, "field set");

        Ok(FieldUpdate {
            path: written.path,
            old_value: written.old_value,
            new_value,
            coerced,
            violations_after,
        })
    }

    /// Returns a slot to a prior state without coercion.
    ///
    /// `None` deletes the slot. Used to replay history.
    pub(crate) fn restore_field(
        &mut self,
        id: RecordId,
        path: &FieldPath,
        value: Option<Value>,
    ) -> StoreResult<Vec<Violation>> {
        let position = self.position(id).ok_or(StoreError::NotFound(id))?;
        navigate::restore(self.records[position].fields_mut(), path, value)?;
        let violations = self.revalidate_at(position);
        self.events.push(StoreEvent::Updated(id));
        Ok(violations)
    }

    /// Value currently stored at `path`
    pub fn value_at(&self, id: RecordId, path: &FieldPath) -> StoreResult<Option<&Value>> {
        let record = self.get(id).ok_or(StoreError::NotFound(id))?;
        Ok(navigate::read(record.fields(), path))
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.position(id).map(|position| &self.records[position])
    }

    /// Sequence position of a record
    pub fn position(&self, id: RecordId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    /// Records in sequence order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.records.iter().map(Record::id).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Current violations of one record; empty when valid or unknown
    pub fn violations(&self, id: RecordId) -> &[Violation] {
        self.flagged.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Flagged records in sequence order
    pub fn flagged(&self) -> Vec<(RecordId, &[Violation])> {
        self.records
            .iter()
            .filter_map(|r| {
                self.flagged
                    .get(&r.id())
                    .map(|v| (r.id(), v.as_slice()))
            })
            .collect()
    }

    /// Data document: records in sequence order, keys in schema order with
    /// unknown keys after.
    pub fn export_records(&self) -> Value {
        let records = self
            .records
            .iter()
            .map(|record| match &self.schema {
                Some(schema) => Value::Object(ordered_object(schema.fields(), record.fields())),
                None => record.to_value(),
            })
            .collect();
        Value::Array(records)
    }

    /// Takes queued change events, oldest first
    pub fn drain_events(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.events)
    }

    fn push(&mut self, record: Record) -> usize {
        let position = self.records.len();
        self.positions.insert(record.id(), position);
        self.records.push(record);
        position
    }

    fn reindex_from(&mut self, start: usize) {
        for (position, record) in self.records.iter().enumerate().skip(start) {
            self.positions.insert(record.id(), position);
        }
    }

    fn allocate_id(&mut self) -> RecordId {
        let id = RecordId(self.next_id);
        self.next_id += 1;
        id
    }

    fn revalidate_at(&mut self, position: usize) -> Vec<Violation> {
        let record = &self.records[position];
        let violations = match &self.schema {
            Some(schema) => Validator::new(schema).validate(record),
            None => Vec::new(),
        };

        if violations.is_empty() {
            self.flagged.remove(&record.id());
        } else {
            self.flagged.insert(record.id(), violations.clone());
        }
        violations
    }
}

/// Path of a declared list that an append would have to create
fn missing_list(schema: &SchemaModel, fields: &Map<String, Value>, path: &FieldPath) -> Option<FieldPath> {
    let (parents, last) = path.split_last()?;
    if !matches!(last, PathSegment::Append) {
        return None;
    }
    let list_path: FieldPath = parents.iter().cloned().collect();
    if list_path.is_empty() || !matches!(schema.describe(&list_path), Some(TypeDescriptor::List(_))) {
        return None;
    }
    match navigate::read(fields, &list_path) {
        None | Some(Value::Null) => Some(list_path),
        Some(_) => None,
    }
}

/// Unwraps a JSON object into record fields
fn into_fields(value: Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}
