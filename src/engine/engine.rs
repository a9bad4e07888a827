//! Engine facade
//!
//! Wires the record store, command history and search index together
//! behind the caller-facing operations. Every mutation goes through the
//! history; store events are drained into the index after each call.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, info};

use super::config::EngineConfig;
use super::errors::{EngineError, EngineResult};
use crate::history::{Command, CommandHistory, Intent, Outcome};
use crate::record::RecordId;
use crate::schema::{FieldPath, SchemaModel, TypeDescriptor};
use crate::search::{SearchIndex, SearchMatch, SearchQuery};
use crate::store::{FieldUpdate, LoadCursor, LoadReport, LoadStep, RecordStore, RemovedRecord};
use crate::validation::{Violation, ViolationKind};

/// Schema-validated record editing engine
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    store: RecordStore,
    history: CommandHistory,
    index: SearchIndex,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let history = CommandHistory::new(config.history.max_depth);
        Self {
            config,
            store: RecordStore::new(),
            history,
            index: SearchIndex::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parses model text and binds it, re-validating loaded records.
    ///
    /// On error the previously bound schema stays in place.
    pub fn load_model(&mut self, text: &str) -> EngineResult<&SchemaModel> {
        let schema = SchemaModel::parse_str(text)?;
        self.bind(schema)
    }

    pub fn load_model_value(&mut self, model_doc: &Value) -> EngineResult<&SchemaModel> {
        let schema = SchemaModel::parse(model_doc)?;
        self.bind(schema)
    }

    fn bind(&mut self, schema: SchemaModel) -> EngineResult<&SchemaModel> {
        info!(fields = schema.fields().len(), "model bound");
        self.store.rebind_schema(schema);
        self.history.clear();
        self.sync();
        self.store
            .schema()
            .ok_or_else(|| EngineError::from(crate::store::StoreError::NoSchemaBound))
    }

    /// Replaces the collection in one pass.
    pub fn load_data(&mut self, raw: Vec<Value>) -> EngineResult<LoadReport> {
        let result = self.store.load(raw);
        self.sync();
        let report = result?;
        self.history.clear();

        self.index.rebuild(&self.store);
        info!(
            accepted = report.accepted,
            flagged = report.flagged(),
            "data loaded"
        );
        Ok(report)
    }

    /// Replaces the collection from a data document (a JSON array).
    pub fn load_data_value(&mut self, data_doc: Value) -> EngineResult<LoadReport> {
        let raw = into_records(data_doc)?;
        self.load_data(raw)
    }

    pub fn load_data_str(&mut self, text: &str) -> EngineResult<LoadReport> {
        let data_doc: Value = serde_json::from_str(text)
            .map_err(|e| EngineError::invalid_data(format!("not valid JSON: {}", e)))?;
        self.load_data_value(data_doc)
    }

    /// Starts a batched load sized by `load.chunk_size`.
    ///
    /// Advance with [`load_next_batch`](Self::load_next_batch); dropping the
    /// cursor abandons the rest of the input.
    pub fn begin_load_data(&mut self, raw: Vec<Value>) -> EngineResult<LoadCursor> {
        let result = self.store.begin_load(raw, self.config.load.chunk_size);
        self.sync();
        let cursor = result?;
        self.history.clear();
        Ok(cursor)
    }

    pub fn load_next_batch(&mut self, cursor: &mut LoadCursor) -> EngineResult<LoadStep> {
        let result = self.store.load_batch(cursor);
        self.sync();
        let step = result?;
        if let LoadStep::Batch {
            committed,
            remaining,
        } = step
        {
            debug!(committed, remaining, "load progress");
        }
        Ok(step)
    }

    /// Appends a record with every field defaulted.
    pub fn add(&mut self) -> EngineResult<RecordId> {
        let result = self.history.add_record(&mut self.store);
        self.sync();
        Ok(result?)
    }

    pub fn remove(&mut self, id: RecordId) -> EngineResult<RemovedRecord> {
        let result = self.history.remove_record(&mut self.store, id);
        self.sync();
        Ok(result?)
    }

    /// Sets the value at `path`; a mismatch is stored and flagged.
    pub fn set_field(&mut self, id: RecordId, path: &FieldPath, value: Value) -> EngineResult<FieldUpdate> {
        let result = self.history.set_field(&mut self.store, id, path, value);
        self.sync();
        Ok(result?)
    }

    /// Executes any intent, including batches, as one undo step.
    pub fn apply(&mut self, intent: Intent) -> EngineResult<Outcome> {
        let result = self.history.execute(&mut self.store, intent);
        self.sync();
        Ok(result?)
    }

    /// Reverts the last edit; `HISTORY_EMPTY` is advisory.
    pub fn undo(&mut self) -> EngineResult<Command> {
        let result = self.history.undo(&mut self.store);
        self.sync();
        Ok(result?)
    }

    pub fn redo(&mut self) -> EngineResult<Command> {
        let result = self.history.redo(&mut self.store);
        self.sync();
        Ok(result?)
    }

    pub fn search(&mut self, query: &SearchQuery) -> Vec<SearchMatch> {
        self.index.search(&self.store, query)
    }

    pub fn search_next(&mut self, query: &SearchQuery, after: Option<&SearchMatch>) -> Option<SearchMatch> {
        self.index.next(&self.store, query, after)
    }

    pub fn search_previous(
        &mut self,
        query: &SearchQuery,
        before: Option<&SearchMatch>,
    ) -> Option<SearchMatch> {
        self.index.previous(&self.store, query, before)
    }

    /// Data document with keys in schema order
    pub fn export_records(&self) -> Value {
        self.store.export_records()
    }

    pub fn schema(&self) -> Option<&SchemaModel> {
        self.store.schema()
    }

    /// Declared type at `path`, `None` for unknown fields or no schema
    pub fn describe(&self, path: &FieldPath) -> Option<&TypeDescriptor> {
        self.store.schema().and_then(|schema| schema.describe(path))
    }

    pub fn violations(&self, id: RecordId) -> &[Violation] {
        self.store.violations(id)
    }

    /// Violations of every flagged record
    pub fn validate_all(&self) -> BTreeMap<RecordId, Vec<Violation>> {
        self.store
            .flagged()
            .into_iter()
            .map(|(id, violations)| (id, violations.to_vec()))
            .collect()
    }

    /// Violations that must be fixed before saving.
    ///
    /// Empty unless `validation.block_save_on_unknown_fields` is set, in
    /// which case every unknown field blocks.
    pub fn save_blockers(&self) -> Vec<Violation> {
        if !self.config.validation.block_save_on_unknown_fields {
            return Vec::new();
        }
        self.store
            .flagged()
            .into_iter()
            .flat_map(|(_, violations)| violations.iter())
            .filter(|v| v.kind == ViolationKind::UnknownField)
            .cloned()
            .collect()
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    fn sync(&mut self) {
        let events = self.store.drain_events();
        self.index.apply_events(&events);
    }
}

fn into_records(data_doc: Value) -> EngineResult<Vec<Value>> {
    match data_doc {
        Value::Array(raw) => Ok(raw),
        other => Err(EngineError::invalid_data(format!(
            "expected a JSON array of records, found {}",
            crate::coerce::json_type_name(&other)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MODEL: &str = r#"{
        "__meta__": {
            "name": {"type": "str", "required": true},
            "age": {"type": "int", "required": false}
        }
    }"#;

    fn engine() -> Engine {
        let mut engine = Engine::new();
        engine.load_model(MODEL).unwrap();
        engine
    }

    #[test]
    fn test_load_data_requires_array() {
        let mut engine = engine();
        let err = engine.load_data_value(json!({"name": "x"})).unwrap_err();
        assert_eq!(err.code(), "ENGINE_INVALID_DATA");
        let err = engine.load_data_str("[{").unwrap_err();
        assert_eq!(err.code(), "ENGINE_INVALID_DATA");
    }

    #[test]
    fn test_bad_model_keeps_previous_schema() {
        let mut engine = engine();
        let err = engine.load_model(r#"{"__meta__": {"a": {"type": "list[date]"}}}"#).unwrap_err();
        assert_eq!(err.code(), "SCHEMA_BAD_TYPE_STRING");
        assert!(engine.schema().unwrap().field("name").is_some());
    }

    #[test]
    fn test_loading_clears_history() {
        let mut engine = engine();
        engine.load_data(vec![json!({"name": "Ana"})]).unwrap();
        engine.add().unwrap();
        assert!(engine.history().can_undo());

        engine.load_data(vec![json!({"name": "Rui"})]).unwrap();
        assert!(!engine.history().can_undo());
    }

    #[test]
    fn test_rejected_load_keeps_records_and_history() {
        let mut engine = engine();
        engine
            .load_data(vec![json!({"name": "Ana"}), json!({"name": "Rui"})])
            .unwrap();
        engine.add().unwrap();
        let before = engine.export_records();

        let err = engine.load_data(vec![json!({"name": "X"}), json!(5)]).unwrap_err();
        assert_eq!(err.code(), "STORE_NOT_AN_OBJECT");
        assert_eq!(engine.store().len(), 3);
        assert_eq!(engine.export_records(), before);
        assert!(engine.history().can_undo());
        assert_eq!(engine.search(&SearchQuery::new("rui")).len(), 1);
    }

    #[test]
    fn test_search_follows_edits_and_undo() {
        let mut engine = engine();
        engine
            .load_data(vec![json!({"name": "Ana Silva"}), json!({"name": "Rui"})])
            .unwrap();
        let rui = engine.store().ids()[1];
        let query = SearchQuery::new("ana");

        engine
            .set_field(rui, &FieldPath::root().key("name"), json!("Ana Souza"))
            .unwrap();
        assert_eq!(engine.search(&query).len(), 2);

        engine.undo().unwrap();
        assert_eq!(engine.search(&query).len(), 1);
    }

    #[test]
    fn test_save_blockers_follow_config() {
        let mut engine = engine();
        engine
            .load_data(vec![json!({"name": "Ana", "nickname": "A"})])
            .unwrap();
        assert!(engine.save_blockers().is_empty());
        assert_eq!(engine.validate_all().len(), 1);

        let mut config = EngineConfig::default();
        config.validation.block_save_on_unknown_fields = true;
        let mut strict = Engine::with_config(config);
        strict.load_model(MODEL).unwrap();
        strict
            .load_data(vec![json!({"name": "Ana", "nickname": "A"})])
            .unwrap();
        let blockers = strict.save_blockers();
        assert_eq!(blockers.len(), 1);
        assert_eq!(blockers[0].field_path, FieldPath::root().key("nickname"));
    }

    #[test]
    fn test_chunked_load_through_engine() {
        let mut config = EngineConfig::default();
        config.load.chunk_size = Some(2);
        let mut engine = Engine::with_config(config);
        engine.load_model(MODEL).unwrap();

        let raw = (0..5).map(|i| json!({"name": format!("n{}", i)})).collect();
        let mut cursor = engine.begin_load_data(raw).unwrap();
        let mut batches = 0;
        while let LoadStep::Batch { .. } = engine.load_next_batch(&mut cursor).unwrap() {
            batches += 1;
        }
        assert_eq!(batches, 3);
        assert_eq!(cursor.loaded(), 5);
        assert_eq!(engine.search(&SearchQuery::new("n4")).len(), 1);
    }

    #[test]
    fn test_operations_need_a_model() {
        let mut engine = Engine::new();
        assert_eq!(engine.add().unwrap_err().code(), "STORE_NO_SCHEMA_BOUND");
        assert_eq!(
            engine.load_data(vec![json!({})]).unwrap_err().code(),
            "STORE_NO_SCHEMA_BOUND"
        );
    }
}
