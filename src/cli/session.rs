//! Interactive editing session
//!
//! Each request is a JSON object tagged by `op`:
//!
//! ```text
//! {"op": "add"}
//! {"op": "remove", "id": 3}
//! {"op": "set", "id": 3, "path": ["tags", "+"], "value": "urgent"}
//! {"op": "batch", "edits": [{"op": "set", ...}, {"op": "add"}]}
//! {"op": "undo"} / {"op": "redo"}
//! {"op": "search", "term": "ana", "case_sensitive": false}
//! {"op": "next"} / {"op": "previous"}
//! {"op": "violations"} / {"op": "violations", "id": 3}
//! {"op": "export"} / {"op": "save"}
//! ```

use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::errors::{CliError, CliResult};
use super::save::save_document;
use crate::engine::{Engine, EngineError};
use crate::history::{Command, Intent, Outcome};
use crate::record::RecordId;
use crate::schema::FieldPath;
use crate::search::{SearchMatch, SearchQuery};
use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Add,
    Remove {
        id: RecordId,
    },
    Set {
        id: RecordId,
        path: FieldPath,
        value: Value,
    },
    Batch {
        edits: Vec<Request>,
    },
    Undo,
    Redo,
    Search {
        term: String,
        #[serde(default)]
        case_sensitive: bool,
    },
    Next,
    Previous,
    Violations {
        #[serde(default)]
        id: Option<RecordId>,
    },
    Export,
    Save,
}

impl Request {
    /// Edit requests as history intents; other ops cannot be batched
    fn into_intent(self) -> CliResult<Intent> {
        match self {
            Request::Add => Ok(Intent::AddRecord),
            Request::Remove { id } => Ok(Intent::RemoveRecord(id)),
            Request::Set { id, path, value } => Ok(Intent::set_field(id, path, value)),
            Request::Batch { edits } => edits
                .into_iter()
                .map(Request::into_intent)
                .collect::<CliResult<Vec<_>>>()
                .map(Intent::Batch),
            _ => Err(CliError::bad_request("only add, remove, set and batch can be batched")),
        }
    }
}

/// Current search query and position
#[derive(Debug, Clone)]
struct SearchCursor {
    query: SearchQuery,
    current: Option<SearchMatch>,
}

/// Engine plus per-session state
pub struct Session {
    engine: Engine,
    target: PathBuf,
    cursor: Option<SearchCursor>,
}

impl Session {
    /// `target` is where `save` writes
    pub fn new(engine: Engine, target: PathBuf) -> Self {
        Self {
            engine,
            target,
            cursor: None,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Parses and executes one request, returning the response data.
    pub fn handle(&mut self, request: Value) -> CliResult<Value> {
        let request: Request = serde_json::from_value(request)
            .map_err(|e| CliError::bad_request(format!("invalid request: {}", e)))?;
        debug!(?request, "session request");
        self.execute(request)
    }

    fn execute(&mut self, request: Request) -> CliResult<Value> {
        match request {
            Request::Add => {
                let id = self.engine.add()?;
                Ok(json!({"id": id, "violations": self.engine.violations(id)}))
            }
            Request::Remove { id } => {
                let removed = self.engine.remove(id)?;
                Ok(json!({"id": id, "position": removed.position}))
            }
            Request::Set { id, path, value } => {
                let update = self.engine.set_field(id, &path, value)?;
                Ok(json!({
                    "path": update.path,
                    "old_value": update.old_value,
                    "value": update.new_value,
                    "coerced": update.coerced,
                    "violations": update.violations_after,
                }))
            }
            request @ Request::Batch { .. } => {
                let intent = request.into_intent()?;
                let edits = match self.engine.apply(intent)? {
                    Outcome::Batch(outcomes) => outcomes.len(),
                    _ => 1,
                };
                Ok(json!({"edits": edits}))
            }
            Request::Undo => self.step(Engine::undo),
            Request::Redo => self.step(Engine::redo),
            Request::Search {
                term,
                case_sensitive,
            } => {
                let query = SearchQuery::new(term).case_sensitive(case_sensitive);
                let matches = self.engine.search(&query);
                self.cursor = Some(SearchCursor {
                    query,
                    current: None,
                });
                Ok(json!({"matches": matches}))
            }
            Request::Next | Request::Previous => {
                let cursor = self
                    .cursor
                    .as_mut()
                    .ok_or_else(|| CliError::bad_request("no active search; send a search first"))?;
                let found = if request == Request::Next {
                    self.engine.search_next(&cursor.query, cursor.current.as_ref())
                } else {
                    self.engine.search_previous(&cursor.query, cursor.current.as_ref())
                };
                cursor.current = found.clone();
                Ok(json!({"match": found}))
            }
            Request::Violations { id: Some(id) } => {
                if self.engine.store().get(id).is_none() {
                    return Err(EngineError::from(StoreError::NotFound(id)).into());
                }
                Ok(json!({"violations": self.engine.violations(id)}))
            }
            Request::Violations { id: None } => {
                Ok(json!({"records": self.engine.validate_all()}))
            }
            Request::Export => Ok(self.engine.export_records()),
            Request::Save => {
                let blockers = self.engine.save_blockers();
                if !blockers.is_empty() {
                    return Err(CliError::save_blocked(blockers.len()));
                }
                let report = save_document(
                    &self.target,
                    &self.engine.export_records(),
                    &self.engine.config().files,
                )?;
                Ok(serde_json::to_value(report)?)
            }
        }
    }

    /// Runs undo or redo; an empty stack is reported, not raised
    fn step(&mut self, op: fn(&mut Engine) -> Result<Command, EngineError>) -> CliResult<Value> {
        match op(&mut self.engine) {
            Ok(command) => Ok(json!({
                "applied": true,
                "command": command.name(),
                "records": command.record_ids(),
            })),
            Err(e) if e.is_advisory() => Ok(json!({"applied": false, "reason": e.code()})),
            Err(e) => Err(e.into()),
        }
    }
}
