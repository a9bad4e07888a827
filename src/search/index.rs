//! Search index over record field values
//!
//! Per record, a flattened list of `(path, text)` leaf entries. Entries
//! are derived state: a change event drops the touched record's entry and
//! the next query re-flattens it, so an edit costs nothing until searched.
//!
//! # API
//!
//! - `apply_events(events)` - Invalidate entries after store mutations
//! - `rebuild(store)` - Flatten every record eagerly
//! - `search(store, query)` - All matches in record then traversal order
//! - `next(store, query, after)` / `previous(...)` - Cyclic navigation

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use super::query::{SearchMatch, SearchQuery};
use crate::record::{Record, RecordId};
use crate::schema::{FieldMap, FieldPath, PathSegment, TypeDescriptor};
use crate::store::{RecordStore, StoreEvent};

/// One indexed leaf value
#[derive(Debug, Clone, PartialEq)]
struct IndexedValue {
    path: FieldPath,
    text: String,
    /// Lowercased `text`
    folded: String,
}

impl IndexedValue {
    fn new(path: FieldPath, text: String) -> Self {
        let folded = text.to_lowercase();
        Self { path, text, folded }
    }
}

/// Lazily maintained substring index
#[derive(Debug, Default)]
pub struct SearchIndex {
    /// Flattened values of records indexed since their last change
    entries: HashMap<RecordId, Vec<IndexedValue>>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidates entries touched by store events.
    pub fn apply_events(&mut self, events: &[StoreEvent]) {
        for event in events {
            match event {
                StoreEvent::Reset => self.entries.clear(),
                StoreEvent::Inserted(id) | StoreEvent::Removed(id) | StoreEvent::Updated(id) => {
                    self.entries.remove(id);
                }
            }
        }
    }

    /// Re-indexes every record in the store.
    pub fn rebuild(&mut self, store: &RecordStore) {
        self.entries.clear();
        self.refresh(store);
        debug!(records = self.entries.len(), "search index rebuilt");
    }

    /// Number of records with a current entry
    pub fn indexed(&self) -> usize {
        self.entries.len()
    }

    /// Finds every field value containing the term.
    ///
    /// Matches are ordered by record sequence, then by field traversal
    /// order. An empty term matches nothing.
    pub fn search(&mut self, store: &RecordStore, query: &SearchQuery) -> Vec<SearchMatch> {
        if query.term.is_empty() {
            return Vec::new();
        }
        self.refresh(store);

        let needle = query.needle();
        let mut matches = Vec::new();
        for record in store.records() {
            let Some(values) = self.entries.get(&record.id()) else {
                continue;
            };
            for value in values {
                let haystack = if query.case_sensitive {
                    &value.text
                } else {
                    &value.folded
                };
                if haystack.contains(&needle) {
                    matches.push(SearchMatch::new(record.id(), value.path.clone()));
                }
            }
        }
        trace!(term = %query.term, matches = matches.len(), "search");
        matches
    }

    /// Match following `after`, wrapping to the first.
    ///
    /// With no `after` (or one that no longer matches) returns the first match.
    pub fn next(
        &mut self,
        store: &RecordStore,
        query: &SearchQuery,
        after: Option<&SearchMatch>,
    ) -> Option<SearchMatch> {
        let matches = self.search(store, query);
        let len = matches.len();
        let next = match after.and_then(|m| matches.iter().position(|x| x == m)) {
            Some(i) => (i + 1) % len,
            None => 0,
        };
        matches.into_iter().nth(next)
    }

    /// Match preceding `before`, wrapping to the last.
    ///
    /// With no `before` (or one that no longer matches) returns the last match.
    pub fn previous(
        &mut self,
        store: &RecordStore,
        query: &SearchQuery,
        before: Option<&SearchMatch>,
    ) -> Option<SearchMatch> {
        let matches = self.search(store, query);
        let len = matches.len();
        if len == 0 {
            return None;
        }
        let previous = match before.and_then(|m| matches.iter().position(|x| x == m)) {
            Some(i) => (i + len - 1) % len,
            None => len - 1,
        };
        matches.into_iter().nth(previous)
    }

    /// Flattens records that have no current entry
    fn refresh(&mut self, store: &RecordStore) {
        let fields = store.schema().map(|schema| schema.fields());
        let mut flattened = 0usize;
        for record in store.records() {
            if !self.entries.contains_key(&record.id()) {
                self.entries.insert(record.id(), flatten(fields, record));
                flattened += 1;
            }
        }
        if flattened > 0 {
            trace!(flattened, "search entries refreshed");
        }
    }
}

/// Leaf values of a record in validator traversal order
fn flatten(fields: Option<&FieldMap>, record: &Record) -> Vec<IndexedValue> {
    let mut out = Vec::new();
    collect_object(fields, record.fields(), &FieldPath::root(), &mut out);
    out
}

fn collect_object(
    fields: Option<&FieldMap>,
    obj: &Map<String, Value>,
    path: &FieldPath,
    out: &mut Vec<IndexedValue>,
) {
    match fields {
        Some(fields) => {
            for spec in fields {
                if let Some(value) = obj.get(&spec.name) {
                    let child = path.child(PathSegment::Key(spec.name.clone()));
                    collect_value(Some(&spec.field_type), value, &child, out);
                }
            }
            for (key, value) in obj.iter().filter(|(k, _)| !fields.contains(k)) {
                collect_value(None, value, &path.child(PathSegment::Key(key.clone())), out);
            }
        }
        None => {
            for (key, value) in obj {
                collect_value(None, value, &path.child(PathSegment::Key(key.clone())), out);
            }
        }
    }
}

fn collect_value(
    declared: Option<&TypeDescriptor>,
    value: &Value,
    path: &FieldPath,
    out: &mut Vec<IndexedValue>,
) {
    match value {
        Value::Null => {}
        Value::Object(obj) => collect_object(declared.and_then(TypeDescriptor::fields), obj, path, out),
        Value::Array(items) => {
            let element = declared.and_then(TypeDescriptor::element);
            for (i, item) in items.iter().enumerate() {
                collect_value(element, item, &path.child(PathSegment::Index(i)), out);
            }
        }
        Value::String(s) => out.push(IndexedValue::new(path.clone(), s.clone())),
        other => out.push(IndexedValue::new(path.clone(), other.to_string())),
    }
}
