//! Bulk loading of raw data records
//!
//! A load may run in one pass or in batches. Between batches the caller
//! regains control (an event loop can stay responsive) and may abandon the
//! load by dropping the cursor; the store then holds a well-defined prefix
//! of the input. A batch is committed whole or not at all.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::record::RecordId;
use crate::validation::Violation;

/// Outcome of a load
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    /// Records stored, valid or not
    pub accepted: usize,
    /// Violations of every flagged record
    pub violations: BTreeMap<RecordId, Vec<Violation>>,
}

impl LoadReport {
    /// Number of records with at least one violation
    pub fn flagged(&self) -> usize {
        self.violations.len()
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Progress of a batched load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStep {
    /// One batch committed; more input remains
    Batch { committed: usize, remaining: usize },
    /// Input exhausted
    Finished,
}

/// Pending input of a batched load.
///
/// Obtained from [`RecordStore::begin_load`](super::RecordStore::begin_load)
/// and advanced with [`RecordStore::load_batch`](super::RecordStore::load_batch).
#[derive(Debug)]
pub struct LoadCursor {
    pub(super) pending: std::vec::IntoIter<Value>,
    pub(super) chunk_size: usize,
    /// Input position of the next record
    pub(super) position: usize,
    pub(super) report: LoadReport,
}

impl LoadCursor {
    pub(super) fn new(raw: Vec<Value>, chunk_size: Option<usize>) -> Self {
        let chunk_size = chunk_size.unwrap_or(raw.len()).max(1);
        Self {
            pending: raw.into_iter(),
            chunk_size,
            position: 0,
            report: LoadReport::default(),
        }
    }

    /// Records not yet committed
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Records committed so far
    pub fn loaded(&self) -> usize {
        self.report.accepted
    }

    pub fn is_finished(&self) -> bool {
        self.pending.len() == 0
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Report for the committed prefix
    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn into_report(self) -> LoadReport {
        self.report
    }

    /// Takes the next batch off the input
    pub(super) fn next_batch(&mut self) -> Vec<Value> {
        self.pending.by_ref().take(self.chunk_size).collect()
    }

    /// Discards remaining input after a rejected batch
    pub(super) fn abandon(&mut self) {
        self.pending = Vec::new().into_iter();
    }
}
