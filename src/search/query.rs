//! Search queries and matches

use serde::{Deserialize, Serialize};

use crate::record::RecordId;
use crate::schema::FieldPath;

/// Substring query over indexed field values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub term: String,
    /// Case-insensitive unless set
    #[serde(default)]
    pub case_sensitive: bool,
}

impl SearchQuery {
    /// Case-insensitive query
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            case_sensitive: false,
        }
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Term as compared against indexed text
    pub(super) fn needle(&self) -> String {
        if self.case_sensitive {
            self.term.clone()
        } else {
            self.term.to_lowercase()
        }
    }
}

/// One field value containing the search term
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchMatch {
    pub record_id: RecordId,
    pub field_path: FieldPath,
}

impl SearchMatch {
    pub fn new(record_id: RecordId, field_path: FieldPath) -> Self {
        Self {
            record_id,
            field_path,
        }
    }
}
