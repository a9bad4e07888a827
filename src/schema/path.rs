//! Field paths locating a value inside a record
//!
//! A path is an ordered sequence of object keys and list indexes. The
//! wire form is a JSON array such as `["address", "zipcode"]` or
//! `["tags", 2]`. The string `"+"` in final position is the append form,
//! addressing the slot one past the end of a list.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Wire token for the append segment
pub const APPEND_TOKEN: &str = "+";

/// One step of a field path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// Object key
    Key(String),
    /// List position
    Index(usize),
    /// One past the last list element
    Append,
}

impl PathSegment {
    /// Returns the key if this segment addresses an object member
    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathSegment::Key(k) => Some(k),
            _ => None,
        }
    }

    /// Returns true for index and append segments
    pub fn is_positional(&self) -> bool {
        matches!(self, PathSegment::Index(_) | PathSegment::Append)
    }
}

impl From<&str> for PathSegment {
    fn from(s: &str) -> Self {
        if s == APPEND_TOKEN {
            PathSegment::Append
        } else {
            PathSegment::Key(s.to_string())
        }
    }
}

impl From<String> for PathSegment {
    fn from(s: String) -> Self {
        if s == APPEND_TOKEN {
            PathSegment::Append
        } else {
            PathSegment::Key(s)
        }
    }
}

impl From<usize> for PathSegment {
    fn from(i: usize) -> Self {
        PathSegment::Index(i)
    }
}

impl Serialize for PathSegment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PathSegment::Key(k) => serializer.serialize_str(k),
            PathSegment::Index(i) => serializer.serialize_u64(*i as u64),
            PathSegment::Append => serializer.serialize_str(APPEND_TOKEN),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSegment {
    Index(u64),
    Key(String),
}

impl<'de> Deserialize<'de> for PathSegment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawSegment::deserialize(deserializer)? {
            RawSegment::Index(i) => usize::try_from(i)
                .map(PathSegment::Index)
                .map_err(|_| de::Error::custom(format!("path index {} out of range", i))),
            RawSegment::Key(k) => Ok(PathSegment::from(k)),
        }
    }
}

/// Ordered key/index sequence locating a value within a record
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The empty path (the record itself)
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Builder: appends an object key
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.0.push(PathSegment::Key(key.into()));
        self
    }

    /// Builder: appends a list index
    pub fn index(mut self, index: usize) -> Self {
        self.0.push(PathSegment::Index(index));
        self
    }

    /// Builder: appends the append segment
    pub fn append(mut self) -> Self {
        self.0.push(PathSegment::Append);
        self
    }

    /// Returns a new path with `segment` pushed on the end
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }

    /// Returns a new path with `other` concatenated on the end
    pub fn join(&self, other: &FieldPath) -> Self {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// Splits into (container path, final segment)
    pub fn split_last(&self) -> Option<(&[PathSegment], &PathSegment)> {
        self.0.split_last().map(|(last, rest)| (rest, last))
    }

    /// Append is only meaningful as the final segment
    pub fn has_interior_append(&self) -> bool {
        match self.0.split_last() {
            Some((_, rest)) => rest.iter().any(|s| matches!(s, PathSegment::Append)),
            None => false,
        }
    }

    /// Replaces the final segment, used to pin an append to a concrete index
    pub fn with_last(&self, segment: PathSegment) -> Self {
        let mut segments = self.0.clone();
        segments.pop();
        segments.push(segment);
        Self(segments)
    }
}

impl From<Vec<PathSegment>> for FieldPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl FromIterator<PathSegment> for FieldPath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "$root");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(k) if i == 0 => write!(f, "{}", k)?,
                PathSegment::Key(k) => write!(f, ".{}", k)?,
                PathSegment::Index(idx) => write!(f, "[{}]", idx)?,
                PathSegment::Append => write!(f, "[+]")?,
            }
        }
        Ok(())
    }
}
