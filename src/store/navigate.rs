//! Path navigation inside record contents
//!
//! Every segment but the last must address an existing container. The
//! last segment addresses a slot within it: an object key (existing or
//! new), an existing list index, or the append slot.

use serde_json::{Map, Value};

use super::errors::{StoreError, StoreResult};
use crate::coerce::{check_index, json_type_name};
use crate::schema::{FieldPath, PathSegment};

enum Container<'a> {
    Object(&'a mut Map<String, Value>),
    List(&'a mut Vec<Value>),
}

/// Outcome of a write
#[derive(Debug)]
pub(crate) struct Written {
    /// Path with an append segment pinned to the index it filled
    pub path: FieldPath,
    /// Previous value, `None` if the slot did not exist
    pub old_value: Option<Value>,
}

/// Reads the value at `path`, if it exists.
pub(crate) fn read<'a>(fields: &'a Map<String, Value>, path: &FieldPath) -> Option<&'a Value> {
    let (first, rest) = path.segments().split_first()?;
    let mut current = fields.get(first.as_key()?)?;
    for segment in rest {
        current = match (current, segment) {
            (Value::Object(map), PathSegment::Key(k)) => map.get(k)?,
            (Value::Array(items), PathSegment::Index(i)) => items.get(*i)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Writes `value` at `path`, returning the previous value.
pub(crate) fn write(
    fields: &mut Map<String, Value>,
    path: &FieldPath,
    value: Value,
) -> StoreResult<Written> {
    let last = final_segment(path)?;
    match (container_mut(fields, path)?, last) {
        (Container::Object(map), PathSegment::Key(key)) => {
            let old_value = map.insert(key.clone(), value);
            Ok(Written {
                path: path.clone(),
                old_value,
            })
        }
        (Container::List(items), PathSegment::Index(i)) => {
            check_index(path, *i, items.len(), false)
                .map_err(|e| StoreError::invalid_path(path, e.to_string()))?;
            let old = std::mem::replace(&mut items[*i], value);
            Ok(Written {
                path: path.clone(),
                old_value: Some(old),
            })
        }
        (Container::List(items), PathSegment::Append) => {
            let index = items.len();
            items.push(value);
            Ok(Written {
                path: path.with_last(PathSegment::Index(index)),
                old_value: None,
            })
        }
        (Container::Object(_), _) => Err(StoreError::invalid_path(
            path,
            "a dict member must be addressed by key",
        )),
        (Container::List(_), PathSegment::Key(_)) => Err(StoreError::invalid_path(
            path,
            "a list element must be addressed by index",
        )),
    }
}

/// Puts a slot back into a prior state.
///
/// `Some` writes the value, allowing a list index equal to the length (an
/// append being redone). `None` deletes the slot (an insert being undone).
pub(crate) fn restore(
    fields: &mut Map<String, Value>,
    path: &FieldPath,
    value: Option<Value>,
) -> StoreResult<()> {
    let last = final_segment(path)?;
    match (container_mut(fields, path)?, last, value) {
        (Container::Object(map), PathSegment::Key(key), Some(value)) => {
            map.insert(key.clone(), value);
            Ok(())
        }
        (Container::Object(map), PathSegment::Key(key), None) => {
            map.remove(key);
            Ok(())
        }
        (Container::List(items), PathSegment::Index(i), Some(value)) => {
            check_index(path, *i, items.len(), true)
                .map_err(|e| StoreError::invalid_path(path, e.to_string()))?;
            if *i == items.len() {
                items.push(value);
            } else {
                items[*i] = value;
            }
            Ok(())
        }
        (Container::List(items), PathSegment::Index(i), None) => {
            check_index(path, *i, items.len(), false)
                .map_err(|e| StoreError::invalid_path(path, e.to_string()))?;
            items.remove(*i);
            Ok(())
        }
        _ => Err(StoreError::invalid_path(
            path,
            "restore needs a concrete key or index",
        )),
    }
}

fn final_segment(path: &FieldPath) -> StoreResult<&PathSegment> {
    if path.has_interior_append() {
        return Err(StoreError::invalid_path(
            path,
            "append is only allowed as the final segment",
        ));
    }
    path.last()
        .ok_or_else(|| StoreError::invalid_path(path, "path is empty"))
}

fn container_mut<'a>(
    fields: &'a mut Map<String, Value>,
    path: &FieldPath,
) -> StoreResult<Container<'a>> {
    let parents = match path.split_last() {
        Some((parents, _)) => parents,
        None => return Err(StoreError::invalid_path(path, "path is empty")),
    };

    let mut current = Container::Object(fields);
    for (depth, segment) in parents.iter().enumerate() {
        let here: FieldPath = parents[..depth].iter().cloned().collect();
        let next: &'a mut Value = match (current, segment) {
            (Container::Object(map), PathSegment::Key(key)) => {
                map.get_mut(key).ok_or_else(|| {
                    StoreError::invalid_path(path, format!("no field '{}' at '{}'", key, here))
                })?
            }
            (Container::List(items), PathSegment::Index(i)) => {
                let child = here.child(PathSegment::Index(*i));
                check_index(&child, *i, items.len(), false)
                    .map_err(|e| StoreError::invalid_path(path, e.to_string()))?;
                &mut items[*i]
            }
            (Container::Object(_), _) => {
                return Err(StoreError::invalid_path(
                    path,
                    format!("'{}' is a dict, expected a key", here),
                ))
            }
            (Container::List(_), _) => {
                return Err(StoreError::invalid_path(
                    path,
                    format!("'{}' is a list, expected an index", here),
                ))
            }
        };

        current = match next {
            Value::Object(map) => Container::Object(map),
            Value::Array(items) => Container::List(items),
            other => {
                let at: FieldPath = parents[..=depth].iter().cloned().collect();
                return Err(StoreError::invalid_path(
                    path,
                    format!("'{}' is a {}, not a container", at, json_type_name(other)),
                ));
            }
        };
    }
    Ok(current)
}
