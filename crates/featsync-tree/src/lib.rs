//! Path access over issue documents.
//!
//! Remote issues are plain JSON trees. Fields are addressed by slash-separated
//! paths (`/fields/summary`, `key`, `fields/issuelinks/0/type/name`); a
//! leading slash is optional. Numeric segments index into arrays.

use serde_json::{Map, Value};
use std::fmt;

/// Errors raised when writing into a tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("empty path")]
    EmptyPath,
    #[error("cannot descend into {kind} at '{at}' while writing '{path}'")]
    NotAContainer {
        path: String,
        at: String,
        kind: &'static str,
    },
    #[error("index {index} out of bounds at '{at}' while writing '{path}'")]
    IndexOutOfBounds {
        path: String,
        at: String,
        index: usize,
    },
}

/// A parsed field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment, the field name itself.
    pub fn leaf(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Swap a leading segment: `/fields/labels` rebased from `fields` to
    /// `update` becomes `/update/labels`. Paths not under `from` are returned
    /// unchanged.
    pub fn rebase(&self, from: &str, to: &str) -> Self {
        let mut segments = self.segments.clone();
        if segments.first().is_some_and(|s| s == from) {
            segments[0] = to.to_string();
        }
        Self { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.segments {
            write!(f, "/{s}")?;
        }
        Ok(())
    }
}

impl From<&str> for FieldPath {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

/// Value at `path`, or `None` when any segment is missing.
///
/// A JSON `null` at the end of the path is returned as `Some(Value::Null)`;
/// callers decide whether null and absent mean the same thing.
pub fn get<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    get_path(tree, &FieldPath::parse(path))
}

pub fn get_path<'a>(tree: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    let mut node = tree;
    for seg in path.segments() {
        node = match node {
            Value::Object(map) => map.get(seg)?,
            Value::Array(items) => items.get(seg.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(node)
}

pub fn exists(tree: &Value, path: &str) -> bool {
    get(tree, path).is_some()
}

/// Write `value` at `path`, creating intermediate containers as needed.
///
/// A missing container followed by a numeric segment is created as an array,
/// so `/items/0` on an empty tree gives `{"items": [value]}`. Array indexes may
/// address an existing slot or append at the end.
pub fn set(tree: &mut Value, path: &str, value: Value) -> Result<(), TreeError> {
    set_path(tree, &FieldPath::parse(path), value)
}

pub fn set_path(tree: &mut Value, path: &FieldPath, value: Value) -> Result<(), TreeError> {
    let Some((last, parents)) = path.segments().split_last() else {
        return Err(TreeError::EmptyPath);
    };

    let mut node = tree;
    let mut at = String::new();
    for (i, seg) in parents.iter().enumerate() {
        at.push('/');
        at.push_str(seg);
        if node.is_null() {
            *node = container_for(seg);
        }
        let next = path.segments()[i + 1].as_str();
        node = match node {
            Value::Object(map) => map
                .entry(seg.clone())
                .or_insert_with(|| container_for(next)),
            Value::Array(items) => {
                let index = array_index(seg, path, &at)?;
                if index == items.len() {
                    items.push(container_for(next));
                }
                items.get_mut(index).ok_or(TreeError::IndexOutOfBounds {
                    path: path.to_string(),
                    at: at.clone(),
                    index,
                })?
            }
            other => {
                return Err(TreeError::NotAContainer {
                    path: path.to_string(),
                    at,
                    kind: kind_of(other),
                });
            }
        };
    }

    if node.is_null() {
        *node = container_for(last);
    }
    match node {
        Value::Object(map) => {
            map.insert(last.clone(), value);
            Ok(())
        }
        Value::Array(items) => {
            let index = array_index(last, path, &at)?;
            if index == items.len() {
                items.push(value);
            } else if let Some(slot) = items.get_mut(index) {
                *slot = value;
            } else {
                return Err(TreeError::IndexOutOfBounds {
                    path: path.to_string(),
                    at,
                    index,
                });
            }
            Ok(())
        }
        other => Err(TreeError::NotAContainer {
            path: path.to_string(),
            at,
            kind: kind_of(other),
        }),
    }
}

/// Fresh tree holding only `value` at `path`.
///
/// `new("/update/summary", json!([{"set": "T"}]))` gives
/// `{"update": {"summary": [{"set": "T"}]}}`.
pub fn new(path: &str, value: Value) -> Result<Value, TreeError> {
    let mut tree = Value::Object(Map::new());
    set(&mut tree, path, value)?;
    Ok(tree)
}

fn container_for(segment: &str) -> Value {
    if segment.parse::<usize>().is_ok() {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

fn array_index(seg: &str, path: &FieldPath, at: &str) -> Result<usize, TreeError> {
    seg.parse::<usize>().map_err(|_| TreeError::NotAContainer {
        path: path.to_string(),
        at: at.to_string(),
        kind: "array",
    })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
