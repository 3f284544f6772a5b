use super::error::{StatusError, StatusResult};
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Cumulative task statistics for one sample, keyed by task id.
///
/// Keys keep their insertion order: entries loaded from a previous run come first, new task
/// ids are appended, and replacing an existing task keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsAccumulator {
    entries: Map<String, Value>,
}

impl StatsAccumulator {
    /// `path` is only used in error messages.
    pub fn from_json_str(path: &Path, contents: &str) -> StatusResult<Self> {
        let value: Value = serde_json::from_str(contents).map_err(|e| StatusError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        match value {
            Value::Object(entries) => Ok(Self { entries }),
            other => Err(StatusError::Parse {
                path: path.to_path_buf(),
                reason: format!("expected a JSON object, found {}", json_kind(&other)),
            }),
        }
    }

    /// Stores `entry` under `task_id`, replacing any previous entry wholesale. Returns the
    /// replaced entry.
    pub fn merge(&mut self, task_id: &str, entry: Map<String, Value>) -> Option<Value> {
        self.entries
            .insert(task_id.to_string(), Value::Object(entry))
    }

    pub fn get(&self, task_id: &str) -> Option<&Value> {
        self.entries.get(task_id)
    }

    pub fn task_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compact JSON with no whitespace between tokens.
    pub fn to_compact_json(&self) -> StatusResult<String> {
        Ok(serde_json::to_string(&self.entries)?)
    }
}

/// Loads the stats written by a previous run. A missing file is an empty accumulator.
pub fn load_prior_state(path: &Path) -> StatusResult<StatsAccumulator> {
    debug!("Path to pipeline status data set to: {}", path.display());
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No pipeline status data found");
            return Ok(StatsAccumulator::default());
        }
        Err(e) => return Err(StatusError::io(path, e)),
    };
    debug!("Existing pipeline status data found, loading JSON");
    StatsAccumulator::from_json_str(path, &contents)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
