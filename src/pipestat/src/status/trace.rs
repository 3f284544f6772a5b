//! Reader for the tab-separated execution trace written by the workflow engine.
//!
//! The first line is a header of whitespace-separated field names. Each following line is one
//! task, with fields separated by a single tab in this positional order:
//!
//! ```text
//!  0. task_id          5. start timestamp   10. queue
//!  1. process          6. container         11. cpu percentage
//!  2. tag              7. cpus              12. memory percentage
//!  3. status           8. duration          13. resident memory size
//!  4. exit code        9. realtime          14. virtual memory size
//! ```
use super::error::{StatusError, StatusResult};
use crate::constants::COMPLETED_STATUS;
use serde_json::{Map, Value};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceHeader {
    names: Vec<String>,
}

impl TraceHeader {
    /// Returns `None` when the line holds no field names.
    pub fn parse(line: &str) -> Option<Self> {
        let names: Vec<String> = line.split_whitespace().map(String::from).collect();
        if names.is_empty() {
            None
        } else {
            Some(Self { names })
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Completed,
    Failed,
    Aborted,
    Cached,
    Submitted,
    Running,
    Other(String),
}

impl From<&str> for TaskStatus {
    fn from(s: &str) -> Self {
        match s {
            COMPLETED_STATUS => TaskStatus::Completed,
            "FAILED" => TaskStatus::Failed,
            "ABORTED" => TaskStatus::Aborted,
            "CACHED" => TaskStatus::Cached,
            "SUBMITTED" => TaskStatus::Submitted,
            "RUNNING" => TaskStatus::Running,
            other => TaskStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Completed => COMPLETED_STATUS,
            TaskStatus::Failed => "FAILED",
            TaskStatus::Aborted => "ABORTED",
            TaskStatus::Cached => "CACHED",
            TaskStatus::Submitted => "SUBMITTED",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Other(other) => other,
        };
        f.write_str(s)
    }
}

/// One task row of the trace. Always holds at least [`TraceRecord::MIN_FIELDS`] fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    line: usize,
    fields: Vec<String>,
}

impl TraceRecord {
    pub const TASK_ID: usize = 0;
    pub const PROCESS: usize = 1;
    pub const TAG: usize = 2;
    pub const STATUS: usize = 3;
    pub const MIN_FIELDS: usize = Self::STATUS + 1;

    /// Splits a trace line into a record. Blank lines yield `Ok(None)`; lines too short to
    /// classify yield the reason as an error.
    pub fn parse(line_number: usize, line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let fields: Vec<String> = line.split('\t').map(String::from).collect();
        if fields.len() < Self::MIN_FIELDS {
            return Err(format!(
                "expected at least {} tab-separated fields, found {}",
                Self::MIN_FIELDS,
                fields.len()
            ));
        }
        Ok(Some(Self {
            line: line_number,
            fields,
        }))
    }

    /// 1-based line number within the trace file.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn task_id(&self) -> &str {
        &self.fields[Self::TASK_ID]
    }

    pub fn process(&self) -> &str {
        &self.fields[Self::PROCESS]
    }

    pub fn tag(&self) -> &str {
        &self.fields[Self::TAG]
    }

    pub fn status(&self) -> TaskStatus {
        TaskStatus::from(self.fields[Self::STATUS].as_str())
    }

    /// Pairs header names with this row's values, stopping at the shorter of the two.
    pub fn to_entry(&self, header: &TraceHeader) -> Map<String, Value> {
        header
            .names()
            .iter()
            .zip(self.fields.iter())
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect()
    }
}

pub struct TraceReader<R> {
    path: PathBuf,
    header: TraceHeader,
    lines: Lines<R>,
    line_number: usize,
}

impl TraceReader<BufReader<File>> {
    pub fn open(path: &Path) -> StatusResult<Self> {
        let file = File::open(path).map_err(|e| StatusError::io(path, e))?;
        Self::new(path, BufReader::new(file))
    }
}

impl<R: BufRead> TraceReader<R> {
    /// Consumes the header line. `path` is only used in error messages.
    pub fn new(path: impl Into<PathBuf>, reader: R) -> StatusResult<Self> {
        let path = path.into();
        let mut lines = reader.lines();
        let header = match lines.next() {
            Some(Ok(line)) => TraceHeader::parse(&line)
                .ok_or_else(|| StatusError::malformed(&path, 1, "header has no field names"))?,
            Some(Err(e)) => return Err(StatusError::io(&path, e)),
            None => return Err(StatusError::malformed(&path, 1, "missing header line")),
        };
        Ok(Self {
            path,
            header,
            lines,
            line_number: 1,
        })
    }

    pub fn header(&self) -> &TraceHeader {
        &self.header
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = StatusResult<TraceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(StatusError::io(&self.path, e))),
            };
            self.line_number += 1;
            match TraceRecord::parse(self.line_number, &line) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => debug!("Skipping blank trace line {}", self.line_number),
                Err(reason) => {
                    return Some(Err(StatusError::malformed(
                        &self.path,
                        self.line_number,
                        reason,
                    )))
                }
            }
        }
    }
}
