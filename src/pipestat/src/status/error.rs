use std::io;
use std::path::{Path, PathBuf};

pub type StatusResult<T> = Result<T, StatusError>;

#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("I/O failure on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse stats file {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("malformed trace {} at line {line}: {reason}", .path.display())]
    MalformedTrace {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("failed to serialize stats: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("sample id must not be empty")]
    InvalidSampleId,
}

impl StatusError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        StatusError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn malformed(path: &Path, line: usize, reason: impl Into<String>) -> Self {
        StatusError::MalformedTrace {
            path: path.to_path_buf(),
            line,
            reason: reason.into(),
        }
    }
}
