use super::error::{StatusError, StatusResult};
use crate::constants::STATUS_ERROR;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// New contents for `path`, written to a temporary file in the same directory. Committing
/// renames it over `path`, so readers only ever see the old or the new file. Dropping an
/// uncommitted file removes the temporary file.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    tmp: NamedTempFile,
}

impl StagedFile {
    /// The parent directory of `path` must already exist.
    pub fn stage(path: &Path, contents: &[u8]) -> StatusResult<Self> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StatusError::io(path, e))?;
        tmp.write_all(contents)
            .and_then(|_| tmp.flush())
            .map_err(|e| StatusError::io(path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o644))
                .map_err(|e| StatusError::io(path, e))?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            tmp,
        })
    }

    pub fn commit(self) -> StatusResult<PathBuf> {
        self.tmp
            .persist(&self.path)
            .map_err(|e| StatusError::io(&self.path, e.error))?;
        Ok(self.path)
    }
}

/// Marks the current task as failed for the workflow engine.
pub fn mark_failed(path: &Path) -> io::Result<()> {
    fs::write(path, STATUS_ERROR)
}
