//! Unconditional removal of paths and directory contents.
use anyhow::Result;
use std::fmt;
use std::path::{Path, PathBuf};

use super::error::ResourceError;
use super::walk::Walk;
use super::{Applicable, ResourceChange};
use crate::logging::Log;

/// Remove a path.  A directory is emptied bottom-up first, hidden entries
/// included; exclusions and ages play no part.
pub struct RemoveResource<'a> {
    path: PathBuf,
    keep_root: bool,
    log: &'a dyn Log,
}

impl fmt::Debug for RemoveResource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoveResource")
            .field("path", &self.path)
            .field("keep_root", &self.keep_root)
            .finish_non_exhaustive()
    }
}

impl<'a> RemoveResource<'a> {
    /// Create a removal action.
    ///
    /// With `keep_root`, a directory at `path` is emptied but not removed.
    #[must_use]
    pub fn new(path: &Path, keep_root: bool, log: &'a dyn Log) -> Self {
        Self {
            path: path.to_path_buf(),
            keep_root,
            log,
        }
    }

    fn empty_directory(&self) -> usize {
        let mut removed = 0;
        Walk::new(&self.path)
            .recursive(true)
            .include_hidden(true)
            .run(self.log, |entry| {
                let path = entry.path();
                let result = if entry.file_type().is_dir() {
                    std::fs::remove_dir(path)
                } else {
                    std::fs::remove_file(path)
                };
                match result {
                    Ok(()) => removed += 1,
                    Err(e) => self
                        .log
                        .warn(&format!("cannot remove {}: {e}", path.display())),
                }
            });
        removed
    }
}

impl Applicable for RemoveResource<'_> {
    fn description(&self) -> String {
        if self.keep_root {
            format!("empty {}", self.path.display())
        } else {
            format!("remove {}", self.path.display())
        }
    }

    fn apply(&self) -> Result<ResourceChange> {
        let meta = match self.path.symlink_metadata() {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ResourceChange::AlreadyCorrect);
            }
            Err(e) => return Err(ResourceError::io("stat", &self.path, e).into()),
        };

        if !meta.is_dir() {
            std::fs::remove_file(&self.path)
                .map_err(|e| ResourceError::io("unlink", &self.path, e))?;
            return Ok(ResourceChange::Applied);
        }

        let removed = self.empty_directory();
        if self.keep_root {
            return Ok(if removed == 0 {
                ResourceChange::AlreadyCorrect
            } else {
                ResourceChange::Applied
            });
        }
        std::fs::remove_dir(&self.path).map_err(|e| ResourceError::io("rmdir", &self.path, e))?;
        Ok(ResourceChange::Applied)
    }
}
