//! Writing rule arguments into existing files.
use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use super::error::ResourceError;
use super::{Applicable, ResourceChange};

/// Replace (or extend) the content of an existing regular file.
///
/// The file is never created: a missing path or anything other than a
/// regular file (or a symlink to one) is reported as
/// [`ResourceChange::Skipped`].
#[derive(Debug, Clone)]
pub struct WriteResource {
    /// Target file.
    pub path: PathBuf,
    /// Bytes to write, verbatim.
    pub content: String,
    /// Append instead of truncating first.
    pub append: bool,
}

impl WriteResource {
    /// Create a new write action.
    #[must_use]
    pub fn new(path: &Path, content: &str, append: bool) -> Self {
        Self {
            path: path.to_path_buf(),
            content: content.to_string(),
            append,
        }
    }
}

impl Applicable for WriteResource {
    fn description(&self) -> String {
        let verb = if self.append { "append" } else { "write" };
        format!("{verb} {} bytes to {}", self.content.len(), self.path.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        // Follows symlinks: a link to a regular file is written through,
        // the same way opening the path for writing would.
        if !self.path.is_file() {
            return Ok(ResourceChange::skipped(format!(
                "{} is not an existing regular file",
                self.path.display()
            )));
        }

        let mut options = OpenOptions::new();
        if self.append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        let mut file = options
            .open(&self.path)
            .map_err(|e| ResourceError::io("open", &self.path, e))?;
        file.write_all(self.content.as_bytes())
            .map_err(|e| ResourceError::io("write", &self.path, e))?;
        Ok(ResourceChange::Applied)
    }
}
