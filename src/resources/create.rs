//! Directory and empty-file creation.
use anyhow::Result;
use std::fs::{DirBuilder, OpenOptions};
use std::path::{Path, PathBuf};

use super::error::ResourceError;
use super::{Applicable, Resource, ResourceChange, ResourceState};

/// Mode given to directories created by a rule.
pub const DIR_MODE: u32 = 0o755;
/// Mode given to files created by a rule.
pub const FILE_MODE: u32 = 0o644;

/// A directory that should exist.
#[derive(Debug, Clone)]
pub struct CreateDirResource {
    /// Directory path.
    pub path: PathBuf,
}

impl CreateDirResource {
    /// Create a new directory resource.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl Applicable for CreateDirResource {
    fn description(&self) -> String {
        format!("mkdir {}", self.path.display())
    }

    /// Create the directory (and missing parents) and set [`DIR_MODE`]
    /// explicitly so the process umask has no effect.
    fn apply(&self) -> Result<ResourceChange> {
        DirBuilder::new()
            .recursive(true)
            .create(&self.path)
            .map_err(|e| ResourceError::io("mkdir", &self.path, e))?;
        set_mode(&self.path, DIR_MODE)?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for CreateDirResource {
    fn current_state(&self) -> Result<ResourceState> {
        match self.path.symlink_metadata() {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ResourceState::Missing),
            Err(e) => Err(ResourceError::io("stat", &self.path, e).into()),
            Ok(m) if m.is_dir() => Ok(ResourceState::Correct),
            Ok(_) => Ok(ResourceState::Invalid {
                reason: format!("{} exists and is not a directory", self.path.display()),
            }),
        }
    }
}

/// An empty regular file that should exist.  Existing content is never
/// touched.
#[derive(Debug, Clone)]
pub struct CreateFileResource {
    /// File path.
    pub path: PathBuf,
}

impl CreateFileResource {
    /// Create a new file resource.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl Applicable for CreateFileResource {
    fn description(&self) -> String {
        format!("create {}", self.path.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        // create_new fails instead of truncating if the file appeared since
        // the state check.
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .map_err(|e| ResourceError::io("create", &self.path, e))?;
        set_mode(&self.path, FILE_MODE)?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for CreateFileResource {
    fn current_state(&self) -> Result<ResourceState> {
        match self.path.symlink_metadata() {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ResourceState::Missing),
            Err(e) => Err(ResourceError::io("stat", &self.path, e).into()),
            Ok(m) if m.is_file() => Ok(ResourceState::Correct),
            Ok(_) => Ok(ResourceState::Invalid {
                reason: format!("{} exists and is not a regular file", self.path.display()),
            }),
        }
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), ResourceError> {
    use std::os::unix::fs::PermissionsExt as _;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .map_err(|e| ResourceError::io("chmod", path, e))
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
const fn set_mode(_path: &Path, _mode: u32) -> Result<(), ResourceError> {
    Ok(())
}
