//! Age-based cleanup of directory contents.
use anyhow::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use walkdir::DirEntry;

use super::exclusions::ExclusionRegistry;
use super::walk::Walk;
use super::{Applicable, ResourceChange, probe};
use crate::config::age::parse_age;
use crate::logging::Log;

/// Compute the clean deadline for an age field.
///
/// Entries whose latest timestamp is older than the deadline are removed.
/// An unset or negative age means there is no deadline.  An age reaching
/// back past the Unix epoch clamps to the epoch.  An age that does not
/// parse is logged and treated as zero, so everything is due.
#[must_use]
pub fn deadline(age: Option<&str>, now: SystemTime, log: &dyn Log) -> Option<SystemTime> {
    match parse_age(age.unwrap_or_default()) {
        Ok(None) => None,
        Ok(Some(age)) => {
            let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or_default();
            Some(UNIX_EPOCH + since_epoch.saturating_sub(age))
        }
        Err(e) => {
            log.warn(&format!("{e}; treating entries as expired"));
            Some(now)
        }
    }
}

/// Remove entries below a directory that are older than a deadline.
///
/// Traversal is recursive and post-order, so a directory emptied by this
/// pass can be removed in the same pass if it is old enough itself.
/// Hidden entries and excluded paths are never touched, and neither is
/// anything below a hidden or excluded directory.
pub struct CleanResource<'a> {
    path: PathBuf,
    deadline: Option<SystemTime>,
    force: bool,
    exclusions: &'a ExclusionRegistry,
    log: &'a dyn Log,
}

impl fmt::Debug for CleanResource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanResource")
            .field("path", &self.path)
            .field("deadline", &self.deadline)
            .field("force", &self.force)
            .finish_non_exhaustive()
    }
}

impl<'a> CleanResource<'a> {
    /// Create a cleanup action for `path`.
    ///
    /// With `force`, every non-excluded entry is removed whatever its age.
    #[must_use]
    pub fn new(
        path: &Path,
        deadline: Option<SystemTime>,
        force: bool,
        exclusions: &'a ExclusionRegistry,
        log: &'a dyn Log,
    ) -> Self {
        Self {
            path: path.to_path_buf(),
            deadline,
            force,
            exclusions,
            log,
        }
    }

    fn is_expired(&self, entry: &DirEntry) -> bool {
        if self.force {
            return true;
        }
        let Some(deadline) = self.deadline else {
            return false;
        };
        match entry.metadata() {
            Ok(meta) => probe::latest_timestamp(&meta) < deadline,
            Err(e) => {
                self.log
                    .warn(&format!("cannot stat {}: {e}", entry.path().display()));
                false
            }
        }
    }

    fn remove(&self, entry: &DirEntry) -> bool {
        let path = entry.path();
        let result = if entry.file_type().is_dir() {
            std::fs::remove_dir(path)
        } else {
            std::fs::remove_file(path)
        };
        match result {
            Ok(()) => {
                self.log.debug(&format!("removed {}", path.display()));
                true
            }
            Err(e) => {
                self.log
                    .warn(&format!("cannot remove {}: {e}", path.display()));
                false
            }
        }
    }
}

impl Applicable for CleanResource<'_> {
    fn description(&self) -> String {
        format!("clean {}", self.path.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        if !probe::is_dir(&self.path) {
            return Ok(ResourceChange::skipped(format!(
                "{} is not a directory",
                self.path.display()
            )));
        }
        if self.deadline.is_none() && !self.force {
            return Ok(ResourceChange::skipped("no age limit"));
        }

        let mut removed = 0_usize;
        Walk::new(&self.path).recursive(true).run_pruned(
            self.log,
            |entry| {
                let excluded = self.exclusions.is_excluded(entry.path());
                if excluded {
                    self.log
                        .debug(&format!("keeping excluded {}", entry.path().display()));
                }
                excluded
            },
            |entry| {
                if self.is_expired(entry) && self.remove(entry) {
                    removed += 1;
                }
            },
        );

        if removed == 0 {
            Ok(ResourceChange::AlreadyCorrect)
        } else {
            self.log.debug(&format!(
                "cleaned {removed} entries from {}",
                self.path.display()
            ));
            Ok(ResourceChange::Applied)
        }
    }
}
