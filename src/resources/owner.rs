//! File ownership.
use anyhow::Result;
use std::path::{Path, PathBuf};

use super::error::ResourceError;
use super::{Applicable, Resource, ResourceChange, ResourceState};

/// Resolve a user name or numeric uid.
///
/// # Errors
///
/// Returns [`ResourceError::UnknownUser`] if `name` is not numeric and not
/// in the user database.
pub fn resolve_user(name: &str) -> Result<u32, ResourceError> {
    if let Ok(uid) = name.parse::<u32>() {
        return Ok(uid);
    }
    lookup_user(name).ok_or_else(|| ResourceError::UnknownUser(name.to_string()))
}

/// Resolve a group name or numeric gid.
///
/// # Errors
///
/// Returns [`ResourceError::UnknownGroup`] if `name` is not numeric and not
/// in the group database.
pub fn resolve_group(name: &str) -> Result<u32, ResourceError> {
    if let Ok(gid) = name.parse::<u32>() {
        return Ok(gid);
    }
    lookup_group(name).ok_or_else(|| ResourceError::UnknownGroup(name.to_string()))
}

#[cfg(unix)]
fn lookup_user(name: &str) -> Option<u32> {
    nix::unistd::User::from_name(name)
        .ok()
        .flatten()
        .map(|u| u.uid.as_raw())
}

#[cfg(unix)]
fn lookup_group(name: &str) -> Option<u32> {
    nix::unistd::Group::from_name(name)
        .ok()
        .flatten()
        .map(|g| g.gid.as_raw())
}

#[cfg(not(unix))]
const fn lookup_user(_name: &str) -> Option<u32> {
    None
}

#[cfg(not(unix))]
const fn lookup_group(_name: &str) -> Option<u32> {
    None
}

/// Owner and group that a single path should carry.
///
/// `None` leaves that half unchanged.
#[derive(Debug, Clone)]
pub struct OwnerResource {
    /// Target path.
    pub path: PathBuf,
    /// Desired owner.
    pub uid: Option<u32>,
    /// Desired group.
    pub gid: Option<u32>,
    /// Change the symlink itself (`lchown`) rather than its target.
    pub no_follow: bool,
}

impl OwnerResource {
    /// Create a new ownership resource.
    #[must_use]
    pub fn new(path: &Path, uid: Option<u32>, gid: Option<u32>, no_follow: bool) -> Self {
        Self {
            path: path.to_path_buf(),
            uid,
            gid,
            no_follow,
        }
    }
}

fn id_text(id: Option<u32>) -> String {
    id.map_or_else(|| "-".to_string(), |id| id.to_string())
}

impl Applicable for OwnerResource {
    fn description(&self) -> String {
        format!(
            "chown {}:{} {}",
            id_text(self.uid),
            id_text(self.gid),
            self.path.display()
        )
    }

    fn apply(&self) -> Result<ResourceChange> {
        #[cfg(unix)]
        {
            let result = if self.no_follow {
                std::os::unix::fs::lchown(&self.path, self.uid, self.gid)
            } else {
                std::os::unix::fs::chown(&self.path, self.uid, self.gid)
            };
            result.map_err(|e| ResourceError::io("chown", &self.path, e))?;
            Ok(ResourceChange::Applied)
        }

        #[cfg(not(unix))]
        {
            Ok(ResourceChange::skipped("chown not supported on this platform"))
        }
    }
}

impl Resource for OwnerResource {
    fn current_state(&self) -> Result<ResourceState> {
        if self.uid.is_none() && self.gid.is_none() {
            return Ok(ResourceState::Correct);
        }
        let meta = if self.no_follow {
            self.path.symlink_metadata()
        } else {
            self.path.metadata()
        };
        let meta = match meta {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ResourceState::Invalid {
                    reason: format!("{} does not exist", self.path.display()),
                });
            }
            Err(e) => return Err(ResourceError::io("stat", &self.path, e).into()),
        };
        Ok(self.compare(&meta))
    }
}

impl OwnerResource {
    #[cfg(unix)]
    fn compare(&self, meta: &std::fs::Metadata) -> ResourceState {
        use std::os::unix::fs::MetadataExt as _;

        let uid_ok = self.uid.is_none_or(|uid| uid == meta.uid());
        let gid_ok = self.gid.is_none_or(|gid| gid == meta.gid());
        if uid_ok && gid_ok {
            ResourceState::Correct
        } else {
            ResourceState::Incorrect {
                current: format!("{}:{}", meta.uid(), meta.gid()),
            }
        }
    }

    #[cfg(not(unix))]
    fn compare(&self, _meta: &std::fs::Metadata) -> ResourceState {
        ResourceState::Invalid {
            reason: "chown not supported on this platform".to_string(),
        }
    }
}
