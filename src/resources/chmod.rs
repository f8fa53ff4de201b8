//! Octal permission changes.
use anyhow::Result;
use std::path::{Path, PathBuf};

use super::error::ResourceError;
use super::{Applicable, Resource, ResourceChange, ResourceState};

/// Parse an octal permission string such as `"0755"` or `"1777"`.
///
/// # Errors
///
/// Returns [`ResourceError::InvalidMode`] for non-octal text or values
/// above `7777`.
///
/// # Examples
///
/// ```
/// use tmpfiles_cli::resources::chmod::parse_mode;
///
/// assert_eq!(parse_mode("0755").unwrap(), 0o755);
/// assert!(parse_mode("0888").is_err());
/// assert!(parse_mode("17777").is_err());
/// ```
pub fn parse_mode(text: &str) -> Result<u32, ResourceError> {
    u32::from_str_radix(text, 8)
        .ok()
        .filter(|m| *m <= 0o7777)
        .ok_or_else(|| ResourceError::InvalidMode {
            mode: text.to_string(),
        })
}

/// Permission bits that a single path should carry (Unix only).
#[derive(Debug, Clone)]
pub struct PermissionResource {
    /// Target path.
    pub path: PathBuf,
    /// Desired permission bits, at most `0o7777`.
    pub mode: u32,
    /// Leave symlinks alone instead of changing their targets.
    pub no_follow: bool,
}

impl PermissionResource {
    /// Create a new permission resource.
    #[must_use]
    pub fn new(path: &Path, mode: u32, no_follow: bool) -> Self {
        Self {
            path: path.to_path_buf(),
            mode,
            no_follow,
        }
    }
}

impl Applicable for PermissionResource {
    fn description(&self) -> String {
        format!("chmod {:04o} {}", self.mode, self.path.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt as _;

            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(self.mode))
                .map_err(|e| ResourceError::io("chmod", &self.path, e))?;
            Ok(ResourceChange::Applied)
        }

        #[cfg(not(unix))]
        {
            Ok(ResourceChange::skipped("chmod not supported on this platform"))
        }
    }
}

impl Resource for PermissionResource {
    fn current_state(&self) -> Result<ResourceState> {
        let meta = match self.path.symlink_metadata() {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ResourceState::Invalid {
                    reason: format!("{} does not exist", self.path.display()),
                });
            }
            Err(e) => return Err(ResourceError::io("stat", &self.path, e).into()),
        };
        if meta.file_type().is_symlink() {
            if self.no_follow {
                return Ok(ResourceState::Invalid {
                    reason: format!("{} is a symlink", self.path.display()),
                });
            }
            // Compare against the link target instead.
            return self.compare(&std::fs::metadata(&self.path).map_err(|e| {
                ResourceError::io("stat", &self.path, e)
            })?);
        }
        self.compare(&meta)
    }
}

impl PermissionResource {
    #[cfg(unix)]
    #[allow(clippy::unnecessary_wraps)]
    fn compare(&self, meta: &std::fs::Metadata) -> Result<ResourceState> {
        use std::os::unix::fs::PermissionsExt as _;

        let current = meta.permissions().mode() & 0o7777;
        if current == self.mode {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Incorrect {
                current: format!("{current:04o}"),
            })
        }
    }

    #[cfg(not(unix))]
    #[allow(clippy::unnecessary_wraps)]
    fn compare(&self, _meta: &std::fs::Metadata) -> Result<ResourceState> {
        Ok(ResourceState::Invalid {
            reason: "chmod not supported on this platform".to_string(),
        })
    }
}
