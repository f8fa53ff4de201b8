//! Typed error variants for handler operations.
//!
//! Handlers return these through [`anyhow::Error`]; the dispatcher logs
//! them as warnings.

use thiserror::Error;

/// Errors raised by handlers.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The mode field is not an octal number up to `7777`.
    #[error("invalid octal mode '{mode}'")]
    InvalidMode {
        /// The mode as written.
        mode: String,
    },

    /// The user name is not in the user database.
    #[error("unknown user '{0}'")]
    UnknownUser(String),

    /// The group name is not in the group database.
    #[error("unknown group '{0}'")]
    UnknownGroup(String),

    /// The attribute argument does not start with `+` or `-`.
    #[error("invalid attribute operation '{argument}': expected leading '+' or '-'")]
    InvalidAttributeOp {
        /// The argument as written.
        argument: String,
    },

    /// A filesystem call failed.
    #[error("{op} {path}: {source}")]
    Io {
        /// Short name of the failed operation (`mkdir`, `chmod`, …).
        op: &'static str,
        /// Path the operation was applied to.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl ResourceError {
    /// Wrap an I/O error with the operation name and path.
    #[must_use]
    pub fn io(op: &'static str, path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.display().to_string(),
            source,
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn invalid_mode_display() {
        let e = ResourceError::InvalidMode {
            mode: "0999".to_string(),
        };
        assert_eq!(e.to_string(), "invalid octal mode '0999'");
    }

    #[test]
    fn unknown_user_display() {
        assert_eq!(
            ResourceError::UnknownUser("nobody2".to_string()).to_string(),
            "unknown user 'nobody2'"
        );
    }

    #[test]
    fn io_display_includes_op_and_path() {
        let e = ResourceError::io(
            "mkdir",
            Path::new("/run/app"),
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        let s = e.to_string();
        assert!(s.starts_with("mkdir /run/app: "), "got: {s}");
    }

    #[test]
    fn resource_error_converts_to_anyhow() {
        let e = ResourceError::UnknownGroup("wheel2".to_string());
        let _anyhow_err: anyhow::Error = e.into();
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn resource_error_is_send_sync() {
        assert_send_sync::<ResourceError>();
    }
}
