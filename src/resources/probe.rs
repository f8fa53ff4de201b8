//! Stateless path queries.
//!
//! All queries use `lstat` semantics: a symlink is reported as itself, never
//! as its target.
use std::fs::Metadata;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Whether `path` is a directory (not a symlink to one).
#[must_use]
pub fn is_dir(path: &Path) -> bool {
    path.symlink_metadata().is_ok_and(|m| m.is_dir())
}

/// The most recent of the access, modification and status-change times.
#[cfg(unix)]
#[must_use]
pub fn latest_timestamp(meta: &Metadata) -> SystemTime {
    use std::os::unix::fs::MetadataExt as _;

    [
        (meta.atime(), meta.atime_nsec()),
        (meta.mtime(), meta.mtime_nsec()),
        (meta.ctime(), meta.ctime_nsec()),
    ]
    .into_iter()
    .map(|(secs, nsecs)| from_unix(secs, nsecs))
    .max()
    .unwrap_or(UNIX_EPOCH)
}

/// The most recent of the access and modification times.
#[cfg(not(unix))]
#[must_use]
pub fn latest_timestamp(meta: &Metadata) -> SystemTime {
    [meta.accessed().ok(), meta.modified().ok()]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(UNIX_EPOCH)
}

/// Convert a `(seconds, nanoseconds)` pair from `stat` into a [`SystemTime`].
///
/// Times before the epoch clamp to the epoch.
#[cfg(unix)]
fn from_unix(secs: i64, nsecs: i64) -> SystemTime {
    let secs = u64::try_from(secs).unwrap_or(0);
    let nanos = u32::try_from(nsecs).unwrap_or(0).min(999_999_999);
    UNIX_EPOCH
        .checked_add(Duration::new(secs, nanos))
        .unwrap_or(UNIX_EPOCH)
}
