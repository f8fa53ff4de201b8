//! Inode attribute flags (`chattr`-style).
//!
//! Flags are read and written with the `FS_IOC_GETFLAGS` and
//! `FS_IOC_SETFLAGS` ioctls, which only exist on Linux.  Elsewhere the
//! handler reports a skip.
use anyhow::Result;
use std::path::{Path, PathBuf};

use super::error::ResourceError;
use super::{Applicable, ResourceChange};
use crate::logging::Log;

/// `chattr` letters and the inode flag bits they stand for.
pub const ATTRIBUTE_BITS: &[(char, i32)] = &[
    ('a', 0x0000_0020), // append only
    ('A', 0x0000_0080), // no atime updates
    ('c', 0x0000_0004), // compressed
    ('C', 0x0080_0000), // no copy on write
    ('d', 0x0000_0040), // no dump
    ('D', 0x0001_0000), // synchronous directory updates
    ('e', 0x0008_0000), // extents
    ('i', 0x0000_0010), // immutable
    ('j', 0x0000_4000), // data journalling
    ('P', 0x2000_0000), // project hierarchy
    ('s', 0x0000_0001), // secure deletion
    ('S', 0x0000_0008), // synchronous updates
    ('t', 0x0000_8000), // no tail merging
    ('T', 0x0002_0000), // top of directory hierarchy
    ('u', 0x0000_0002), // undeletable
    ('x', 0x0200_0000), // direct access
];

/// A parsed attribute argument such as `+iA` or `-a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeChange {
    /// Set the bits (`+`) or clear them (`-`).
    pub set: bool,
    /// Inode flag bits named by the argument.
    pub mask: i32,
}

impl AttributeChange {
    /// Parse an attribute argument.
    ///
    /// Unknown letters are logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidAttributeOp`] when the argument does
    /// not start with `+` or `-`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tmpfiles_cli::logging::BufferedLog;
    /// use tmpfiles_cli::resources::attrs::AttributeChange;
    ///
    /// let change = AttributeChange::parse("+ia", &BufferedLog::new()).unwrap();
    /// assert!(change.set);
    /// assert_eq!(change.mask, 0x10 | 0x20);
    /// assert!(AttributeChange::parse("ia", &BufferedLog::new()).is_err());
    /// ```
    pub fn parse(argument: &str, log: &dyn Log) -> Result<Self, ResourceError> {
        let mut chars = argument.chars();
        let set = match chars.next() {
            Some('+') => true,
            Some('-') => false,
            _ => {
                return Err(ResourceError::InvalidAttributeOp {
                    argument: argument.to_string(),
                });
            }
        };

        let mut mask = 0;
        for c in chars {
            match ATTRIBUTE_BITS.iter().find(|(letter, _)| *letter == c) {
                Some((_, bit)) => mask |= bit,
                None => log.warn(&format!("unknown attribute '{c}' in '{argument}'")),
            }
        }
        Ok(Self { set, mask })
    }

    /// Combine with the current flags.
    #[must_use]
    pub const fn apply_to(self, current: i32) -> i32 {
        if self.set {
            current | self.mask
        } else {
            current & !self.mask
        }
    }
}

/// Inode flags that a path should carry.
#[derive(Debug, Clone)]
pub struct AttributeResource {
    /// Target path.
    pub path: PathBuf,
    /// Requested change.
    pub change: AttributeChange,
}

impl AttributeResource {
    /// Create a new attribute resource.
    #[must_use]
    pub fn new(path: &Path, change: AttributeChange) -> Self {
        Self {
            path: path.to_path_buf(),
            change,
        }
    }
}

impl Applicable for AttributeResource {
    fn description(&self) -> String {
        let sign = if self.change.set { '+' } else { '-' };
        format!("chattr {sign}{:#x} {}", self.change.mask, self.path.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        #[cfg(target_os = "linux")]
        {
            let file = std::fs::File::open(&self.path)
                .map_err(|e| ResourceError::io("open", &self.path, e))?;
            let current = ioctl::get_flags(&file)
                .map_err(|e| ResourceError::io("getflags", &self.path, e.into()))?;
            let wanted = self.change.apply_to(current);
            if wanted == current {
                return Ok(ResourceChange::AlreadyCorrect);
            }
            ioctl::set_flags(&file, wanted)
                .map_err(|e| ResourceError::io("setflags", &self.path, e.into()))?;
            Ok(ResourceChange::Applied)
        }

        #[cfg(not(target_os = "linux"))]
        {
            Ok(ResourceChange::skipped(
                "inode attributes not supported on this platform",
            ))
        }
    }
}

#[cfg(target_os = "linux")]
#[allow(unsafe_code)]
mod ioctl {
    use std::fs::File;
    use std::os::fd::AsRawFd as _;
    use std::os::raw::{c_int, c_long};

    nix::ioctl_read_bad!(
        fs_ioc_getflags,
        nix::request_code_read!(b'f', 1, size_of::<c_long>()),
        c_int
    );
    nix::ioctl_write_ptr_bad!(
        fs_ioc_setflags,
        nix::request_code_write!(b'f', 2, size_of::<c_long>()),
        c_int
    );

    pub fn get_flags(file: &File) -> nix::Result<c_int> {
        let mut flags: c_int = 0;
        // SAFETY: the descriptor is open for the lifetime of `file` and the
        // kernel writes a single int into `flags`.
        unsafe { fs_ioc_getflags(file.as_raw_fd(), &raw mut flags) }?;
        Ok(flags)
    }

    pub fn set_flags(file: &File, flags: c_int) -> nix::Result<()> {
        // SAFETY: the descriptor is open for the lifetime of `file` and the
        // kernel only reads a single int from `flags`.
        unsafe { fs_ioc_setflags(file.as_raw_fd(), &raw const flags) }?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::BufferedLog;

    #[test]
    fn plus_sets_minus_clears() {
        let log = BufferedLog::new();
        let add = AttributeChange::parse("+i", &log).unwrap();
        let del = AttributeChange::parse("-i", &log).unwrap();
        assert_eq!(add.apply_to(0x20), 0x30);
        assert_eq!(del.apply_to(0x30), 0x20);
    }

    #[test]
    fn every_letter_maps_to_a_distinct_bit() {
        let mut seen = 0;
        for (letter, bit) in ATTRIBUTE_BITS {
            assert_eq!(bit.count_ones(), 1, "{letter}");
            assert_eq!(seen & bit, 0, "{letter} overlaps");
            seen |= bit;
        }
        assert_eq!(ATTRIBUTE_BITS.len(), 16);
    }

    #[test]
    fn unknown_letters_warn_but_do_not_abort() {
        let log = BufferedLog::new();
        let change = AttributeChange::parse("+iZ", &log).unwrap();
        assert_eq!(change.mask, 0x10);
        assert!(log.has_warning("unknown attribute 'Z'"));
    }

    #[test]
    fn missing_sign_is_rejected() {
        let log = BufferedLog::new();
        for bad in ["", "i", "=i"] {
            assert!(
                matches!(
                    AttributeChange::parse(bad, &log),
                    Err(ResourceError::InvalidAttributeOp { .. })
                ),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn bare_sign_is_an_empty_change() {
        let change = AttributeChange::parse("-", &BufferedLog::new()).unwrap();
        assert_eq!(change.mask, 0);
        assert_eq!(change.apply_to(0x1234), 0x1234);
    }

    #[test]
    fn description_shows_sign_and_mask() {
        let change = AttributeChange::parse("+i", &BufferedLog::new()).unwrap();
        let r = AttributeResource::new(Path::new("/var/log/x"), change);
        assert_eq!(r.description(), "chattr +0x10 /var/log/x");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let change = AttributeChange::parse("+A", &BufferedLog::new()).unwrap();
        let r = AttributeResource::new(&dir.path().join("nope"), change);
        assert!(r.apply().is_err());
    }
}
