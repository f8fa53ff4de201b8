//! Capability flags and the type-character attribute table.
//!
//! Every rule line starts with a type field such as `d`, `f` or `D!`.
//! Each character resolves to a set of [`Flag`]s; the union over the whole
//! field decides which handlers run.  The discriminant of each flag is its
//! bit position and also its execution slot: the dispatcher walks
//! [`Flag::ALL`] in ascending order, so `Create` always runs before `Write`
//! and `CreateDir` before `Ownership`, `Permission` and `Clean`.
use std::fmt;

use crate::error::RuleError;

/// A single capability bit.
///
/// Bit 0 is never used.  Discriminants are explicit so that reordering the
/// variants in source cannot change execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Flag {
    /// Create an empty regular file if missing.
    Create = 1,
    /// Create a directory if missing.
    CreateDir = 2,
    /// Modifier: the write handler appends instead of truncating.
    Append = 3,
    /// Modifier: ownership and permission changes do not follow symlinks.
    NoFollow = 4,
    /// Modifier: ownership and permission changes descend into directories.
    Recursive = 5,
    /// Write the argument into an existing file.
    Write = 6,
    /// Change owner and/or group.
    Ownership = 7,
    /// Change the permission bits.
    Permission = 8,
    /// Remove entries older than the age field.
    Clean = 9,
    /// Remove the path and, for directories, all contents.
    Remove = 10,
    /// Set or clear inode attribute flags (`chattr`).
    Attributes = 11,
    /// Protect the path pattern from cleaning.
    Exclude = 12,
    /// Modifier: only apply the rule in boot mode.  Stripped before dispatch.
    OnBoot = 13,
    /// Modifier: the path is a glob pattern.  Stripped before dispatch.
    Glob = 14,
}

impl Flag {
    /// Every flag in ascending bit order.
    pub const ALL: [Self; 14] = [
        Self::Create,
        Self::CreateDir,
        Self::Append,
        Self::NoFollow,
        Self::Recursive,
        Self::Write,
        Self::Ownership,
        Self::Permission,
        Self::Clean,
        Self::Remove,
        Self::Attributes,
        Self::Exclude,
        Self::OnBoot,
        Self::Glob,
    ];

    /// Bit position of this flag.
    #[must_use]
    pub const fn bit(self) -> u32 {
        self as u32
    }

    /// Mask with only this flag's bit set.
    #[must_use]
    pub const fn mask(self) -> u32 {
        1 << self.bit()
    }

    /// Whether a handler is bound to this flag.
    ///
    /// Modifiers only change how other handlers behave.
    #[must_use]
    pub const fn has_handler(self) -> bool {
        !matches!(
            self,
            Self::Append | Self::NoFollow | Self::Recursive | Self::OnBoot | Self::Glob
        )
    }

    /// Short lowercase name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::CreateDir => "create-dir",
            Self::Append => "append",
            Self::NoFollow => "no-follow",
            Self::Recursive => "recursive",
            Self::Write => "write",
            Self::Ownership => "ownership",
            Self::Permission => "permission",
            Self::Clean => "clean",
            Self::Remove => "remove",
            Self::Attributes => "attributes",
            Self::Exclude => "exclude",
            Self::OnBoot => "on-boot",
            Self::Glob => "glob",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of [`Flag`]s stored as a bitmask.
///
/// # Examples
///
/// ```
/// use tmpfiles_cli::config::attributes::{Flag, Flags};
///
/// let flags = Flags::empty().with(Flag::Write).with(Flag::Create);
/// let order: Vec<Flag> = flags.iter().collect();
/// assert_eq!(order, [Flag::Create, Flag::Write]);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags(u32);

impl Flags {
    /// The empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Build a set from a list of flags.
    #[must_use]
    pub const fn of(flags: &[Flag]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < flags.len() {
            bits |= flags[i].mask();
            i += 1;
        }
        Self(bits)
    }

    /// Whether no flag is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether `flag` is set.
    #[must_use]
    pub const fn contains(self, flag: Flag) -> bool {
        self.0 & flag.mask() != 0
    }

    /// Copy with `flag` added.
    #[must_use]
    pub const fn with(self, flag: Flag) -> Self {
        Self(self.0 | flag.mask())
    }

    /// Copy with `flag` removed.
    #[must_use]
    pub const fn without(self, flag: Flag) -> Self {
        Self(self.0 & !flag.mask())
    }

    /// Union of two sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Set flags in ascending bit order.
    pub fn iter(self) -> impl Iterator<Item = Flag> {
        Flag::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

impl std::ops::BitOr for Flags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Flag::name).collect();
        f.write_str(&names.join("|"))
    }
}

const DIRECTORY: Flags = Flags::of(&[
    Flag::CreateDir,
    Flag::Ownership,
    Flag::Permission,
    Flag::Clean,
]);

const ADJUST: Flags = Flags::of(&[Flag::Ownership, Flag::Permission, Flag::NoFollow, Flag::Glob]);

/// Type characters understood by the parser, in table order.
pub const TYPE_CHARS: &[char] = &[
    'f', 'w', 'd', 'D', 'q', 'Q', 'r', 'R', 'h', 'x', 'z', 'Z', '!', '+',
];

/// Look up the flags contributed by one type character.
///
/// # Errors
///
/// Returns [`RuleError::UnknownType`] for characters without a table row.
/// The parser downgrades this to a warning and the character contributes
/// nothing.
pub fn lookup(c: char) -> Result<Flags, RuleError> {
    let flags = match c {
        'f' => Flags::of(&[Flag::Create, Flag::Write, Flag::Ownership, Flag::Permission]),
        'w' => Flags::of(&[Flag::Write]),
        'd' | 'q' => DIRECTORY,
        'D' | 'Q' => DIRECTORY.with(Flag::Remove),
        'r' | 'R' => Flags::of(&[Flag::Remove, Flag::Glob]),
        'h' => Flags::of(&[Flag::Attributes, Flag::Glob]),
        'x' => Flags::of(&[Flag::Exclude]),
        'z' => ADJUST,
        'Z' => ADJUST.with(Flag::Recursive),
        '!' => Flags::of(&[Flag::OnBoot]),
        '+' => Flags::of(&[Flag::Append]),
        other => return Err(RuleError::UnknownType(other)),
    };
    Ok(flags)
}
