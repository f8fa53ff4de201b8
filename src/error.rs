//! Domain-specific error types for the tmpfiles engine.
//!
//! Internal modules return typed errors while the command layer converts
//! them to [`anyhow::Error`] via `?`.
//!
//! ```text
//! ConfigError    - unreadable configuration sources
//! RuleError      - malformed configuration lines
//! AgeError       - unparseable age fields
//! FatalError     - conditions that abort the run
//! ```
//!
//! Only [`FatalError`] stops processing; every other error is logged as a
//! warning by the caller and the run moves on.

use thiserror::Error;

/// Errors that arise from reading configuration sources.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configuration file or directory could not be read.
    #[error("cannot read configuration {path}: {source}")]
    Io {
        /// Path of the source that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise while parsing one configuration line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// The line has a type field but no path.
    #[error("missing path after type '{kind}'")]
    MissingPath {
        /// The type field as written.
        kind: String,
    },

    /// The line could not be split into words (e.g. an unterminated quote).
    #[error("cannot split line: {0}")]
    Tokenize(String),

    /// A type character has no entry in the attribute table.
    #[error("unknown type character '{0}'")]
    UnknownType(char),
}

/// Errors that arise from parsing an age expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgeError {
    /// A number was expected at the given byte offset.
    #[error("expected a number at offset {offset} in '{text}'")]
    MissingNumber {
        /// The full age expression.
        text: String,
        /// Byte offset of the failure.
        offset: usize,
    },

    /// The unit after a number is not one of `s m h d w`.
    #[error("unknown unit '{unit}' in '{text}'")]
    UnknownUnit {
        /// The full age expression.
        text: String,
        /// The offending unit, or an empty string when the unit is missing.
        unit: String,
    },

    /// The summed age does not fit in a duration.
    #[error("age '{text}' is too large")]
    TooLarge {
        /// The full age expression.
        text: String,
    },
}

/// Conditions that abort the whole run.
#[derive(Error, Debug)]
pub enum FatalError {
    /// The exclusion registry could not grow; continuing could over-delete.
    #[error("cannot register exclusion '{pattern}': {source}")]
    ExclusionRegistry {
        /// Pattern that could not be stored.
        pattern: String,
        /// Allocation failure reported by the collection.
        source: std::collections::TryReserveError,
    },
}
