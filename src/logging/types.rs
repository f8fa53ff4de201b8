//! Core logging types: message levels and the [`Log`] trait.

/// Level of a single log message.
///
/// `Stage` sits between `Info` and `Warn`: it is an informational section
/// header rendered differently on the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Detail that is only shown with `--verbose`.
    Debug,
    /// Normal progress output.
    Info,
    /// A section header (one per configuration source).
    Stage,
    /// A recoverable failure; processing continues.
    Warn,
    /// A failure that ends the run.
    Error,
}

/// Abstraction over logging backends.
///
/// Both [`Logger`](super::logger::Logger) (tracing-backed output) and
/// [`BufferedLog`](super::buffered::BufferedLog) (in-memory capture) implement
/// this trait, so the engine and handlers can log without knowing where the
/// messages end up.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (suppressed on console unless verbose).
    fn debug(&self, msg: &str);
    /// Log a recoverable warning.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
}
