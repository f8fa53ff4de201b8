//! Tracing-backed logger with warning accounting and a run summary.
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::types::Log;

/// Implement the methods of [`Log`] by delegating to inherent methods of the
/// same name on the implementing type.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Structured logger that emits [`tracing`] events and counts warnings.
///
/// Console and file rendering is configured once by
/// [`init_subscriber`](super::subscriber::init_subscriber); this type only
/// decides the level and target of each event.
#[derive(Debug, Default)]
pub struct Logger {
    warnings: AtomicUsize,
    errors: AtomicUsize,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a new logger.
    ///
    /// `log_file` is only remembered for display in the run summary; the
    /// file itself is written by the subscriber's file layer.
    #[must_use]
    pub fn new(log_file: Option<PathBuf>) -> Self {
        Self {
            warnings: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            log_file,
        }
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        self.warnings.fetch_add(1, Ordering::Relaxed);
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: "tmpfiles::stage", "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message.
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Number of warnings logged so far.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.warnings.load(Ordering::Relaxed)
    }

    /// Number of errors logged so far.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    /// Print the end-of-run summary.
    ///
    /// `summary` is the engine's one-line account of what was applied.
    pub fn print_summary(&self, summary: &str) {
        self.stage("Summary");
        self.info(summary);

        let warnings = self.warning_count();
        let errors = self.error_count();
        if warnings > 0 || errors > 0 {
            self.info(&format!(
                "\x1b[33m{warnings} warning(s)\x1b[0m, \x1b[31m{errors} error(s)\x1b[0m"
            ));
        }

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error);
}
