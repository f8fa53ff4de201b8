//! In-memory logger that captures messages instead of printing them.
use std::sync::Mutex;

use super::types::{Level, Log};

/// Implement the methods of [`Log`] by pushing each message into
/// `self.entries` with the corresponding [`Level`].
macro_rules! buffer_log_methods {
    ($($method:ident => $level:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                if let Ok(mut guard) = self.entries.lock() {
                    guard.push((Level::$level, msg.to_string()));
                }
            }
        )+
    };
}

/// Logger that keeps every message in memory.
///
/// Used where the caller wants to inspect what the engine reported (tests,
/// embedding the engine in another tool) or to defer output and
/// [`replay`](Self::replay) it later through the global subscriber.
#[derive(Debug, Default)]
pub struct BufferedLog {
    entries: Mutex<Vec<(Level, String)>>,
}

impl BufferedLog {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every captured `(level, message)` pair, in order.
    #[must_use]
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Messages captured at exactly `level`.
    #[must_use]
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    /// Captured warnings.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.messages(Level::Warn)
    }

    /// Return `true` if any warning contains `needle`.
    #[must_use]
    pub fn has_warning(&self, needle: &str) -> bool {
        self.warnings().iter().any(|w| w.contains(needle))
    }

    /// Replay captured entries as tracing events, in order.
    pub fn replay(&self) {
        for (level, msg) in self.entries() {
            match level {
                Level::Stage => tracing::info!(target: "tmpfiles::stage", "{msg}"),
                Level::Info => tracing::info!("{msg}"),
                Level::Debug => tracing::debug!("{msg}"),
                Level::Warn => tracing::warn!("{msg}"),
                Level::Error => tracing::error!("{msg}"),
            }
        }
    }
}

impl Log for BufferedLog {
    buffer_log_methods!(
        stage => Stage,
        info => Info,
        debug => Debug,
        warn => Warn,
        error => Error,
    );
}
