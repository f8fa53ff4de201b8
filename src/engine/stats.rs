//! Counters reported at the end of a run.
use super::dispatch::Outcome;

/// Counters collected while applying rules.
///
/// # Examples
///
/// ```
/// use tmpfiles_cli::engine::RunStats;
///
/// let stats = RunStats { rules: 4, paths: 6, changed: 3, already_ok: 10, ..RunStats::default() };
/// assert_eq!(stats.summary(), "4 rules, 6 paths: 3 changed, 10 already ok");
/// ```
///
/// Skipped and failed handlers are only mentioned when present:
///
/// ```
/// use tmpfiles_cli::engine::RunStats;
///
/// let stats = RunStats { rules: 1, paths: 1, changed: 0, already_ok: 1, skipped: 2, failed: 1 };
/// assert_eq!(stats.summary(), "1 rules, 1 paths: 0 changed, 1 already ok, 2 skipped, 1 failed");
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    /// Rules read from all configuration sources.
    pub rules: u32,
    /// Paths dispatched (after glob expansion).
    pub paths: u32,
    /// Handlers that changed something on disk.
    pub changed: u32,
    /// Handlers that found nothing to do.
    pub already_ok: u32,
    /// Handlers that did not act (mode disabled, path missing, …).
    pub skipped: u32,
    /// Handlers that failed with a warning.
    pub failed: u32,
}

impl RunStats {
    /// Count one handler outcome.
    pub const fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Changed => self.changed += 1,
            Outcome::Unchanged => self.already_ok += 1,
            Outcome::Skipped(_) => self.skipped += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
    }

    /// One-line summary, e.g. `"4 rules, 6 paths: 3 changed, 10 already ok"`.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut s = format!(
            "{} rules, {} paths: {} changed, {} already ok",
            self.rules, self.paths, self.changed, self.already_ok
        );
        if self.skipped > 0 {
            s.push_str(&format!(", {} skipped", self.skipped));
        }
        if self.failed > 0 {
            s.push_str(&format!(", {} failed", self.failed));
        }
        s
    }
}
