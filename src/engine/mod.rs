//! Applies the rules of every configuration source.
//!
//! A run has three phases:
//!
//! 1. read and parse every source, in the order given;
//! 2. register all exclusion rules, so that they are known before any
//!    destructive handler runs, whatever file they came from;
//! 3. dispatch each rule (after prefix filtering and glob expansion) in
//!    file order.
pub mod dispatch;
mod stats;

pub use dispatch::{DispatchReport, Dispatcher, Outcome};
pub use stats::RunStats;

use std::path::PathBuf;
use std::time::SystemTime;

use crate::config::attributes::Flag;
use crate::config::rules::{Rule, Target};
use crate::config::{self, Config};
use crate::error::FatalError;
use crate::logging::Log;
use crate::resources::exclusions::ExclusionRegistry;
use crate::resources::glob;

/// One run over a set of configuration sources.
pub struct Engine<'a> {
    config: &'a Config,
    log: &'a dyn Log,
    now: SystemTime,
}

impl std::fmt::Debug for Engine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}

impl<'a> Engine<'a> {
    /// Create an engine that measures ages against the current time.
    #[must_use]
    pub fn new(config: &'a Config, log: &'a dyn Log) -> Self {
        Self {
            config,
            log,
            now: SystemTime::now(),
        }
    }

    /// Measure ages against `now` instead of the current time.
    #[must_use]
    pub const fn with_now(mut self, now: SystemTime) -> Self {
        self.now = now;
        self
    }

    /// Read every configured source.
    ///
    /// Unreadable sources are warned about and skipped.
    #[must_use]
    pub fn load(&self) -> Vec<Rule> {
        let mut rules = Vec::new();
        for file in config::expand_sources(&self.config.sources, self.log) {
            self.log.stage(&file.display().to_string());
            match config::load_rules(&file, self.config.modes.boot, self.log) {
                Ok(loaded) => {
                    self.log.debug(&format!("{} rules", loaded.len()));
                    rules.extend(loaded);
                }
                Err(e) => self.log.warn(&e.to_string()),
            }
        }
        rules
    }

    /// Load and apply every rule.
    ///
    /// # Errors
    ///
    /// Returns [`FatalError`] if the exclusion registry cannot grow; the
    /// remaining rules are not applied.
    pub fn run(&self) -> Result<RunStats, FatalError> {
        let rules = self.load();
        self.apply(&rules)
    }

    /// Apply already-loaded rules.
    ///
    /// # Errors
    ///
    /// Returns [`FatalError`] if the exclusion registry cannot grow.
    pub fn apply(&self, rules: &[Rule]) -> Result<RunStats, FatalError> {
        let mut stats = RunStats {
            rules: u32::try_from(rules.len()).unwrap_or(u32::MAX),
            ..RunStats::default()
        };
        let rules: Vec<&Rule> = rules.iter().filter(|r| self.accepts(r)).collect();

        let mut exclusions = ExclusionRegistry::new();
        for rule in rules.iter().filter(|r| r.record.flags.contains(Flag::Exclude)) {
            for path in self.expand(&rule.target) {
                exclusions.register(&path.to_string_lossy())?;
            }
        }
        self.log
            .debug(&format!("{} exclusions registered", exclusions.len()));

        let dispatcher = Dispatcher::new(self.config.modes, self.now, self.log);
        for rule in rules {
            self.log
                .debug(&format!("{}: {} {}", rule.origin, rule.record.flags, rule.target));
            for path in self.expand(&rule.target) {
                let report = dispatcher.dispatch(&mut exclusions, &path, &rule.record)?;
                stats.paths += 1;
                for (_, outcome) in &report.handlers {
                    stats.record(outcome);
                }
            }
        }
        Ok(stats)
    }

    fn accepts(&self, rule: &Rule) -> bool {
        let accepted = self.config.accepts(&rule.target.as_str());
        if !accepted {
            self.log
                .debug(&format!("{}: {} filtered by prefix", rule.origin, rule.target));
        }
        accepted
    }

    fn expand(&self, target: &Target) -> Vec<PathBuf> {
        match target {
            Target::Path(path) => vec![path.clone()],
            Target::Pattern(pattern) => glob::expand(pattern, self.log),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::Modes;
    use crate::logging::BufferedLog;
    use std::fs::{File, FileTimes};
    use std::path::Path;
    use std::time::Duration;

    const DAY: Duration = Duration::from_secs(86_400);

    fn config_with(dir: &Path, content: &str, modes: Modes) -> Config {
        let file = dir.join("test.conf");
        std::fs::write(&file, content).unwrap();
        Config {
            modes,
            sources: vec![file],
            ..Config::default()
        }
    }

    fn all_modes() -> Modes {
        Modes {
            create: true,
            clean: true,
            remove: true,
            ..Modes::default()
        }
    }

    fn touch(path: &Path) {
        let file = File::create(path).unwrap();
        let now = SystemTime::now();
        file.set_times(FileTimes::new().set_accessed(now).set_modified(now))
            .unwrap();
    }

    #[test]
    fn exclusions_apply_to_earlier_clean_rules() {
        let work = tempfile::tempdir().unwrap();
        let target = work.path().join("t");
        std::fs::create_dir(&target).unwrap();
        touch(&target.join("keep"));
        touch(&target.join("drop"));

        let content = format!(
            "d {t} - - - 1s\nx {t}/keep\n",
            t = target.display()
        );
        let config = config_with(work.path(), &content, all_modes());
        let log = BufferedLog::new();
        Engine::new(&config, &log)
            .with_now(SystemTime::now() + 3 * DAY)
            .run()
            .unwrap();

        assert!(target.join("keep").exists());
        assert!(!target.join("drop").exists());
    }

    #[test]
    fn glob_rules_dispatch_every_match() {
        let work = tempfile::tempdir().unwrap();
        for name in ["a.pid", "b.pid", "c.txt"] {
            touch(&work.path().join(name));
        }
        let content = format!("r {}/*.pid\n", work.path().display());
        let config = config_with(work.path(), &content, all_modes());
        let log = BufferedLog::new();
        let stats = Engine::new(&config, &log).run().unwrap();

        assert_eq!(stats.rules, 1);
        assert_eq!(stats.paths, 2);
        assert_eq!(stats.changed, 2);
        assert!(!work.path().join("a.pid").exists());
        assert!(work.path().join("c.txt").exists());
    }

    #[test]
    fn prefix_filter_limits_rules() {
        let work = tempfile::tempdir().unwrap();
        let content = format!(
            "d {w}/in\nd {w}/out\n",
            w = work.path().display()
        );
        let mut config = config_with(work.path(), &content, all_modes());
        config.prefixes = vec![work.path().join("in")];
        let log = BufferedLog::new();
        let stats = Engine::new(&config, &log).run().unwrap();

        assert_eq!(stats.rules, 2);
        assert_eq!(stats.paths, 1);
        assert!(work.path().join("in").is_dir());
        assert!(!work.path().join("out").exists());
    }

    #[test]
    fn boot_rules_need_boot_mode() {
        let work = tempfile::tempdir().unwrap();
        let content = format!("d! {}/boot\n", work.path().display());

        let config = config_with(work.path(), &content, all_modes());
        let log = BufferedLog::new();
        Engine::new(&config, &log).run().unwrap();
        assert!(!work.path().join("boot").exists());

        let config = config_with(
            work.path(),
            &content,
            Modes {
                boot: true,
                ..all_modes()
            },
        );
        Engine::new(&config, &log).run().unwrap();
        assert!(work.path().join("boot").is_dir());
    }

    #[test]
    fn unreadable_source_is_a_warning() {
        let work = tempfile::tempdir().unwrap();
        let config = Config {
            modes: all_modes(),
            sources: vec![work.path().join("missing.conf")],
            ..Config::default()
        };
        let log = BufferedLog::new();
        let stats = Engine::new(&config, &log).run().unwrap();
        assert_eq!(stats.rules, 0);
        assert!(log.has_warning("missing.conf"));
    }

    #[test]
    fn sources_are_processed_in_order() {
        let work = tempfile::tempdir().unwrap();
        let target = work.path().join("f");
        let first = work.path().join("1.conf");
        let second = work.path().join("2.conf");
        std::fs::write(&first, format!("f {} - - - - one\n", target.display())).unwrap();
        std::fs::write(&second, format!("w {} - - - - two\n", target.display())).unwrap();
        let config = Config {
            modes: all_modes(),
            sources: vec![first, second],
            ..Config::default()
        };
        let log = BufferedLog::new();
        Engine::new(&config, &log).run().unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "two");
    }
}
