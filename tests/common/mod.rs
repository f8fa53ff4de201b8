// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed workspace and a fluent builder so
// each integration test can lay out files, ages and rule files without
// repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::fs::{File, FileTimes};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tmpfiles_cli::config::{Config, Modes};
use tmpfiles_cli::engine::{Engine, RunStats};
use tmpfiles_cli::logging::BufferedLog;

/// One day.
pub const DAY: Duration = Duration::from_secs(86_400);
/// One hour.
pub const HOUR: Duration = Duration::from_secs(3_600);

/// An isolated workspace backed by a [`tempfile::TempDir`].
///
/// Rule files live in `conf/`, managed paths in `data/`, so that cleaning
/// `data/` never touches the rules.
pub struct IntegrationTestContext {
    /// Temporary directory holding `conf/` and `data/`.
    pub root: tempfile::TempDir,
    /// Reference time handed to the engine.
    pub now: SystemTime,
}

impl IntegrationTestContext {
    /// Create a new context with empty `conf/` and `data/` directories.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir(root.path().join("conf")).expect("create conf dir");
        std::fs::create_dir(root.path().join("data")).expect("create data dir");
        Self {
            root,
            now: SystemTime::now(),
        }
    }

    /// The `conf/` directory.
    pub fn conf_dir(&self) -> PathBuf {
        self.root.path().join("conf")
    }

    /// A path below `data/`.
    pub fn data(&self, rel: &str) -> PathBuf {
        let data = self.root.path().join("data");
        if rel.is_empty() { data } else { data.join(rel) }
    }

    /// Configuration reading every rule file in `conf/`.
    pub fn config(&self, modes: Modes) -> Config {
        Config {
            modes,
            sources: vec![self.conf_dir()],
            ..Config::default()
        }
    }

    /// Run the engine over `conf/` and return its stats and captured log.
    pub fn run(&self, modes: Modes) -> (RunStats, BufferedLog) {
        let log = BufferedLog::new();
        let config = self.config(modes);
        let stats = Engine::new(&config, &log)
            .with_now(self.now)
            .run()
            .expect("run must not hit a fatal error");
        (stats, log)
    }
}

/// Fluent builder for [`IntegrationTestContext`].
pub struct TestContextBuilder {
    ctx: IntegrationTestContext,
}

impl TestContextBuilder {
    /// Begin building a new context.
    pub fn new() -> Self {
        Self {
            ctx: IntegrationTestContext::new(),
        }
    }

    /// Write `content` to `conf/<filename>`.  `@` in the content is
    /// replaced with the absolute path of `data/`.
    pub fn with_rules(self, filename: &str, content: &str) -> Self {
        let data = self.ctx.data("");
        let content = content.replace('@', &data.to_string_lossy());
        std::fs::write(self.ctx.conf_dir().join(filename), content).expect("write rule file");
        self
    }

    /// Create a directory (and parents) below `data/`.
    pub fn with_dir(self, rel: &str) -> Self {
        std::fs::create_dir_all(self.ctx.data(rel)).expect("create data dir");
        self
    }

    /// Create a file below `data/`.
    pub fn with_file(self, rel: &str, content: &str) -> Self {
        let path = self.ctx.data(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(&path, content).expect("write data file");
        self
    }

    /// Create a file whose access and modification times are `age` before
    /// the engine's reference time.
    ///
    /// The change time cannot be set and is always the real current time,
    /// so callers that need old entries move the reference time forward
    /// with [`with_now`](Self::with_now) first.
    pub fn with_aged_file(self, rel: &str, age: Duration) -> Self {
        let when = self.ctx.now.checked_sub(age).expect("time in range");
        let this = self.with_file(rel, "");
        let path = this.ctx.data(rel);
        set_times(&path, when);
        this
    }

    /// Move the engine's reference time.
    pub fn with_now(mut self, now: SystemTime) -> Self {
        self.ctx.now = now;
        self
    }

    /// Finish building and return the configured context.
    pub fn build(self) -> IntegrationTestContext {
        self.ctx
    }
}

/// Set access and modification time of `path`.
pub fn set_times(path: &Path, when: SystemTime) {
    let file = File::options()
        .write(true)
        .open(path)
        .expect("open for set_times");
    file.set_times(FileTimes::new().set_accessed(when).set_modified(when))
        .expect("set times");
}

/// Modes with only `create` enabled.
pub fn create() -> Modes {
    Modes {
        create: true,
        ..Modes::default()
    }
}

/// Modes with only `clean` enabled.
pub fn clean() -> Modes {
    Modes {
        clean: true,
        ..Modes::default()
    }
}

/// Modes with only `remove` enabled.
pub fn remove() -> Modes {
    Modes {
        remove: true,
        ..Modes::default()
    }
}

/// Permission bits of `path`.
#[cfg(unix)]
pub fn mode_of(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt as _;
    std::fs::metadata(path).expect("stat").permissions().mode() & 0o7777
}
