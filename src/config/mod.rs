//! Run configuration and rule-file loading.
pub mod age;
pub mod attributes;
pub mod rules;

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::logging::Log;
use rules::{ParsedLine, Rule};

/// Execution modes chosen on the command line.
///
/// Each mode gates a family of handlers; permission, ownership, attribute
/// and exclusion handlers run regardless.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Modes {
    /// Create files and directories, write file content.
    pub create: bool,
    /// Remove entries older than their rule's age.
    pub clean: bool,
    /// Run the remove handler.
    pub remove: bool,
    /// Apply rules marked with `!`.
    pub boot: bool,
    /// Clean every entry regardless of age.
    pub force: bool,
}

/// Everything the engine needs to know about one run.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Execution modes.
    pub modes: Modes,
    /// Configuration sources, in the order given.
    pub sources: Vec<PathBuf>,
    /// Only rules whose path starts with one of these are applied.
    pub prefixes: Vec<PathBuf>,
    /// Rules whose path starts with one of these are ignored.
    pub exclude_prefixes: Vec<PathBuf>,
}

impl Config {
    /// Whether a rule path passes the `--prefix`/`--exclude-prefix` filters.
    ///
    /// Matching is by path component, so `/tmp` covers `/tmp/a` but not
    /// `/tmpfoo`.
    #[must_use]
    pub fn accepts(&self, path: &str) -> bool {
        let path = Path::new(path);
        if self.exclude_prefixes.iter().any(|p| path.starts_with(p)) {
            return false;
        }
        self.prefixes.is_empty() || self.prefixes.iter().any(|p| path.starts_with(p))
    }
}

/// Resolve configuration sources into the list of files to read.
///
/// Files are kept as given.  A directory contributes its `*.conf` entries
/// in name order.  Unreadable sources are warned about and dropped.
pub fn expand_sources(sources: &[PathBuf], log: &dyn Log) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for source in sources {
        if !source.is_dir() {
            files.push(source.clone());
            continue;
        }
        match conf_files_in(source) {
            Ok(mut entries) => {
                entries.sort();
                files.extend(entries);
            }
            Err(e) => log.warn(&e.to_string()),
        }
    }
    files
}

fn conf_files_in(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: dir.display().to_string(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.extension().is_some_and(|e| e == "conf") && path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

/// Read and parse one configuration file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read.  Problems with
/// individual lines are logged as warnings and do not fail the load.
pub fn load_rules(path: &Path, boot: bool, log: &dyn Log) -> Result<Vec<Rule>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse_rules(&content, &path.display().to_string(), boot, log))
}

/// Parse every line of `content`, tagging rules with `name:line`.
///
/// # Examples
///
/// ```
/// use tmpfiles_cli::config::parse_rules;
/// use tmpfiles_cli::logging::BufferedLog;
///
/// let log = BufferedLog::new();
/// let rules = parse_rules("# runtime dirs\nd /run/a\n\nx /run/a/keep\n", "a.conf", false, &log);
/// assert_eq!(rules.len(), 2);
/// assert_eq!(rules[1].origin, "a.conf:4");
/// ```
pub fn parse_rules(content: &str, name: &str, boot: bool, log: &dyn Log) -> Vec<Rule> {
    content
        .lines()
        .enumerate()
        .filter_map(|(i, line)| match rules::parse_line(line, boot, log) {
            ParsedLine::Rule(rule) => Some(rule.with_origin(format!("{name}:{}", i + 1))),
            ParsedLine::Skip => None,
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::BufferedLog;

    #[test]
    fn accepts_everything_without_filters() {
        let config = Config::default();
        assert!(config.accepts("/tmp/x"));
        assert!(config.accepts("/run/y"));
    }

    #[test]
    fn prefix_limits_paths_by_component() {
        let config = Config {
            prefixes: vec![PathBuf::from("/tmp")],
            ..Config::default()
        };
        assert!(config.accepts("/tmp/x"));
        assert!(config.accepts("/tmp"));
        assert!(!config.accepts("/tmpfoo"));
        assert!(!config.accepts("/run/x"));
    }

    #[test]
    fn exclude_prefix_wins_over_prefix() {
        let config = Config {
            prefixes: vec![PathBuf::from("/tmp")],
            exclude_prefixes: vec![PathBuf::from("/tmp/keep")],
            ..Config::default()
        };
        assert!(config.accepts("/tmp/x"));
        assert!(!config.accepts("/tmp/keep/x"));
    }

    #[test]
    fn expand_sources_reads_conf_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.conf"), "").unwrap();
        std::fs::write(dir.path().join("a.conf"), "").unwrap();
        std::fs::write(dir.path().join("README"), "").unwrap();
        let single = dir.path().join("single.rules");
        std::fs::write(&single, "").unwrap();

        let log = BufferedLog::new();
        let files = expand_sources(&[dir.path().to_path_buf(), single.clone()], &log);
        assert_eq!(
            files,
            vec![dir.path().join("a.conf"), dir.path().join("b.conf"), single]
        );
    }

    #[test]
    fn load_rules_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let log = BufferedLog::new();
        let err = load_rules(&dir.path().join("nope.conf"), false, &log).unwrap_err();
        assert!(err.to_string().contains("nope.conf"));
    }

    #[test]
    fn load_rules_tags_origin() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("run.conf");
        std::fs::write(&file, "d /run/a 0755\nbogus\nf /run/a/b\n").unwrap();
        let log = BufferedLog::new();
        let rules = load_rules(&file, false, &log).unwrap();
        assert_eq!(rules.len(), 2);
        assert!(rules[0].origin.ends_with("run.conf:1"));
        assert!(rules[1].origin.ends_with("run.conf:3"));
        assert!(log.has_warning("missing path"));
    }
}
