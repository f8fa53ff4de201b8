//! Expansion of glob-flagged rule paths.
use std::path::PathBuf;

use crate::logging::Log;

/// Expand `pattern` into the paths that currently match, in glob order.
///
/// An invalid pattern or an unreadable match is logged as a warning.  A
/// pattern that matches nothing yields an empty list.
///
/// # Examples
///
/// ```
/// use tmpfiles_cli::logging::BufferedLog;
/// use tmpfiles_cli::resources::glob::expand;
///
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::write(dir.path().join("a.pid"), "").unwrap();
/// std::fs::write(dir.path().join("b.pid"), "").unwrap();
///
/// let pattern = format!("{}/*.pid", dir.path().display());
/// assert_eq!(expand(&pattern, &BufferedLog::new()).len(), 2);
/// ```
pub fn expand(pattern: &str, log: &dyn Log) -> Vec<PathBuf> {
    let paths = match ::glob::glob(pattern) {
        Ok(paths) => paths,
        Err(e) => {
            log.warn(&format!("invalid pattern '{pattern}': {e}"));
            return Vec::new();
        }
    };

    let mut matches = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => matches.push(path),
            Err(e) => log.warn(&format!("cannot expand '{pattern}': {e}")),
        }
    }
    if matches.is_empty() {
        log.debug(&format!("pattern '{pattern}' matched nothing"));
    }
    matches
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::BufferedLog;

    #[test]
    fn matches_are_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c.log", "a.log", "b.log", "keep.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        let pattern = format!("{}/*.log", dir.path().display());
        let found = expand(&pattern, &BufferedLog::new());
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.log", "b.log", "c.log"]);
    }

    #[test]
    fn literal_path_expands_to_itself_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        std::fs::write(&file, "").unwrap();
        let found = expand(&file.to_string_lossy(), &BufferedLog::new());
        assert_eq!(found, vec![file]);
    }

    #[test]
    fn no_match_is_empty_without_warning() {
        let dir = tempfile::tempdir().unwrap();
        let log = BufferedLog::new();
        let found = expand(&format!("{}/*.none", dir.path().display()), &log);
        assert!(found.is_empty());
        assert!(log.warnings().is_empty());
    }

    #[test]
    fn invalid_pattern_warns() {
        let log = BufferedLog::new();
        assert!(expand("/tmp/[", &log).is_empty());
        assert!(log.has_warning("invalid pattern"));
    }
}
