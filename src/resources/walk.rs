//! Post-order directory traversal.
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::logging::Log;

/// Configurable post-order walk below a root directory.
///
/// Children are always visited before their parent and the root itself is
/// never visited.  Symlinks are reported as entries and never followed.
/// A hidden directory is skipped together with everything below it.
///
/// # Examples
///
/// ```
/// use tmpfiles_cli::logging::BufferedLog;
/// use tmpfiles_cli::resources::walk::Walk;
///
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::create_dir(dir.path().join("sub")).unwrap();
/// std::fs::write(dir.path().join("sub/a"), "").unwrap();
///
/// let mut seen = Vec::new();
/// Walk::new(dir.path()).recursive(true).run(&BufferedLog::new(), |e| {
///     seen.push(e.path().strip_prefix(dir.path()).unwrap().to_path_buf());
/// });
/// assert_eq!(seen, vec![std::path::Path::new("sub/a"), std::path::Path::new("sub")]);
/// ```
#[derive(Debug, Clone)]
pub struct Walk {
    root: PathBuf,
    recursive: bool,
    include_hidden: bool,
}

impl Walk {
    /// Walk the immediate children of `root`, skipping hidden entries.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            recursive: false,
            include_hidden: false,
        }
    }

    /// Descend into subdirectories instead of visiting them as leaves.
    #[must_use]
    pub const fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Also visit entries whose name starts with `.`.
    #[must_use]
    pub const fn include_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    /// Run the walk, calling `visit` for every entry.
    ///
    /// Read errors (including an unreadable root) are logged as warnings
    /// and the walk carries on with whatever is still reachable.
    pub fn run(&self, log: &dyn Log, visit: impl FnMut(&DirEntry)) {
        self.run_pruned(log, |_| false, visit);
    }

    /// Like [`run`](Self::run), but entries for which `prune` returns
    /// `true` are neither visited nor descended into.
    ///
    /// The tree is listed top-down first so that hidden and pruned
    /// directories are cut off before their contents are read, then the
    /// listing is replayed backwards, which puts every directory after
    /// its contents.
    pub fn run_pruned(
        &self,
        log: &dyn Log,
        mut prune: impl FnMut(&DirEntry) -> bool,
        mut visit: impl FnMut(&DirEntry),
    ) {
        let mut walker = WalkDir::new(&self.root).min_depth(1).follow_links(false);
        if !self.recursive {
            walker = walker.max_depth(1);
        }

        let include_hidden = self.include_hidden;
        let listing = walker
            .into_iter()
            .filter_entry(|e| (include_hidden || !is_hidden(e)) && !prune(e));

        let mut entries = Vec::new();
        for entry in listing {
            match entry {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.display().to_string(), |p| p.display().to_string());
                    log.warn(&format!("cannot read {path}: {e}"));
                }
            }
        }

        for entry in entries.iter().rev() {
            visit(entry);
        }
    }
}

/// `root` itself followed, when `recursive` and `root` is a directory, by
/// every entry below it (hidden ones included) in post-order.
pub fn with_descendants(root: &Path, recursive: bool, log: &dyn Log) -> Vec<PathBuf> {
    let mut paths = vec![root.to_path_buf()];
    if recursive && super::probe::is_dir(root) {
        Walk::new(root)
            .recursive(true)
            .include_hidden(true)
            .run(log, |e| paths.push(e.path().to_path_buf()));
    }
    paths
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}
