//! Registry of paths and patterns protected from cleaning.
use std::path::Path;

use glob::Pattern;

use crate::error::FatalError;

/// Append-only set of exclusion patterns.
///
/// Matching follows `fnmatch` without `FNM_PATHNAME`: `*` may cross `/`,
/// so `/tmp/keep*` also protects everything below `/tmp/keep`.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use tmpfiles_cli::resources::exclusions::ExclusionRegistry;
///
/// let mut registry = ExclusionRegistry::new();
/// registry.register("/tmp/keep*").unwrap();
/// assert!(registry.is_excluded(Path::new("/tmp/keep/deep/file")));
/// assert!(!registry.is_excluded(Path::new("/tmp/other")));
/// ```
#[derive(Debug, Default)]
pub struct ExclusionRegistry {
    patterns: Vec<Pattern>,
}

impl ExclusionRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pattern.
    ///
    /// Text that is not a valid pattern is stored as a literal path.
    /// Registering a pattern that is already present is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`FatalError::ExclusionRegistry`] if the registry cannot
    /// grow.  The run must stop: later clean operations would otherwise
    /// delete paths the configuration asked to keep.
    pub fn register(&mut self, pattern: &str) -> Result<(), FatalError> {
        let compiled = Pattern::new(pattern)
            .or_else(|_| Pattern::new(&Pattern::escape(pattern)))
            .unwrap_or_default();
        if self.patterns.contains(&compiled) {
            return Ok(());
        }
        self.patterns
            .try_reserve(1)
            .map_err(|source| FatalError::ExclusionRegistry {
                pattern: pattern.to_string(),
                source,
            })?;
        self.patterns.push(compiled);
        Ok(())
    }

    /// Whether `path` matches any registered pattern.
    #[must_use]
    pub fn is_excluded(&self, path: &Path) -> bool {
        let text = path.to_string_lossy();
        self.patterns.iter().any(|p| p.matches(&text))
    }

    /// Number of distinct patterns registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
