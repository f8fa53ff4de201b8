//! Filesystem primitives applied by the dispatcher.
//!
//! Stateful resources (directories, files, permissions, ownership) follow a
//! check-then-apply pattern through [`Resource`]; one-shot actions
//! (writing, cleaning, removal, attribute changes) only implement
//! [`Applicable`].
pub mod attrs;
pub mod chmod;
pub mod clean;
pub mod create;
pub mod error;
pub mod exclusions;
pub mod glob;
pub mod owner;
pub mod probe;
pub mod remove;
pub mod walk;
pub mod write;

use anyhow::Result;

/// Minimal interface for actions that can be described and applied.
pub trait Applicable {
    /// Human-readable description of this resource.
    fn description(&self) -> String;

    /// Apply the change.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying filesystem call fails.  The
    /// dispatcher logs it as a warning and continues with the next handler.
    fn apply(&self) -> Result<ResourceChange>;
}

/// State of a resource on disk.
///
/// # Examples
///
/// ```
/// use tmpfiles_cli::resources::ResourceState;
///
/// let missing = ResourceState::Missing;
/// let wrong = ResourceState::Incorrect { current: "644".into() };
/// assert_ne!(missing, ResourceState::Correct);
/// assert_ne!(wrong, ResourceState::Correct);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// The path does not exist.
    Missing,
    /// The path exists and matches the desired state.
    Correct,
    /// The path exists but differs from the desired state.
    Incorrect {
        /// The current value, for messages.
        current: String,
    },
    /// The resource cannot be applied (e.g. a file where a directory is wanted).
    Invalid {
        /// Reason why the resource cannot be applied.
        reason: String,
    },
}

/// Result of applying a resource change.
///
/// # Examples
///
/// ```
/// use tmpfiles_cli::resources::ResourceChange;
///
/// let applied = ResourceChange::Applied;
/// let skipped = ResourceChange::Skipped { reason: "create mode disabled".into() };
/// assert_ne!(applied, skipped);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// Something on disk was created, changed or removed.
    Applied,
    /// The path already matched; nothing was done.
    AlreadyCorrect,
    /// The handler did not act.
    Skipped {
        /// Why the handler did not act.
        reason: String,
    },
}

impl ResourceChange {
    /// Shorthand for [`ResourceChange::Skipped`].
    #[must_use]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }
}

/// Resources that can inspect their own state before applying.
pub trait Resource: Applicable {
    /// Check the current state of the resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be determined.
    fn current_state(&self) -> Result<ResourceState>;

    /// Check the state and apply only when needed.
    ///
    /// `Invalid` states are reported as [`ResourceChange::Skipped`].
    ///
    /// # Errors
    ///
    /// Propagates errors from [`current_state`](Self::current_state) and
    /// [`apply`](Applicable::apply).
    fn reconcile(&self) -> Result<ResourceChange> {
        match self.current_state()? {
            ResourceState::Correct => Ok(ResourceChange::AlreadyCorrect),
            ResourceState::Invalid { reason } => Ok(ResourceChange::Skipped { reason }),
            ResourceState::Missing | ResourceState::Incorrect { .. } => self.apply(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct TestResource {
        state: ResourceState,
        applied: Cell<bool>,
    }

    impl TestResource {
        fn new(state: ResourceState) -> Self {
            Self {
                state,
                applied: Cell::new(false),
            }
        }
    }

    impl Applicable for TestResource {
        fn description(&self) -> String {
            "test resource".to_string()
        }

        fn apply(&self) -> Result<ResourceChange> {
            self.applied.set(true);
            Ok(ResourceChange::Applied)
        }
    }

    impl Resource for TestResource {
        fn current_state(&self) -> Result<ResourceState> {
            Ok(self.state.clone())
        }
    }

    #[test]
    fn reconcile_applies_missing_resource() {
        let r = TestResource::new(ResourceState::Missing);
        assert_eq!(r.reconcile().unwrap(), ResourceChange::Applied);
        assert!(r.applied.get());
    }

    #[test]
    fn reconcile_applies_incorrect_resource() {
        let r = TestResource::new(ResourceState::Incorrect {
            current: "600".to_string(),
        });
        assert_eq!(r.reconcile().unwrap(), ResourceChange::Applied);
    }

    #[test]
    fn reconcile_leaves_correct_resource() {
        let r = TestResource::new(ResourceState::Correct);
        assert_eq!(r.reconcile().unwrap(), ResourceChange::AlreadyCorrect);
        assert!(!r.applied.get());
    }

    #[test]
    fn reconcile_skips_invalid_resource() {
        let r = TestResource::new(ResourceState::Invalid {
            reason: "not a directory".to_string(),
        });
        assert_eq!(
            r.reconcile().unwrap(),
            ResourceChange::skipped("not a directory")
        );
        assert!(!r.applied.get());
    }
}
