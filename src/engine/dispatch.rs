//! Per-path handler dispatch.
//!
//! Every flag set on a rule maps to one handler.  Handlers run in ascending
//! flag order, so creation always precedes writing, ownership and
//! permissions, and cleaning.  A failing handler is logged and never stops
//! the handlers after it.
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Result;

use crate::config::Modes;
use crate::config::attributes::Flag;
use crate::config::rules::OperationRecord;
use crate::error::FatalError;
use crate::logging::Log;
use crate::resources::attrs::{AttributeChange, AttributeResource};
use crate::resources::chmod::{PermissionResource, parse_mode};
use crate::resources::clean::{self, CleanResource};
use crate::resources::create::{CreateDirResource, CreateFileResource};
use crate::resources::error::ResourceError;
use crate::resources::exclusions::ExclusionRegistry;
use crate::resources::owner::{OwnerResource, resolve_group, resolve_user};
use crate::resources::remove::RemoveResource;
use crate::resources::walk::with_descendants;
use crate::resources::write::WriteResource;
use crate::resources::{Applicable, Resource, ResourceChange};

/// What one handler did to one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Something on disk changed.
    Changed,
    /// The path already matched.
    Unchanged,
    /// The handler did not act.
    Skipped(String),
    /// The handler failed; the message was logged as a warning.
    Failed(String),
}

/// Handlers executed for one path, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// The dispatched path.
    pub path: PathBuf,
    /// One entry per executed handler.
    pub handlers: Vec<(Flag, Outcome)>,
}

impl DispatchReport {
    /// Flags whose handlers ran, in order.
    #[must_use]
    pub fn flags(&self) -> Vec<Flag> {
        self.handlers.iter().map(|(flag, _)| *flag).collect()
    }

    /// Outcome of the handler for `flag`, if it ran.
    #[must_use]
    pub fn outcome(&self, flag: Flag) -> Option<&Outcome> {
        self.handlers
            .iter()
            .find(|(f, _)| *f == flag)
            .map(|(_, outcome)| outcome)
    }
}

/// Runs the handlers of one rule against one path.
pub struct Dispatcher<'a> {
    modes: Modes,
    now: SystemTime,
    log: &'a dyn Log,
}

impl std::fmt::Debug for Dispatcher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("modes", &self.modes)
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}

impl<'a> Dispatcher<'a> {
    /// Create a dispatcher.  `now` is the reference time for clean
    /// deadlines.
    #[must_use]
    pub const fn new(modes: Modes, now: SystemTime, log: &'a dyn Log) -> Self {
        Self { modes, now, log }
    }

    /// Apply every handler enabled in `record` to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FatalError`] only when the exclusion registry cannot grow.
    /// Handler failures are logged and recorded in the report.
    pub fn dispatch(
        &self,
        exclusions: &mut ExclusionRegistry,
        path: &Path,
        record: &OperationRecord,
    ) -> Result<DispatchReport, FatalError> {
        let mut report = DispatchReport {
            path: path.to_path_buf(),
            handlers: Vec::new(),
        };

        for flag in Flag::ALL {
            if !record.flags.contains(flag) || !flag.has_handler() {
                continue;
            }
            let outcome = match flag {
                Flag::Create => gated(self.modes.create, "create", || {
                    self.reconcile(flag, &CreateFileResource::new(path))
                }),
                Flag::CreateDir => gated(self.modes.create, "create", || {
                    self.reconcile(flag, &CreateDirResource::new(path))
                }),
                Flag::Write => gated(self.modes.create, "create", || {
                    let append = record.flags.contains(Flag::Append);
                    self.apply(flag, &WriteResource::new(path, &record.argument, append))
                }),
                Flag::Ownership => self.set_owner(path, record),
                Flag::Permission => self.set_permissions(path, record),
                Flag::Clean => {
                    let registry = &*exclusions;
                    gated(self.modes.clean, "clean", || {
                        let deadline = clean::deadline(record.age.as_deref(), self.now, self.log);
                        let action =
                            CleanResource::new(path, deadline, self.modes.force, registry, self.log);
                        self.apply(flag, &action)
                    })
                }
                Flag::Remove => gated(self.modes.remove, "remove", || {
                    let keep_root = record.flags.contains(Flag::CreateDir);
                    self.apply(flag, &RemoveResource::new(path, keep_root, self.log))
                }),
                Flag::Attributes => self.set_attributes(path, record),
                Flag::Exclude => {
                    exclusions.register(&path.to_string_lossy())?;
                    self.log.debug(&format!("exclude: {}", path.display()));
                    Outcome::Changed
                }
                Flag::Append | Flag::NoFollow | Flag::Recursive | Flag::OnBoot | Flag::Glob => {
                    continue;
                }
            };
            report.handlers.push((flag, outcome));
        }
        Ok(report)
    }

    fn reconcile(&self, flag: Flag, resource: &impl Resource) -> Outcome {
        self.settle(flag, &resource.description(), resource.reconcile())
    }

    fn apply(&self, flag: Flag, resource: &impl Applicable) -> Outcome {
        self.settle(flag, &resource.description(), resource.apply())
    }

    fn settle(&self, flag: Flag, desc: &str, result: Result<ResourceChange>) -> Outcome {
        match result {
            Ok(ResourceChange::Applied) => {
                self.log.debug(&format!("{flag}: {desc}"));
                Outcome::Changed
            }
            Ok(ResourceChange::AlreadyCorrect) => Outcome::Unchanged,
            Ok(ResourceChange::Skipped { reason }) => {
                self.log.debug(&format!("skipping {desc}: {reason}"));
                Outcome::Skipped(reason)
            }
            Err(e) => {
                let msg = format!("{e:#}");
                self.log.warn(&format!("failed to {flag} {desc}: {msg}"));
                Outcome::Failed(msg)
            }
        }
    }

    fn set_owner(&self, path: &Path, record: &OperationRecord) -> Outcome {
        let uid = self.resolve_id(path, record.user.as_deref(), resolve_user);
        let gid = self.resolve_id(path, record.group.as_deref(), resolve_group);
        if uid.is_none() && gid.is_none() {
            return Outcome::Skipped("no owner or group to set".to_string());
        }

        let no_follow = record.flags.contains(Flag::NoFollow);
        let recursive = record.flags.contains(Flag::Recursive);
        combine(
            with_descendants(path, recursive, self.log)
                .iter()
                .map(|p| self.reconcile(Flag::Ownership, &OwnerResource::new(p, uid, gid, no_follow))),
        )
    }

    /// Resolve one half of the ownership; failures are warned and leave
    /// that half unchanged.
    fn resolve_id(
        &self,
        path: &Path,
        name: Option<&str>,
        resolver: fn(&str) -> Result<u32, ResourceError>,
    ) -> Option<u32> {
        match resolver(name?) {
            Ok(id) => Some(id),
            Err(e) => {
                self.log
                    .warn(&format!("{e}; leaving it unchanged on {}", path.display()));
                None
            }
        }
    }

    fn set_permissions(&self, path: &Path, record: &OperationRecord) -> Outcome {
        let Some(text) = record.mode.as_deref() else {
            return Outcome::Skipped("no mode to set".to_string());
        };
        let mode = match parse_mode(text) {
            Ok(mode) => mode,
            Err(e) => return self.settle(Flag::Permission, &path.display().to_string(), Err(e.into())),
        };

        let no_follow = record.flags.contains(Flag::NoFollow);
        let recursive = record.flags.contains(Flag::Recursive);
        combine(
            with_descendants(path, recursive, self.log)
                .iter()
                .map(|p| self.reconcile(Flag::Permission, &PermissionResource::new(p, mode, no_follow))),
        )
    }

    fn set_attributes(&self, path: &Path, record: &OperationRecord) -> Outcome {
        match AttributeChange::parse(&record.argument, self.log) {
            Ok(change) => self.apply(Flag::Attributes, &AttributeResource::new(path, change)),
            Err(e) => self.settle(Flag::Attributes, &path.display().to_string(), Err(e.into())),
        }
    }
}

/// Run a mode-gated handler, or report it skipped when the mode is off.
fn gated(enabled: bool, mode: &str, run: impl FnOnce() -> Outcome) -> Outcome {
    if enabled {
        run()
    } else {
        Outcome::Skipped(format!("{mode} mode disabled"))
    }
}

/// Fold the outcomes of one handler over several paths.
///
/// Any failure makes the whole handler failed; otherwise any change makes
/// it changed.  It is skipped only when every path was skipped.
fn combine(outcomes: impl Iterator<Item = Outcome>) -> Outcome {
    let mut failures = Vec::new();
    let mut changed = false;
    let mut unchanged = false;
    let mut skip_reason = None;
    for outcome in outcomes {
        match outcome {
            Outcome::Changed => changed = true,
            Outcome::Unchanged => unchanged = true,
            Outcome::Skipped(reason) => {
                skip_reason.get_or_insert(reason);
            }
            Outcome::Failed(msg) => failures.push(msg),
        }
    }
    if !failures.is_empty() {
        Outcome::Failed(failures.join("; "))
    } else if changed {
        Outcome::Changed
    } else if unchanged {
        Outcome::Unchanged
    } else {
        Outcome::Skipped(skip_reason.unwrap_or_default())
    }
}
