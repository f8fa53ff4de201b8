//! Rule-driven management of volatile and temporary files.
//!
//! Configuration files hold one rule per line, naming a path, a type and
//! optional mode, owner, age and argument.  Each rule expands into a set of
//! handler flags that create, write, chown, chmod, clean, remove, change
//! inode attributes of, or protect that path.
//!
//! The public API is organised into four layers:
//!
//! - **[`config`]** parse rule lines, type characters and ages
//! - **[`resources`]** idempotent filesystem primitives used by the handlers
//! - **[`engine`]** load sources, register exclusions, dispatch handlers
//! - **[`commands`]** top-level command orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod resources;
