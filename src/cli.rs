use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use crate::config::{Config, Modes};

/// Version string: `git describe` output when available, else the crate
/// version.
pub const VERSION: &str = match option_env!("TMPFILES_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

/// Create, clean and remove files and directories described by rule files.
#[derive(Parser, Debug)]
#[command(
    name = "tmpfiles",
    about = "Create, clean and remove volatile and temporary files",
    version = VERSION
)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .multiple(true)
        .args(["create", "clean", "remove"])
))]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Configuration files, or directories whose *.conf files are read in name order
    #[arg(required = true, value_name = "CONFIG")]
    pub sources: Vec<PathBuf>,

    /// Create files and directories and write file content
    #[arg(long)]
    pub create: bool,

    /// Remove entries older than their rule's age
    #[arg(long)]
    pub clean: bool,

    /// Remove paths marked for removal
    #[arg(long)]
    pub remove: bool,

    /// Also apply rules marked with '!'
    #[arg(long)]
    pub boot: bool,

    /// Clean entries regardless of age
    #[arg(long, requires = "clean")]
    pub force: bool,

    /// Only apply rules whose path starts with PATH (repeatable)
    #[arg(long = "prefix", value_name = "PATH")]
    pub prefixes: Vec<PathBuf>,

    /// Ignore rules whose path starts with PATH (repeatable)
    #[arg(long = "exclude-prefix", value_name = "PATH")]
    pub exclude_prefixes: Vec<PathBuf>,

    /// Also append every message, including debug output, to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Execution modes selected on the command line.
    #[must_use]
    pub const fn modes(&self) -> Modes {
        Modes {
            create: self.create,
            clean: self.clean,
            remove: self.remove,
            boot: self.boot,
            force: self.force,
        }
    }

    /// Build the run configuration.
    #[must_use]
    pub fn config(&self) -> Config {
        Config {
            modes: self.modes(),
            sources: self.sources.clone(),
            prefixes: self.prefixes.clone(),
            exclude_prefixes: self.exclude_prefixes.clone(),
        }
    }
}
