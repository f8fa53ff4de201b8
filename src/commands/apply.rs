//! Command: apply every rule in the given configuration sources.
use anyhow::{Context as _, Result};

use crate::cli::VERSION;
use crate::config::Config;
use crate::engine::Engine;
use crate::logging::Logger;

/// Run the engine and print the summary.
///
/// Warnings never fail the command; only a fatal engine error does.
///
/// # Errors
///
/// Returns an error if the run was aborted by a fatal condition.
pub fn run(config: &Config, log: &Logger) -> Result<()> {
    log.info(&format!("tmpfiles {VERSION}"));
    log.debug(&format!(
        "modes: create={} clean={} remove={} boot={} force={}",
        config.modes.create,
        config.modes.clean,
        config.modes.remove,
        config.modes.boot,
        config.modes.force
    ));

    let result = Engine::new(config, log).run();
    match result {
        Ok(stats) => {
            log.print_summary(&stats.summary());
            Ok(())
        }
        Err(e) => {
            log.error(&e.to_string());
            Err(e).context("run aborted")
        }
    }
}
