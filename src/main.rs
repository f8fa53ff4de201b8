use anyhow::Result;
use clap::Parser;

use tmpfiles_cli::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();
    logging::init_subscriber(args.verbose, args.log_file.as_deref());
    let log = logging::Logger::new(args.log_file.clone());

    commands::apply::run(&args.config(), &log)
}
