//! Cairn CLI entry point.

use std::process::ExitCode;

use cairn::cli::{Cli, CommandDispatcher};
use cairn::logging::init_tracing;
use cairn::ui::{OutputMode, Reporter};
use clap::Parser;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Handle --no-color before anything renders.
    if cli.no_color {
        std::env::set_var("NO_COLOR", "1");
    }

    init_tracing(cli.debug, cli.log_file.as_deref());
    tracing::debug!("Cairn starting with args: {:?}", cli);

    let output_mode = if cli.quiet {
        OutputMode::Quiet
    } else if cli.verbose {
        OutputMode::Verbose
    } else {
        OutputMode::Normal
    };

    let mut reporter = Reporter::new(output_mode);

    match CommandDispatcher::dispatch(&cli, &mut reporter) {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            reporter.error(&format!("Error: {}", e));
            ExitCode::from(1)
        }
    }
}
