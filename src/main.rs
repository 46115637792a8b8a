use clap::Parser;
use smartfiler::cli::{Cli, Command, run_cli};
use smartfiler::logging::init_tracing;
use smartfiler::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // The editor owns the terminal; log lines would corrupt the screen.
    if cli.command != Command::Edit {
        init_tracing(cli.verbose);
    }

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            ExitCode::FAILURE
        }
    }
}
