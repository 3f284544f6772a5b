use super::commands::{Cli, Command};
use super::handlers;
use clap::Parser;
use std::process::ExitCode;

/// Process the command line.
pub fn process_command() -> ExitCode {
    // NOTE: this exits the process if there is a parsing error
    let cli = Cli::parse();

    match cli.command {
        Command::Collect(args) => handlers::collect(cli.config.as_deref(), &args),
        Command::Recipe { command } => handlers::recipe(command),
    }
}
