use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::cmd::{self, check::CheckArgs, format::FormatArgs, validate_step::ValidateStepArgs};

#[derive(Parser, Debug)]
#[command(
    name = "onboarding",
    about = "Checks values and saved steps of the customer onboarding form",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a single value against a named rule
    Check(CheckArgs),
    /// Print a value in its display format
    Format(FormatArgs),
    /// Validate a saved step view against the onboarding catalog
    ValidateStep(ValidateStepArgs),
}

/// Exit code 1 means the checked value or step was rejected.
pub fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let valid = match cli.command {
        Commands::Check(args) => cmd::check::run(&args, cli.json)?,
        Commands::Format(args) => {
            cmd::format::run(&args, cli.json)?;
            true
        }
        Commands::ValidateStep(args) => cmd::validate_step::run(&args, cli.json)?,
    };
    Ok(if valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn json_flag_is_global() {
        let cli = Cli::try_parse_from(["onboarding", "check", "iban", "ES00", "--json"])
            .expect("parse");
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Check(_)));
    }
}
