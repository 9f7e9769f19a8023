pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "courtside",
    about = "Courtside operator CLI",
    long_about = "Inspect configuration, check runtime readiness, and browse the ball catalog.",
    after_help = "Examples:\n  courtside doctor --json\n  courtside config\n  courtside catalog --tier novice"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, oracle settings, and catalog image presence")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Print catalog item cards")]
    Catalog {
        #[arg(long, help = "Only show one tier (novice|intermediate|professional)")]
        tier: Option<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::CommandResult::text(commands::config::run()),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Catalog { tier } => commands::catalog::run(tier.as_deref()),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn parses_doctor_and_catalog_flags() {
        let cli = Cli::try_parse_from(["courtside", "doctor", "--json"]).expect("doctor parses");
        assert!(matches!(cli.command, Command::Doctor { json: true }));

        let cli = Cli::try_parse_from(["courtside", "catalog", "--tier", "novice"])
            .expect("catalog parses");
        assert!(matches!(cli.command, Command::Catalog { tier: Some(ref tier) } if tier == "novice"));
    }

    #[test]
    fn rejects_unknown_subcommands() {
        assert!(Cli::try_parse_from(["courtside", "migrate"]).is_err());
    }
}
