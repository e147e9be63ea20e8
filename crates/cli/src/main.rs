//! Entry point of `pjsip-manager`

use anyhow::{bail, Result};
use clap::Parser;
use colored::Colorize;
use infra_common::{setup_logging, LoggingConfig};
use pjsip_config::ShowReport;
use pjsip_manager::{execute, Cli, Outcome};

fn run(cli: Cli) -> Result<()> {
    let settings = cli.settings()?;
    setup_logging(&LoggingConfig::from_settings(&settings.logging, "pjsip-manager")?)?;

    match execute(&cli.command, &settings.asterisk.conf_dir)? {
        Outcome::Added(extension) => {
            println!("{} User {} added", "✅".green(), extension.bold());
        }
        Outcome::Updated(extension) => {
            println!("{} User {} updated", "✅".green(), extension.bold());
        }
        Outcome::Deleted(extension) => {
            println!("{} User {} deleted", "🗑".yellow(), extension.bold());
        }
        Outcome::Shown(ShowReport::NotFound(extension)) => {
            bail!("Extension {} not found", extension);
        }
        Outcome::Shown(report) => print!("{}", report),
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "❌ Error:".red().bold(), e);
        std::process::exit(1);
    }
}
