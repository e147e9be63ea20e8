//! Entry point of the codec optimizer daemon and its diagnostics

mod commands;

use clap::Parser;
use commands::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli.execute().await {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}
