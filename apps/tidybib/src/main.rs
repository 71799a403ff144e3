//! tidybib - normalized BibTeX from DOIs and entry records

mod cli;
mod commands;
mod settings;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use settings::Settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Settings errors surface before any entry is touched
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Command::Doi2Bibtex(args) => commands::doi2bibtex(&settings, args).await?,
        Command::Format(args) => commands::format(&settings, args)?,
    }

    Ok(())
}

/// Log to stderr so stdout carries only BibTeX
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
