//! `recu`: receipt field extraction from the command line.

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ConfigArgs, ExtractArgs};

/// Extract store, date, amounts and other fields from receipt text
#[derive(Parser)]
#[command(name = "recu")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a recu.toml config file
    #[arg(short, long, global = true, env = "RECU_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract fields from recognized receipt text and print them as JSON
    Extract(ExtractArgs),

    /// Print the effective configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays pure JSON.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("recu=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let file = match &cli.config {
        Some(path) => config::CliConfig::load(path)?,
        None => config::CliConfig::default(),
    };

    match cli.command {
        Commands::Extract(args) => commands::extract(args, file).await,
        Commands::Config(args) => commands::show_config(args, file),
    }
}
