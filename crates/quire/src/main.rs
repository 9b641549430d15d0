//! Quire CLI - static site generator.
//!
//! Provides commands for:
//! - `build`: Compose, compile and publish a site

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::BuildArgs;
use output::Output;

/// Quire - static site generator.
#[derive(Parser)]
#[command(name = "quire", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the site into the output directory.
    Build(BuildArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = matches!(&cli.command, Commands::Build(args) if args.verbose);

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Build(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
