//! Glimpse CLI - drop in an image, get ranked labels from a local
//! classification model.
//!
//! # Usage
//!
//! ```bash
//! # Classify a single image
//! glimpse classify dog.jpg
//!
//! # Treat the file as a drag-and-drop payload, print JSON
//! glimpse classify dog.jpg --drop --format json
//!
//! # Interactive session
//! glimpse session
//!
//! # Manage models
//! glimpse models download
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Glimpse - single-image classification with a local model.
#[derive(Parser, Debug)]
#[command(name = "glimpse")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify one image and print the ranked labels
    Classify(cli::classify::ClassifyArgs),

    /// Start an interactive session (open, drop, reset, retry)
    Session,

    /// Manage the classification model (download, list, etc.)
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match glimpse_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `glimpse config path`."
            );
            glimpse_core::Config::default()
        }
    };
    let interactive = matches!(cli.command, Commands::Session);
    logging::init_from_config(&config, cli.verbose, cli.json_logs, interactive);

    tracing::debug!("Glimpse v{}", glimpse_core::VERSION);

    match cli.command {
        Commands::Classify(args) => cli::classify::execute(args, config).await,
        Commands::Session => cli::session::run(config).await,
        Commands::Models(args) => cli::models::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
