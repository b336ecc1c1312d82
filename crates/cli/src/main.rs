//! RallyCoach CLI: the main entry point.
//!
//! Commands:
//! - `onboard`: write the default config
//! - `chat`:    interactive or single-message coaching
//! - `serve`:   start the HTTP gateway
//! - `ingest`:  chunk, embed and index a reference document
//! - `doctor`:  diagnose config and index health

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "rallycoach",
    about = "RallyCoach: a retrieval-augmented tennis mental-game coach",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of ~/.rallycoach/config.toml
    #[arg(short, long, global = true, env = "RALLYCOACH_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    Onboard,

    /// Chat with the coach
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ingest a PDF or UTF-8 text document into the passage index
    Ingest {
        /// Document to ingest (.pdf or plain text)
        file: PathBuf,
    },

    /// Diagnose configuration and index health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Onboard => commands::onboard::run(config).await?,
        Commands::Chat { message } => commands::chat::run(config, message).await?,
        Commands::Serve { port } => commands::serve::run(config, port).await?,
        Commands::Ingest { file } => commands::ingest::run(config, file).await?,
        Commands::Doctor => commands::doctor::run(config).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_options_after_subcommand() {
        let cli = Cli::parse_from(["rallycoach", "chat", "-m", "hi", "--verbose", "--config", "x.toml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(cli.command, Commands::Chat { message: Some(ref m) } if m == "hi"));
    }

    #[test]
    fn parses_ingest_file() {
        let cli = Cli::parse_from(["rallycoach", "ingest", "inner_game.txt"]);
        assert!(matches!(cli.command, Commands::Ingest { ref file } if file == &PathBuf::from("inner_game.txt")));
    }
}
