//! Datasynth CLI: the main entry point.
//!
//! Commands:
//! - `chat`: Interactive discovery chat or single-message mode
//! - `serve`: Start the HTTP gateway
//! - `scrape`: Fetch a page and print its extracted text
//! - `config`: Show the effective config or write a default file

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "datasynth",
    about = "Datasynth — turn a conversation into a business profile",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat about your business
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Walk through the guided business questionnaire
        #[arg(short, long)]
        guided: bool,
    },

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Fetch a URL and print the extracted page as JSON
    Scrape {
        /// Page to fetch
        url: String,
    },

    /// Show configuration
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Chat { message, guided } => commands::chat::run(message, guided).await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Scrape { url } => commands::scrape::run(&url).await?,
        Commands::Config { init } => {
            if init {
                commands::config_cmd::init().await?
            } else {
                commands::config_cmd::show().await?
            }
        }
    }

    Ok(())
}
