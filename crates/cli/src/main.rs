//! Chat Hub CLI: the main entry point.
//!
//! Commands:
//! - `chat`    Interactive session (the default)
//! - `ask`     Send one message and print the reply
//! - `config`  Show, locate, create or validate the config file
//! - `models`  List the model tiers and what they resolve to

use chathub_core::model::ModelTier;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "chathub",
    about = "Chat Hub: chat, generate images, summarize pages and talk to your documents",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Model tier for this session (Lite, Fast, Smart, Turbo)
    #[arg(short, long, global = true)]
    model: Option<ModelTier>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Attach a .txt, .pdf or .csv file before the first message
        #[arg(short, long)]
        upload: Option<std::path::PathBuf>,
    },

    /// Send a single message and print the reply
    Ask {
        /// The message, including `/image` or `/read` commands
        message: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// List model tiers
    Models,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (API key redacted)
    Show,
    /// Print the config file path
    Path,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Check the configuration for problems
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so streamed replies on stdout stay readable.
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command.unwrap_or(Commands::Chat { upload: None }) {
        Commands::Chat { upload } => commands::chat::run(cli.model, upload).await?,
        Commands::Ask { message } => commands::ask::run(cli.model, &message).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show()?,
            ConfigAction::Path => commands::config_cmd::path()?,
            ConfigAction::Init { force } => commands::config_cmd::init(force)?,
            ConfigAction::Validate => commands::config_cmd::validate()?,
        },
        Commands::Models => commands::models::run()?,
    }

    Ok(())
}
